use clap::Parser;
use oralscan_core::config::{
    config_from_env_values, ENV_JPEG_QUALITY, ENV_MODEL_NAME, ENV_SERVICE_URL, ENV_TIMEOUT_SECS,
};
use oralscan_core::{
    Answer, CaptureMode, DiagnosisResponse, DiagnosisTransport, FrameFileProvider, HttpTransport,
    LiveFeedProvider, NoCameraProvider, PreviewState, RiskFactor, ScreeningFlow, ScreeningResult,
};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use uuid::Uuid;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Commands:
  mode live|file        switch capture mode (discards the current image and result)
  snap                  capture the live preview
  select PATH           use an image file
  set FACTOR yes|no     answer one risk question, e.g. `set chew betel nut yes`
  answers               list the risk questions and current answers
  reset                 answer every question `no`
  submit                send the image and answers for diagnosis (runs in the background)
  show                  print the chart and score table
  save PATH             write the annotated image to PATH
  status                show mode, preview, phase and the submit label
  help                  show this list
  quit                  exit";

#[derive(Parser)]
#[command(name = "oralscan-run")]
#[command(about = "Interactive oral lesion screening console")]
struct Args {
    /// Image file that an external grabber keeps overwriting; used as the live feed
    #[arg(long, value_name = "PATH")]
    frame_source: Option<PathBuf>,
    /// Diagnosis service base URL
    #[arg(long)]
    service_url: Option<String>,
    /// Model selector sent with each request
    #[arg(long)]
    model: Option<String>,
}

type DiagnosisFuture = Pin<Box<dyn Future<Output = ScreeningResult<DiagnosisResponse>> + Send>>;

/// A diagnosis request that has been sent and not yet answered.
struct InFlight {
    submission_id: Uuid,
    response: DiagnosisFuture,
}

/// What the read loop does after a command.
enum Control {
    Continue,
    Submitted(InFlight),
    Quit,
}

enum Event {
    Line(Option<String>),
    Answered(ScreeningResult<DiagnosisResponse>),
}

struct Console {
    flow: ScreeningFlow,
    transport: Arc<dyn DiagnosisTransport>,
}

/// Main entry point for the interactive screening console
///
/// Reads one command per line from stdin until `quit` or end of input.
///
/// # Environment Variables
/// - `ORALSCAN_SERVICE_URL`: diagnosis service base URL (default: "http://localhost:8000")
/// - `ORALSCAN_MODEL_NAME`: model selector (default: "yolov8")
/// - `ORALSCAN_TIMEOUT_SECS`: request timeout in seconds (default: 120)
/// - `ORALSCAN_JPEG_QUALITY`: snapshot JPEG quality (default: 90)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("oralscan=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = Arc::new(config_from_env_values(
        args.service_url.or_else(|| std::env::var(ENV_SERVICE_URL).ok()),
        args.model.or_else(|| std::env::var(ENV_MODEL_NAME).ok()),
        std::env::var(ENV_TIMEOUT_SECS).ok(),
        std::env::var(ENV_JPEG_QUALITY).ok(),
    )?);
    tracing::info!(
        "++ Starting oralscan console against {} (model {})",
        config.service_url(),
        config.model_name()
    );

    let provider: Arc<dyn LiveFeedProvider> = match args.frame_source {
        Some(path) => Arc::new(FrameFileProvider::new(path)),
        None => Arc::new(NoCameraProvider),
    };

    let mut console = Console {
        transport: Arc::new(HttpTransport::new(&config)?),
        flow: ScreeningFlow::new(config, provider),
    };

    console.start_live_feed().await?;
    println!("{}", HELP);

    console.run(BufReader::new(tokio::io::stdin()).lines()).await
}

impl Console {
    /// Handles commands until `quit` or end of input.
    ///
    /// While a submission is in flight, commands keep being read and go through
    /// the session's guards. End of input waits for the response before exiting.
    async fn run<R>(&mut self, mut lines: Lines<R>) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut in_flight: Option<InFlight> = None;

        loop {
            let event = match in_flight.as_mut() {
                Some(pending) => tokio::select! {
                    outcome = pending.response.as_mut() => Event::Answered(outcome),
                    line = lines.next_line() => Event::Line(line?),
                },
                None => Event::Line(lines.next_line().await?),
            };

            match event {
                Event::Answered(outcome) => {
                    if let Some(pending) = in_flight.take() {
                        self.report(pending.submission_id, outcome);
                    }
                }
                Event::Line(None) => {
                    if let Some(pending) = in_flight.take() {
                        let outcome = pending.response.await;
                        self.report(pending.submission_id, outcome);
                    }
                    break;
                }
                Event::Line(Some(line)) => match self.handle(line.trim()).await {
                    Ok(Control::Continue) => {}
                    Ok(Control::Submitted(pending)) => in_flight = Some(pending),
                    Ok(Control::Quit) => break,
                    Err(e) => println!("error: {}", e),
                },
            }
        }

        Ok(())
    }

    async fn handle(&mut self, line: &str) -> anyhow::Result<Control> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "mode" => {
                let mode: CaptureMode = rest.parse()?;
                self.flow.enter_mode(mode)?;
                println!("Capture mode: {}", mode);
                if mode == CaptureMode::LiveFeed {
                    self.start_live_feed().await?;
                }
            }
            "snap" => {
                let description = self.flow.snapshot()?.describe();
                println!("Image ready: {}. Answer the risk questions, then submit.", description);
            }
            "select" => {
                if rest.is_empty() {
                    anyhow::bail!("usage: select PATH");
                }
                let description = self.flow.select_path(&PathBuf::from(rest))?.describe();
                println!("Image ready: {}. Answer the risk questions, then submit.", description);
            }
            "set" => {
                let (factor, answer) = rest
                    .rsplit_once(char::is_whitespace)
                    .ok_or_else(|| anyhow::anyhow!("usage: set FACTOR yes|no"))?;
                let factor: RiskFactor = factor.trim().parse()?;
                let answer: Answer = answer.parse()?;
                self.flow.set_answer(factor, answer)?;
                println!("{} = {}", factor.display_label(), answer);
            }
            "answers" => self.print_answers(),
            "reset" => {
                self.flow.reset_answers()?;
                println!("All answers reset to No.");
            }
            "submit" => return Ok(Control::Submitted(self.submit()?)),
            "show" => print!("{}", self.flow.view()),
            "save" => {
                if rest.is_empty() {
                    anyhow::bail!("usage: save PATH");
                }
                let written = self.flow.save_annotated(&PathBuf::from(rest))?;
                println!("Saved annotated image ({} bytes) to {}", written, rest);
            }
            "status" => self.print_status(),
            "help" => println!("{}", HELP),
            "quit" | "exit" => return Ok(Control::Quit),
            other => println!("unknown command '{}' (try `help`)", other),
        }

        Ok(Control::Continue)
    }

    async fn start_live_feed(&mut self) -> anyhow::Result<()> {
        match self.flow.acquire_live_feed().await? {
            PreviewState::Active => println!("Live preview active. Use `snap` to capture."),
            PreviewState::Denied { reason } => {
                println!("Live preview unavailable ({}). Use `mode file` to select an image.", reason)
            }
            PreviewState::Inactive => {}
        }
        Ok(())
    }

    fn submit(&mut self) -> anyhow::Result<InFlight> {
        let pending = self.flow.begin_submission()?;
        println!("Processing... (`status` shows progress)");

        let transport = Arc::clone(&self.transport);
        let request = pending.request;
        Ok(InFlight {
            submission_id: pending.submission_id,
            response: Box::pin(async move { transport.diagnose(&request).await }),
        })
    }

    fn report(&mut self, submission_id: Uuid, outcome: ScreeningResult<DiagnosisResponse>) {
        match self.flow.complete_submission(submission_id, outcome) {
            Ok(_) => print!("{}", self.flow.view()),
            Err(e) => println!("error: {}", e),
        }
    }

    fn print_answers(&self) {
        let form = self.flow.form();
        for factor in RiskFactor::ALL {
            println!(
                "  [{}] {:<32} ({})",
                if form.answer(factor).is_yes() { "x" } else { " " },
                factor.display_label(),
                factor.id()
            );
        }
        if !self.flow.form_enabled() {
            println!("  (capture or select an image to edit answers)");
        }
    }

    fn print_status(&self) {
        println!("Mode:     {}", self.flow.mode());
        let preview = match self.flow.preview() {
            PreviewState::Inactive => "inactive".to_owned(),
            PreviewState::Active => "active".to_owned(),
            PreviewState::Denied { reason } => format!("denied ({})", reason),
        };
        println!("Preview:  {}", preview);
        println!("Phase:    {}", self.flow.phase());
        match self.flow.artifact() {
            Some(artifact) => println!(
                "Image:    {}, captured {}",
                artifact.describe(),
                artifact.captured_at().format("%H:%M:%S")
            ),
            None => println!("Image:    none"),
        }
        if let Some(result) = self.flow.result() {
            println!(
                "Result:   {} disease(s), received {}",
                result.scores().len(),
                result.received_at().format("%H:%M:%S")
            );
        }
        if let Some(failure) = self.flow.failure() {
            println!("Last run: {}", failure);
        }
        println!("Submit:   [{}]", self.flow.submit_label());
    }
}
