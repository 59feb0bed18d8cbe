use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use oralscan_core::config::{
    config_from_env_values, ENV_JPEG_QUALITY, ENV_MODEL_NAME, ENV_SERVICE_URL, ENV_TIMEOUT_SECS,
};
use oralscan_core::{
    Answer, CaptureMode, CoreConfig, FrameFileProvider, HttpTransport, LiveFeedProvider,
    NoCameraProvider, PreviewState, RiskFactor, RiskForm, ScreeningFlow,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "oralscan")]
#[command(about = "Oral lesion screening client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the risk factors and their labels
    Factors,
    /// Capture or select one image, submit it with the risk answers and print the result
    Diagnose {
        /// Image file to submit as a selected file
        #[arg(long, conflicts_with = "frame", required_unless_present = "frame")]
        file: Option<PathBuf>,
        /// Frame file to treat as a live feed and snapshot
        #[arg(long)]
        frame: Option<PathBuf>,
        /// Risk factor answered yes (repeatable), e.g. --yes smoking
        #[arg(long = "yes", value_name = "FACTOR")]
        yes: Vec<String>,
        /// YAML file mapping risk factor to answer, applied before --yes
        #[arg(long, value_name = "YAML")]
        answers: Option<PathBuf>,
        /// Diagnosis service base URL
        #[arg(long)]
        service_url: Option<String>,
        /// Model selector sent with the request
        #[arg(long)]
        model: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<String>,
        /// Write the annotated image returned by the service to this path
        #[arg(long, value_name = "PATH")]
        save_annotated: Option<PathBuf>,
        /// Print the result as JSON instead of a chart and table
        #[arg(long)]
        json: bool,
    },
}

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

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Factors) => {
            for factor in RiskFactor::ALL {
                println!("{}", factor_line(factor));
            }
        }
        Some(Commands::Diagnose {
            file,
            frame,
            yes,
            answers,
            service_url,
            model,
            timeout_secs,
            save_annotated,
            json,
        }) => {
            let config = Arc::new(resolve_config(service_url, model, timeout_secs)?);

            let provider: Arc<dyn LiveFeedProvider> = match &frame {
                Some(path) => Arc::new(FrameFileProvider::new(path)),
                None => Arc::new(NoCameraProvider),
            };
            let mut flow = ScreeningFlow::new(config.clone(), provider);

            match (file, frame) {
                (Some(path), _) => {
                    flow.enter_mode(CaptureMode::FileSelect)?;
                    flow.select_path(&path)
                        .with_context(|| format!("failed to select {}", path.display()))?;
                }
                (None, Some(path)) => {
                    if let PreviewState::Denied { reason } = flow.acquire_live_feed().await? {
                        bail!("live feed from {} was denied: {}", path.display(), reason);
                    }
                    flow.snapshot()?;
                }
                (None, None) => bail!("either --file or --frame is required"),
            }

            let mut form = match answers {
                Some(path) => {
                    let document = std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    RiskForm::from_yaml(&document)?
                }
                None => RiskForm::new(),
            };
            for raw in &yes {
                form.set_answer(raw.parse::<RiskFactor>()?, Answer::Yes);
            }
            flow.replace_answers(form)?;

            let transport = HttpTransport::new(&config)?;
            eprintln!("Processing...");
            flow.submit(&transport).await?;

            if let Some(path) = save_annotated {
                let written = flow.save_annotated(&path)?;
                eprintln!("Saved annotated image ({} bytes) to {}", written, path.display());
            }

            let view = flow.view();
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", view);
            }
        }
        None => {
            println!("Use 'oralscan --help' for commands");
        }
    }

    Ok(())
}

/// One catalog line, `key — label`.
fn factor_line(factor: RiskFactor) -> String {
    format!("{} — {}", factor.id(), factor.display_label())
}

/// Flags win over environment variables, which win over defaults.
fn resolve_config(
    service_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<String>,
) -> anyhow::Result<CoreConfig> {
    let config = config_from_env_values(
        service_url.or_else(|| std::env::var(ENV_SERVICE_URL).ok()),
        model.or_else(|| std::env::var(ENV_MODEL_NAME).ok()),
        timeout_secs.or_else(|| std::env::var(ENV_TIMEOUT_SECS).ok()),
        std::env::var(ENV_JPEG_QUALITY).ok(),
    )?;
    tracing::info!(
        "using diagnosis service {} with model {}",
        config.service_url(),
        config.model_name()
    );
    Ok(config)
}
