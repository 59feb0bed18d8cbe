//! Screening session orchestration.
//!
//! [`ScreeningFlow`] ties capture, the risk form and the diagnosis call together.
//! All session state lives in one tagged [`SessionState`], so combinations such as
//! "submitting without an image" cannot be represented.
//!
//! A submission runs in two steps so an event loop can stay responsive while the
//! request is in flight:
//!
//! ```text
//! let pending = flow.begin_submission()?;          // phase: Submitting
//! let outcome = transport.diagnose(&pending.request).await;
//! flow.complete_submission(pending.submission_id, outcome)?; // Resulted or Failed
//! ```
//!
//! [`ScreeningFlow::submit`] does both around a single transport call.

use crate::capture::{CaptureArtifact, CaptureController, CaptureMode, LiveFeedProvider, PreviewState};
use crate::catalog::RiskFactor;
use crate::config::CoreConfig;
use crate::constants::{RESUBMIT_LABEL, SUBMIT_LABEL};
use crate::diagnosis::{
    DiagnosisRequest, DiagnosisResponse, DiagnosisResult, DiagnosisTransport, SubmissionFailure,
};
use crate::risk_form::RiskForm;
use crate::visualization::ResultView;
use crate::{ScreeningError, ScreeningResult};
use oralscan_types::Answer;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Capturing,
    FormReady,
    Submitting,
    Resulted,
    Failed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Capturing => "capturing",
            SessionPhase::FormReady => "form ready",
            SessionPhase::Submitting => "submitting",
            SessionPhase::Resulted => "resulted",
            SessionPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Session state. Every phase past `Capturing` carries the artifact.
///
/// `follows_result` records whether a result was on screen when the submission
/// began; it keeps the submit affordance labelled "Resubmit" across a resubmission.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Capturing,
    FormReady {
        artifact: Arc<CaptureArtifact>,
    },
    Submitting {
        artifact: Arc<CaptureArtifact>,
        submission_id: Uuid,
        follows_result: bool,
    },
    Resulted {
        artifact: Arc<CaptureArtifact>,
        result: Arc<DiagnosisResult>,
    },
    Failed {
        artifact: Arc<CaptureArtifact>,
        failure: SubmissionFailure,
        follows_result: bool,
    },
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Capturing => SessionPhase::Capturing,
            SessionState::FormReady { .. } => SessionPhase::FormReady,
            SessionState::Submitting { .. } => SessionPhase::Submitting,
            SessionState::Resulted { .. } => SessionPhase::Resulted,
            SessionState::Failed { .. } => SessionPhase::Failed,
        }
    }

    pub fn artifact(&self) -> Option<&Arc<CaptureArtifact>> {
        match self {
            SessionState::Capturing => None,
            SessionState::FormReady { artifact }
            | SessionState::Submitting { artifact, .. }
            | SessionState::Resulted { artifact, .. }
            | SessionState::Failed { artifact, .. } => Some(artifact),
        }
    }

    fn shows_resubmit(&self) -> bool {
        match self {
            SessionState::Resulted { .. } => true,
            SessionState::Submitting { follows_result, .. }
            | SessionState::Failed { follows_result, .. } => *follows_result,
            SessionState::Capturing | SessionState::FormReady { .. } => false,
        }
    }
}

/// A submission that has begun but not completed.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub submission_id: Uuid,
    pub request: DiagnosisRequest,
}

/// One screening session: capture, answers, submission and result.
#[derive(Debug)]
pub struct ScreeningFlow {
    config: Arc<CoreConfig>,
    capture: CaptureController,
    form: RiskForm,
    state: SessionState,
}

impl ScreeningFlow {
    /// Starts a session in `LiveFeed` mode with no image and every answer `No`.
    pub fn new(config: Arc<CoreConfig>, provider: Arc<dyn LiveFeedProvider>) -> Self {
        let capture = CaptureController::new(provider, config.jpeg_quality());
        Self {
            config,
            capture,
            form: RiskForm::new(),
            state: SessionState::Capturing,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn mode(&self) -> CaptureMode {
        self.capture.mode()
    }

    pub fn preview(&self) -> &PreviewState {
        self.capture.preview()
    }

    pub fn artifact(&self) -> Option<&CaptureArtifact> {
        self.state.artifact().map(Arc::as_ref)
    }

    pub fn result(&self) -> Option<&Arc<DiagnosisResult>> {
        match &self.state {
            SessionState::Resulted { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&SubmissionFailure> {
        match &self.state {
            SessionState::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    pub fn form(&self) -> &RiskForm {
        &self.form
    }

    /// Whether the risk form currently accepts edits.
    pub fn form_enabled(&self) -> bool {
        !matches!(
            self.state,
            SessionState::Capturing | SessionState::Submitting { .. }
        )
    }

    pub fn submit_label(&self) -> &'static str {
        if self.state.shows_resubmit() {
            RESUBMIT_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    /// Switches capture mode. The live feed is released and any image and result
    /// are discarded, even when `mode` is already active.
    pub fn enter_mode(&mut self, mode: CaptureMode) -> ScreeningResult<()> {
        self.ensure_idle()?;
        self.capture.enter_mode(mode);
        self.state = SessionState::Capturing;
        Ok(())
    }

    /// Requests a live preview. A denial is reported through the returned state.
    pub async fn acquire_live_feed(&mut self) -> ScreeningResult<PreviewState> {
        self.ensure_idle()?;
        Ok(self.capture.acquire_live_feed().await?.clone())
    }

    /// Samples the live preview into the session image.
    pub fn snapshot(&mut self) -> ScreeningResult<&CaptureArtifact> {
        self.ensure_idle()?;
        let artifact = self.capture.snapshot()?;
        self.install(artifact)
    }

    /// Uses the given bytes as the session image.
    pub fn select(
        &mut self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> ScreeningResult<&CaptureArtifact> {
        self.ensure_idle()?;
        let artifact = self.capture.select(file_name, bytes)?;
        self.install(artifact)
    }

    /// Reads a file from disk and uses it as the session image.
    pub fn select_path(&mut self, path: &Path) -> ScreeningResult<&CaptureArtifact> {
        self.ensure_idle()?;
        let artifact = self.capture.select_path(path)?;
        self.install(artifact)
    }

    pub fn set_answer(&mut self, factor: RiskFactor, answer: Answer) -> ScreeningResult<()> {
        self.ensure_form_enabled()?;
        self.form.set_answer(factor, answer);
        tracing::debug!("answer set: {} = {}", factor, answer.as_u8());
        Ok(())
    }

    /// Replaces every answer at once. Used for answers loaded from a file.
    pub fn replace_answers(&mut self, form: RiskForm) -> ScreeningResult<()> {
        self.ensure_form_enabled()?;
        self.form = form;
        Ok(())
    }

    pub fn reset_answers(&mut self) -> ScreeningResult<()> {
        self.ensure_form_enabled()?;
        self.form.reset();
        Ok(())
    }

    /// Starts a submission with the current image and answers.
    ///
    /// # Errors
    ///
    /// - `ScreeningError::Busy` if a submission is already in flight
    /// - `ScreeningError::NoArtifact` if no image has been captured or selected
    pub fn begin_submission(&mut self) -> ScreeningResult<PendingSubmission> {
        self.ensure_idle()?;
        let artifact = self
            .state
            .artifact()
            .cloned()
            .ok_or(ScreeningError::NoArtifact)?;

        let submission_id = Uuid::new_v4();
        let request = DiagnosisRequest::new(
            submission_id,
            artifact.clone(),
            self.config.model_name(),
            self.form.snapshot(),
        )?;

        tracing::info!(
            "submission {} started: {}, {} risk factor(s) positive",
            submission_id,
            artifact.describe(),
            request.answers().positive_count()
        );
        tracing::debug!(
            "submission {} feature_score={}",
            submission_id,
            request.feature_score()
        );

        self.state = SessionState::Submitting {
            artifact,
            submission_id,
            follows_result: self.state.shows_resubmit(),
        };

        Ok(PendingSubmission {
            submission_id,
            request,
        })
    }

    /// Applies the transport outcome of the in-flight submission.
    ///
    /// A success replaces any earlier result wholesale. A failure moves to `Failed`
    /// and the error is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns `ScreeningError::StaleSubmission` without touching state if
    /// `submission_id` is not the submission in flight.
    pub fn complete_submission(
        &mut self,
        submission_id: Uuid,
        outcome: ScreeningResult<DiagnosisResponse>,
    ) -> ScreeningResult<Arc<DiagnosisResult>> {
        let (artifact, follows_result) = match &self.state {
            SessionState::Submitting {
                artifact,
                submission_id: in_flight,
                follows_result,
            } if *in_flight == submission_id => (artifact.clone(), *follows_result),
            _ => return Err(ScreeningError::StaleSubmission(submission_id)),
        };

        match outcome.and_then(|response| DiagnosisResult::from_response(submission_id, response)) {
            Ok(result) => {
                let result = Arc::new(result);
                tracing::info!(
                    "submission {} completed: {} disease(s) scored",
                    submission_id,
                    result.scores().len()
                );
                self.state = SessionState::Resulted {
                    artifact,
                    result: result.clone(),
                };
                Ok(result)
            }
            Err(e) => {
                let failure = SubmissionFailure::from_error(&e);
                tracing::warn!("submission {} failed: {}", submission_id, failure);
                self.state = SessionState::Failed {
                    artifact,
                    failure,
                    follows_result,
                };
                Err(e)
            }
        }
    }

    /// Runs one submission against `transport`.
    pub async fn submit<T>(&mut self, transport: &T) -> ScreeningResult<Arc<DiagnosisResult>>
    where
        T: DiagnosisTransport + ?Sized,
    {
        let pending = self.begin_submission()?;
        let outcome = transport.diagnose(&pending.request).await;
        self.complete_submission(pending.submission_id, outcome)
    }

    /// Chart and table for the current result.
    pub fn view(&self) -> ResultView {
        ResultView::from_result(self.result().map(Arc::as_ref))
    }

    /// Writes the annotated image of the current result to `path` and returns the
    /// number of bytes written.
    pub fn save_annotated(&self, path: &Path) -> ScreeningResult<usize> {
        let result = self.result().ok_or(ScreeningError::NoResult)?;
        let image = result
            .annotated_image()
            .ok_or(ScreeningError::NoAnnotatedImage)?;
        fs::write(path, image).map_err(ScreeningError::FileWrite)?;
        tracing::info!("annotated image written to {}", path.display());
        Ok(image.len())
    }

    fn install(&mut self, artifact: CaptureArtifact) -> ScreeningResult<&CaptureArtifact> {
        tracing::info!("image ready: {}", artifact.describe());
        self.state = SessionState::FormReady {
            artifact: Arc::new(artifact),
        };
        self.artifact().ok_or(ScreeningError::NoArtifact)
    }

    fn ensure_idle(&self) -> ScreeningResult<()> {
        if matches!(self.state, SessionState::Submitting { .. }) {
            return Err(ScreeningError::Busy);
        }
        Ok(())
    }

    fn ensure_form_enabled(&self) -> ScreeningResult<()> {
        self.ensure_idle()?;
        if matches!(self.state, SessionState::Capturing) {
            return Err(ScreeningError::FormDisabled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::test_support::ScriptedProvider;
    use crate::config::config_from_env_values;
    use crate::diagnosis::FailureKind;
    use crate::visualization::{ChartView, TableView};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Replays queued outcomes and records every request it receives.
    #[derive(Default)]
    struct StubTransport {
        outcomes: Mutex<VecDeque<ScreeningResult<DiagnosisResponse>>>,
        requests: Mutex<Vec<DiagnosisRequest>>,
    }

    impl StubTransport {
        fn push(&self, outcome: ScreeningResult<DiagnosisResponse>) {
            self.outcomes.lock().unwrap().push_back(outcome);
        }

        fn push_json(&self, json: &str) {
            self.push(DiagnosisResponse::from_json(json.as_bytes()));
        }

        fn requests(&self) -> Vec<DiagnosisRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DiagnosisTransport for StubTransport {
        async fn diagnose(&self, request: &DiagnosisRequest) -> ScreeningResult<DiagnosisResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(DiagnosisResponse::default()))
        }
    }

    const TWO_DISEASES: &str = r#"{
        "image": "/9j/",
        "diseases": ["leukoplakia", "lichen planus"],
        "weight_sum": [0.42, 0.77],
        "results": [
            {"label": "Leukoplakia", "confidence": 0.5},
            {"label": "Lichen Planus", "confidence": 0.9}
        ],
        "form_score": [0.1, 0.3]
    }"#;

    fn flow_with(provider: Arc<ScriptedProvider>) -> ScreeningFlow {
        let config = Arc::new(config_from_env_values(None, None, None, None).unwrap());
        ScreeningFlow::new(config, provider)
    }

    fn flow() -> ScreeningFlow {
        flow_with(Arc::new(ScriptedProvider::default()))
    }

    fn flow_with_file() -> ScreeningFlow {
        let mut flow = flow();
        flow.enter_mode(CaptureMode::FileSelect).unwrap();
        flow.select("mouth.jpg", vec![0xff, 0xd8, 0xff, 0xe0]).unwrap();
        flow
    }

    #[test]
    fn test_new_flow_is_capturing_in_live_feed_mode() {
        let flow = flow();
        assert_eq!(flow.phase(), SessionPhase::Capturing);
        assert_eq!(flow.mode(), CaptureMode::LiveFeed);
        assert_eq!(flow.preview(), &PreviewState::Inactive);
        assert_eq!(flow.submit_label(), "Submit Form & Analyze");
        assert!(!flow.form_enabled());
    }

    #[test]
    fn test_form_is_disabled_until_an_image_exists() {
        let mut flow = flow();
        assert!(matches!(
            flow.set_answer(RiskFactor::Smoking, Answer::Yes),
            Err(ScreeningError::FormDisabled)
        ));
        assert!(matches!(flow.reset_answers(), Err(ScreeningError::FormDisabled)));

        flow.enter_mode(CaptureMode::FileSelect).unwrap();
        flow.select("mouth.jpg", vec![1, 2, 3]).unwrap();
        assert_eq!(flow.phase(), SessionPhase::FormReady);
        flow.set_answer(RiskFactor::Smoking, Answer::Yes).unwrap();
        assert_eq!(flow.form().answer(RiskFactor::Smoking), Answer::Yes);
    }

    #[test]
    fn test_submit_without_artifact_is_rejected() {
        let mut flow = flow();
        assert!(matches!(
            flow.begin_submission(),
            Err(ScreeningError::NoArtifact)
        ));
        assert_eq!(flow.phase(), SessionPhase::Capturing);
    }

    #[tokio::test]
    async fn test_selected_file_submission_sends_all_factors() {
        let mut flow = flow_with_file();
        flow.set_answer(RiskFactor::Smoking, Answer::Yes).unwrap();

        let transport = StubTransport::default();
        transport.push_json(TWO_DISEASES);
        flow.submit(&transport).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model_name(), "yolov8");
        assert_eq!(requests[0].artifact().bytes().as_slice(), &[0xff, 0xd8, 0xff, 0xe0]);

        let feature_score: serde_json::Value =
            serde_json::from_str(requests[0].feature_score()).unwrap();
        let object = feature_score.as_object().unwrap();
        assert_eq!(object.len(), 12);
        for factor in RiskFactor::ALL {
            let expected = if factor == RiskFactor::Smoking { 1 } else { 0 };
            assert_eq!(object[factor.id()], expected, "factor {}", factor);
        }
    }

    #[tokio::test]
    async fn test_successful_submission_yields_matching_views() {
        let mut flow = flow_with_file();
        let transport = StubTransport::default();
        transport.push_json(TWO_DISEASES);

        let result = flow.submit(&transport).await.unwrap();

        assert_eq!(flow.phase(), SessionPhase::Resulted);
        assert_eq!(flow.submit_label(), "Resubmit");

        let view = flow.view();
        assert_eq!(view.submission_id, Some(result.submission_id()));
        match &view.chart {
            ChartView::Bars(points) => {
                let values: Vec<f64> = points.iter().map(|p| p.percentage.value()).collect();
                assert_eq!(values, vec![42.0, 77.0]);
            }
            other => panic!("expected bars, got {:?}", other),
        }
        assert!(matches!(view.table, TableView::Rows(ref rows) if rows.len() == 2));
        assert!(result.received_at() >= flow.artifact().unwrap().captured_at());
    }

    #[tokio::test]
    async fn test_scores_without_diseases_still_complete_as_result() {
        let mut flow = flow_with_file();
        let transport = StubTransport::default();
        transport.push_json(
            r#"{"image": "", "diseases": [], "results": [], "weight_sum": [0.3], "form_score": [0.2]}"#,
        );

        let result = flow.submit(&transport).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(flow.phase(), SessionPhase::Resulted);
        assert!(flow.failure().is_none());
        let view = flow.view();
        assert_eq!(view.chart, ChartView::NoData);
        assert_eq!(view.table, TableView::NoResults);
    }

    #[tokio::test]
    async fn test_resubmission_replaces_result_wholesale() {
        let mut flow = flow_with_file();
        let transport = StubTransport::default();
        transport.push_json(TWO_DISEASES);
        transport.push_json(r#"{"diseases": ["candidiasis"], "weight_sum": [0.1]}"#);

        let first = flow.submit(&transport).await.unwrap();
        let second = flow.submit(&transport).await.unwrap();
        assert_ne!(first.submission_id(), second.submission_id());

        let view = flow.view();
        assert_eq!(view.submission_id, Some(second.submission_id()));
        match &view.chart {
            ChartView::Bars(points) => {
                assert_eq!(points.len(), 1);
                assert_eq!(points[0].category, "candidiasis");
            }
            other => panic!("expected bars, got {:?}", other),
        }
        assert_eq!(view.table, TableView::NoResults);
    }

    #[test]
    fn test_second_begin_while_submitting_is_busy() {
        let mut flow = flow_with_file();
        let pending = flow.begin_submission().unwrap();
        assert_eq!(flow.phase(), SessionPhase::Submitting);

        assert!(matches!(flow.begin_submission(), Err(ScreeningError::Busy)));
        assert!(matches!(
            flow.set_answer(RiskFactor::Smoking, Answer::Yes),
            Err(ScreeningError::Busy)
        ));
        assert!(matches!(
            flow.enter_mode(CaptureMode::LiveFeed),
            Err(ScreeningError::Busy)
        ));
        assert!(matches!(
            flow.select("other.jpg", vec![9]),
            Err(ScreeningError::Busy)
        ));
        assert!(!flow.form_enabled());

        flow.complete_submission(pending.submission_id, Ok(DiagnosisResponse::default()))
            .unwrap();
        assert_eq!(flow.phase(), SessionPhase::Resulted);
    }

    #[test]
    fn test_stale_completion_leaves_state_untouched() {
        let mut flow = flow_with_file();
        let pending = flow.begin_submission().unwrap();

        let stale = Uuid::new_v4();
        let err = flow
            .complete_submission(stale, Ok(DiagnosisResponse::default()))
            .unwrap_err();
        assert!(matches!(err, ScreeningError::StaleSubmission(id) if id == stale));
        assert_eq!(flow.phase(), SessionPhase::Submitting);

        flow.complete_submission(pending.submission_id, Ok(DiagnosisResponse::default()))
            .unwrap();
        assert!(matches!(
            flow.complete_submission(pending.submission_id, Ok(DiagnosisResponse::default())),
            Err(ScreeningError::StaleSubmission(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_clears_prior_result() {
        let mut flow = flow_with_file();
        let transport = StubTransport::default();
        transport.push_json(TWO_DISEASES);
        flow.submit(&transport).await.unwrap();

        transport.push(Err(ScreeningError::Timeout(Duration::from_secs(120))));
        let err = flow.submit(&transport).await.unwrap_err();
        assert!(matches!(err, ScreeningError::Timeout(_)));

        assert_eq!(flow.phase(), SessionPhase::Failed);
        assert!(flow.result().is_none());
        assert_eq!(flow.failure().map(|f| f.kind), Some(FailureKind::Timeout));
        assert_eq!(flow.view(), ResultView::empty());
        assert!(flow.artifact().is_some());
        assert_eq!(flow.submit_label(), "Resubmit");
    }

    #[tokio::test]
    async fn test_failed_submission_can_be_edited_and_resubmitted() {
        let mut flow = flow_with_file();
        let transport = StubTransport::default();
        transport.push(Err(ScreeningError::Service {
            status: 400,
            message: "Model not found".into(),
        }));
        assert!(flow.submit(&transport).await.is_err());
        assert_eq!(
            flow.failure().map(|f| f.kind),
            Some(FailureKind::Service { status: 400 })
        );
        assert_eq!(flow.submit_label(), "Submit Form & Analyze");

        flow.set_answer(RiskFactor::OralInjury, Answer::Yes).unwrap();
        transport.push_json(TWO_DISEASES);
        flow.submit(&transport).await.unwrap();
        assert_eq!(flow.phase(), SessionPhase::Resulted);
        assert!(transport.requests()[1].feature_score().contains(r#""oral injury":1"#));
    }

    #[tokio::test]
    async fn test_misaligned_response_is_a_malformed_failure() {
        let mut flow = flow_with_file();
        let transport = StubTransport::default();
        transport.push_json(r#"{"diseases": ["a", "b"], "weight_sum": [0.5]}"#);

        let err = flow.submit(&transport).await.unwrap_err();
        assert!(matches!(err, ScreeningError::MisalignedResponse { .. }));
        assert_eq!(
            flow.failure().map(|f| f.kind),
            Some(FailureKind::MalformedResponse)
        );
    }

    #[tokio::test]
    async fn test_mode_switch_clears_artifact_and_result() {
        let mut flow = flow_with_file();
        let transport = StubTransport::default();
        transport.push_json(TWO_DISEASES);
        flow.submit(&transport).await.unwrap();

        flow.enter_mode(CaptureMode::FileSelect).unwrap();
        assert_eq!(flow.phase(), SessionPhase::Capturing);
        assert!(flow.artifact().is_none());
        assert!(flow.result().is_none());
        assert_eq!(flow.view(), ResultView::empty());
    }

    #[tokio::test]
    async fn test_new_capture_clears_result() {
        let mut flow = flow_with_file();
        let transport = StubTransport::default();
        transport.push_json(TWO_DISEASES);
        flow.submit(&transport).await.unwrap();

        flow.select("second.jpg", vec![4, 5, 6]).unwrap();
        assert_eq!(flow.phase(), SessionPhase::FormReady);
        assert!(flow.result().is_none());
        assert_eq!(flow.submit_label(), "Submit Form & Analyze");
    }

    #[tokio::test]
    async fn test_denied_live_feed_blocks_snapshot_until_granted() {
        let provider = Arc::new(ScriptedProvider::denying());
        let mut flow = flow_with(provider.clone());

        let preview = flow.acquire_live_feed().await.unwrap();
        assert!(matches!(preview, PreviewState::Denied { .. }));
        assert_eq!(flow.mode(), CaptureMode::LiveFeed);
        assert!(matches!(flow.snapshot(), Err(ScreeningError::NoPreview)));
        assert_eq!(flow.phase(), SessionPhase::Capturing);

        provider.deny.store(false, Ordering::SeqCst);
        assert_eq!(flow.acquire_live_feed().await.unwrap(), PreviewState::Active);
        let artifact = flow.snapshot().unwrap();
        assert_eq!(artifact.media_type(), "image/jpeg");
        assert_eq!(flow.phase(), SessionPhase::FormReady);
    }

    #[tokio::test]
    async fn test_dropping_flow_releases_live_feed() {
        let provider = Arc::new(ScriptedProvider::default());
        {
            let mut flow = flow_with(provider.clone());
            flow.acquire_live_feed().await.unwrap();
        }
        assert_eq!(provider.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_save_annotated_writes_decoded_image() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("annotated.jpg");

        let mut flow = flow_with_file();
        assert!(matches!(
            flow.save_annotated(&path),
            Err(ScreeningError::NoResult)
        ));

        let transport = StubTransport::default();
        transport.push_json(TWO_DISEASES);
        flow.submit(&transport).await.unwrap();

        let written = flow.save_annotated(&path).unwrap();
        assert_eq!(written, 3);
        assert_eq!(fs::read(&path).unwrap(), vec![0xff, 0xd8, 0xff]);
    }

    #[test]
    fn test_replace_answers_installs_loaded_form() {
        let mut flow = flow_with_file();
        let loaded = RiskForm::from_yaml("smoking: yes\nchew betel nut: 1\n").unwrap();
        flow.replace_answers(loaded).unwrap();
        assert_eq!(flow.form().snapshot().positive_count(), 2);
    }
}
