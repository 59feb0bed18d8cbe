use crate::capture::CaptureArtifact;
use crate::constants::{FIELD_FEATURE_SCORE, FIELD_FILE, FIELD_MODEL_NAME, UPLOAD_FILENAME};
use crate::risk_form::RiskAnswers;
use crate::ScreeningResult;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use uuid::Uuid;

/// One outbound diagnosis submission.
///
/// Carries the image, the model selector, and the complete answer set. The
/// `feature_score` JSON is rendered once at construction, so the payload reflects
/// the answers exactly as they were when the submission began.
#[derive(Debug, Clone)]
pub struct DiagnosisRequest {
    submission_id: Uuid,
    artifact: Arc<CaptureArtifact>,
    model_name: String,
    answers: RiskAnswers,
    feature_score: String,
}

impl DiagnosisRequest {
    pub fn new(
        submission_id: Uuid,
        artifact: Arc<CaptureArtifact>,
        model_name: impl Into<String>,
        answers: RiskAnswers,
    ) -> ScreeningResult<Self> {
        let feature_score = answers.to_feature_score_json()?;
        Ok(Self {
            submission_id,
            artifact,
            model_name: model_name.into(),
            answers,
            feature_score,
        })
    }

    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    pub fn artifact(&self) -> &CaptureArtifact {
        &self.artifact
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn answers(&self) -> &RiskAnswers {
        &self.answers
    }

    /// JSON text sent as the `feature_score` field.
    pub fn feature_score(&self) -> &str {
        &self.feature_score
    }

    /// Builds the multipart body: `file`, `model_name`, `feature_score`.
    pub fn to_multipart(&self) -> ScreeningResult<Form> {
        let file = Part::bytes(self.artifact.bytes().as_slice().to_vec())
            .file_name(UPLOAD_FILENAME)
            .mime_str(self.artifact.media_type())?;

        Ok(Form::new()
            .part(FIELD_FILE, file)
            .text(FIELD_MODEL_NAME, self.model_name.clone())
            .text(FIELD_FEATURE_SCORE, self.feature_score.clone()))
    }
}
