//! Inbound response shaping.
//!
//! The service answers with loosely coupled parallel arrays:
//!
//! ```json
//! {
//!   "image": "<base64 JPEG>",
//!   "diseases": ["leukoplakia", "lichen planus"],
//!   "weight_sum": [0.42, 0.77],
//!   "results": [{"label": "Leukoplakia", "confidence": 0.5}, ...],
//!   "form_score": [0.1, 0.3]
//! }
//! ```
//!
//! Any field may be missing, `null` or empty. [`DiagnosisResult::from_response`]
//! folds the arrays into one row per disease, so index alignment holds by
//! construction. A non-empty array whose length disagrees with the disease count
//! is rejected rather than silently truncated. With no rows at all, leftover
//! score arrays are ignored.

use crate::{ScreeningError, ScreeningResult};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// A single detection as reported in `results`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
    pub label: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Raw response document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiagnosisResponse {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub diseases: Option<Vec<String>>,
    #[serde(default)]
    pub weight_sum: Option<Vec<f64>>,
    #[serde(default)]
    pub results: Option<Vec<Detection>>,
    #[serde(default)]
    pub form_score: Option<Vec<f64>>,
}

impl DiagnosisResponse {
    pub fn from_json(body: &[u8]) -> ScreeningResult<Self> {
        serde_json::from_slice(body).map_err(ScreeningError::Deserialization)
    }
}

/// Scores for one disease, aligned across all signals.
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseScore {
    pub label: String,
    /// Label attached to the detection itself, if `results` was reported.
    pub detection_label: Option<String>,
    /// Model confidence, if `results` was reported.
    pub confidence: Option<f64>,
    /// Score derived from the risk-factor answers, if `form_score` was reported.
    pub form_score: Option<f64>,
    /// Server-computed combination of confidence and form score.
    pub weighted_score: Option<f64>,
}

/// Structured outcome of one successful diagnosis call.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisResult {
    submission_id: Uuid,
    received_at: DateTime<Utc>,
    annotated_image: Option<Vec<u8>>,
    scores: Vec<DiseaseScore>,
    diseases_reported: bool,
}

impl DiagnosisResult {
    /// Shapes a response into aligned per-disease rows.
    ///
    /// Row count comes from `diseases`, or from `results` when `diseases` is empty.
    /// Labels prefer `diseases[i]` and fall back to `results[i].label`.
    ///
    /// # Errors
    ///
    /// - `ScreeningError::MisalignedResponse` if there is at least one row and a
    ///   non-empty array has the wrong length
    /// - `ScreeningError::InvalidAnnotatedImage` if `image` is not valid base64
    pub fn from_response(submission_id: Uuid, response: DiagnosisResponse) -> ScreeningResult<Self> {
        let diseases = response.diseases.unwrap_or_default();
        let detections = response.results.unwrap_or_default();
        let weight_sum = response.weight_sum.unwrap_or_default();
        let form_score = response.form_score.unwrap_or_default();

        let count = if diseases.is_empty() {
            detections.len()
        } else {
            diseases.len()
        };

        if count == 0 {
            // No rows to attach scores to; the views render as empty.
            if !weight_sum.is_empty() || !form_score.is_empty() {
                tracing::debug!(
                    "submission {} reported no diseases; ignoring {} weighted and {} form score(s)",
                    submission_id,
                    weight_sum.len(),
                    form_score.len()
                );
            }
        } else {
            check_aligned("results", detections.len(), count)?;
            check_aligned("weight_sum", weight_sum.len(), count)?;
            check_aligned("form_score", form_score.len(), count)?;
        }

        let scores = (0..count)
            .map(|i| DiseaseScore {
                label: diseases
                    .get(i)
                    .or_else(|| detections.get(i).map(|d| &d.label))
                    .cloned()
                    .unwrap_or_default(),
                detection_label: detections.get(i).map(|d| d.label.clone()),
                confidence: detections.get(i).and_then(|d| d.confidence),
                form_score: form_score.get(i).copied(),
                weighted_score: weight_sum.get(i).copied(),
            })
            .collect();

        let annotated_image = response
            .image
            .map(|encoded| encoded.trim().to_owned())
            .filter(|encoded| !encoded.is_empty())
            .map(|encoded| general_purpose::STANDARD.decode(encoded))
            .transpose()
            .map_err(ScreeningError::InvalidAnnotatedImage)?;

        Ok(Self {
            submission_id,
            received_at: Utc::now(),
            annotated_image,
            scores,
            diseases_reported: !diseases.is_empty(),
        })
    }

    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Decoded annotated JPEG, if the service returned one.
    pub fn annotated_image(&self) -> Option<&[u8]> {
        self.annotated_image.as_deref()
    }

    pub fn scores(&self) -> &[DiseaseScore] {
        &self.scores
    }

    /// Whether the response carried a `diseases` list (the chart's categories).
    pub fn diseases_reported(&self) -> bool {
        self.diseases_reported
    }

    pub fn labels(&self) -> Vec<&str> {
        self.scores.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn confidences(&self) -> Vec<Option<f64>> {
        self.scores.iter().map(|s| s.confidence).collect()
    }

    pub fn form_scores(&self) -> Vec<Option<f64>> {
        self.scores.iter().map(|s| s.form_score).collect()
    }

    pub fn weighted_scores(&self) -> Vec<Option<f64>> {
        self.scores.iter().map(|s| s.weighted_score).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

fn check_aligned(field: &'static str, actual: usize, expected: usize) -> ScreeningResult<()> {
    if actual != 0 && actual != expected {
        return Err(ScreeningError::MisalignedResponse {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}
