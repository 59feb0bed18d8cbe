//! Diagnosis request and response handling.
//!
//! [`DiagnosisRequest`] is the outbound multipart submission, [`DiagnosisResponse`]
//! the raw document the service returns and [`DiagnosisResult`] its aligned,
//! per-disease shape. The network hop sits behind [`DiagnosisTransport`];
//! [`HttpTransport`] is the production implementation.

mod http;
mod request;
mod response;

pub use http::HttpTransport;
pub use request::DiagnosisRequest;
pub use response::{Detection, DiagnosisResponse, DiagnosisResult, DiseaseScore};

use crate::{ScreeningError, ScreeningResult};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Sends one diagnosis request and returns the parsed response document.
///
/// Implementations must not retry on their own: the caller decides whether a
/// failed submission is resubmitted.
#[async_trait]
pub trait DiagnosisTransport: Send + Sync {
    async fn diagnose(&self, request: &DiagnosisRequest) -> ScreeningResult<DiagnosisResponse>;
}

/// Why a submission did not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The request never reached the service or the connection broke.
    Transport,
    /// No response arrived within the configured timeout.
    Timeout,
    /// The service answered with a non-success status.
    Service { status: u16 },
    /// The service answered 2xx with a body that could not be shaped into a result.
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport => f.write_str("transport failure"),
            FailureKind::Timeout => f.write_str("timed out"),
            FailureKind::Service { status } => write!(f, "service error (HTTP {})", status),
            FailureKind::MalformedResponse => f.write_str("malformed response"),
        }
    }
}

/// A failed submission, kept in the session so it can be shown and resubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SubmissionFailure {
    pub fn from_error(error: &ScreeningError) -> Self {
        let kind = match error {
            ScreeningError::Timeout(_) => FailureKind::Timeout,
            ScreeningError::Service { status, .. } => FailureKind::Service { status: *status },
            ScreeningError::Deserialization(_)
            | ScreeningError::MisalignedResponse { .. }
            | ScreeningError::InvalidAnnotatedImage(_) => FailureKind::MalformedResponse,
            _ => FailureKind::Transport,
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for SubmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
