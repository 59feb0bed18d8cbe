//! # OralScan Core
//!
//! Client-side logic for oral-lesion screening.
//!
//! This crate holds the screening session and everything it drives:
//! - Image capture from a live feed or a selected file
//! - The fixed risk-factor form and its `feature_score` payload
//! - The multipart diagnosis call and shaping of its response
//! - Chart and table views of the latest result
//!
//! **No UI concerns**: rendering a console, parsing flags and reading the
//! environment belong in the `oralscan-cli` crate and the `oralscan-run` binary.

pub mod capture;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod diagnosis;
pub mod error;
pub mod risk_form;
pub mod session;
pub mod visualization;

pub use capture::{
    ArtifactSource, CaptureArtifact, CaptureController, CaptureMode, Frame, FrameFileProvider,
    LiveFeed, LiveFeedProvider, NoCameraProvider, PreviewState,
};
pub use catalog::RiskFactor;
pub use config::CoreConfig;
pub use diagnosis::{
    DiagnosisRequest, DiagnosisResponse, DiagnosisResult, DiagnosisTransport, DiseaseScore,
    FailureKind, HttpTransport, SubmissionFailure,
};
pub use error::{ScreeningError, ScreeningResult};
pub use risk_form::{RiskAnswers, RiskForm};
pub use session::{PendingSubmission, ScreeningFlow, SessionPhase, SessionState};
pub use visualization::{ChartPoint, ChartView, ResultView, ScoreRow, TableView};

pub use oralscan_types::{Answer, ImageBytes, Percentage};
