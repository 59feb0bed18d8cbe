use crate::capture::CaptureMode;

#[derive(Debug, thiserror::Error)]
pub enum ScreeningError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown risk factor: {0}")]
    UnknownRiskFactor(String),
    #[error(transparent)]
    Types(#[from] oralscan_types::TypesError),

    #[error("the risk form is disabled until an image has been captured or selected")]
    FormDisabled,
    #[error("a diagnosis request is already in flight")]
    Busy,
    #[error("no image has been captured or selected")]
    NoArtifact,
    #[error("submission {0} is not the one in flight")]
    StaleSubmission(uuid::Uuid),
    #[error("no diagnosis result is available")]
    NoResult,
    #[error("the diagnosis result carries no annotated image")]
    NoAnnotatedImage,

    #[error("operation requires {expected} mode but the current mode is {actual}")]
    WrongMode {
        expected: CaptureMode,
        actual: CaptureMode,
    },
    #[error("no live preview is active")]
    NoPreview,
    #[error("the live feed has not produced a frame yet")]
    NoFrame,
    #[error("live feed permission denied: {0}")]
    LiveFeedDenied(String),
    #[error("live feed unavailable: {0}")]
    LiveFeedUnavailable(String),
    #[error("frame buffer does not match {width}x{height} RGB dimensions")]
    InvalidFrame { width: u32, height: u32 },
    #[error("failed to encode or decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize feature scores: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize diagnosis response: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("diagnosis request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("diagnosis service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("response field `{field}` has {actual} entries but {expected} diseases were reported")]
    MisalignedResponse {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("annotated image is not valid base64: {0}")]
    InvalidAnnotatedImage(base64::DecodeError),
}

pub type ScreeningResult<T> = std::result::Result<T, ScreeningError>;
