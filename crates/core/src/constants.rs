//! Constants used throughout the oral screening core crate.
//!
//! Wire-level names and defaults live here so the request builder, the transport
//! and the configuration layer agree on them.

/// Default base URL of the diagnosis service.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Path of the diagnosis endpoint, relative to the service base URL.
pub const DIAGNOSE_PATH: &str = "diagnose";

/// Default detection model selector sent as `model_name`.
pub const DEFAULT_MODEL_NAME: &str = "yolov8";

/// Placeholder filename attached to the `file` part of every submission.
pub const UPLOAD_FILENAME: &str = "snap.jpg";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default JPEG quality for live-feed snapshots.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Multipart field names understood by the diagnosis service.
pub const FIELD_FILE: &str = "file";
pub const FIELD_MODEL_NAME: &str = "model_name";
pub const FIELD_FEATURE_SCORE: &str = "feature_score";

/// Media type of live-feed snapshots.
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// Media type used when a selected file cannot be sniffed.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Label of the submit affordance before any result exists.
pub const SUBMIT_LABEL: &str = "Submit Form & Analyze";

/// Label of the submit affordance once a result is on screen.
pub const RESUBMIT_LABEL: &str = "Resubmit";
