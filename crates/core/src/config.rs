//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the
//! screening flow and the transport. Binaries read environment variables (after
//! loading `.env`) and command-line flags; nothing below reads the environment
//! itself, which keeps request handling and tests deterministic.

use crate::constants::{
    DEFAULT_JPEG_QUALITY, DEFAULT_MODEL_NAME, DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT_SECS,
    DIAGNOSE_PATH,
};
use crate::{ScreeningError, ScreeningResult};
use reqwest::Url;
use std::time::Duration;

/// Environment variable holding the diagnosis service base URL.
pub const ENV_SERVICE_URL: &str = "ORALSCAN_SERVICE_URL";
/// Environment variable holding the model selector.
pub const ENV_MODEL_NAME: &str = "ORALSCAN_MODEL_NAME";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "ORALSCAN_TIMEOUT_SECS";
/// Environment variable holding the snapshot JPEG quality.
pub const ENV_JPEG_QUALITY: &str = "ORALSCAN_JPEG_QUALITY";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    service_url: Url,
    model_name: String,
    request_timeout: Duration,
    jpeg_quality: u8,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ScreeningError::InvalidInput` if:
    /// - the service URL is not `http` or `https`
    /// - the model name is blank
    /// - the timeout is zero
    /// - the JPEG quality is outside `1..=100`
    pub fn new(
        service_url: Url,
        model_name: impl Into<String>,
        request_timeout: Duration,
        jpeg_quality: u8,
    ) -> ScreeningResult<Self> {
        if !matches!(service_url.scheme(), "http" | "https") {
            return Err(ScreeningError::InvalidInput(format!(
                "service URL must use http or https, got {}",
                service_url.scheme()
            )));
        }

        let model_name = model_name.into().trim().to_owned();
        if model_name.is_empty() {
            return Err(ScreeningError::InvalidInput(
                "model_name cannot be empty".into(),
            ));
        }

        if request_timeout.is_zero() {
            return Err(ScreeningError::InvalidInput(
                "request timeout must be greater than zero".into(),
            ));
        }

        if !(1..=100).contains(&jpeg_quality) {
            return Err(ScreeningError::InvalidInput(format!(
                "JPEG quality must be between 1 and 100, got {}",
                jpeg_quality
            )));
        }

        Ok(Self {
            service_url,
            model_name,
            request_timeout,
            jpeg_quality,
        })
    }

    pub fn service_url(&self) -> &Url {
        &self.service_url
    }

    /// Full URL of the diagnosis endpoint.
    ///
    /// The base URL is treated as a directory, so `http://host/api` and
    /// `http://host/api/` both resolve to `http://host/api/diagnose`.
    pub fn diagnose_url(&self) -> ScreeningResult<Url> {
        let mut base = self.service_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(DIAGNOSE_PATH)
            .map_err(|e| ScreeningError::InvalidInput(format!("invalid diagnose URL: {}", e)))
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }
}

fn default_service_url() -> ScreeningResult<Url> {
    Url::parse(DEFAULT_SERVICE_URL)
        .map_err(|e| ScreeningError::InvalidInput(format!("invalid default service URL: {}", e)))
}

/// Treats `None` and empty/whitespace values as unset.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the service URL from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default service URL.
pub fn service_url_from_env_value(value: Option<String>) -> ScreeningResult<Url> {
    match non_blank(value) {
        Some(v) => Url::parse(&v)
            .map_err(|e| ScreeningError::InvalidInput(format!("invalid service URL '{}': {}", v, e))),
        None => default_service_url(),
    }
}

/// Parse the model selector from an optional string value.
pub fn model_name_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_MODEL_NAME.to_owned())
}

/// Parse the request timeout (whole seconds) from an optional string value.
pub fn timeout_from_env_value(value: Option<String>) -> ScreeningResult<Duration> {
    let secs = match non_blank(value) {
        Some(v) => v
            .parse::<u64>()
            .map_err(|_| ScreeningError::InvalidInput(format!("invalid timeout '{}'", v)))?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    Ok(Duration::from_secs(secs))
}

/// Parse the snapshot JPEG quality from an optional string value.
pub fn jpeg_quality_from_env_value(value: Option<String>) -> ScreeningResult<u8> {
    match non_blank(value) {
        Some(v) => v
            .parse::<u8>()
            .map_err(|_| ScreeningError::InvalidInput(format!("invalid JPEG quality '{}'", v))),
        None => Ok(DEFAULT_JPEG_QUALITY),
    }
}

/// Build a `CoreConfig` from raw environment values.
///
/// Each argument is the raw value of the matching `ORALSCAN_*` variable, if set.
pub fn config_from_env_values(
    service_url: Option<String>,
    model_name: Option<String>,
    timeout_secs: Option<String>,
    jpeg_quality: Option<String>,
) -> ScreeningResult<CoreConfig> {
    CoreConfig::new(
        service_url_from_env_value(service_url)?,
        model_name_from_env_value(model_name),
        timeout_from_env_value(timeout_secs)?,
        jpeg_quality_from_env_value(jpeg_quality)?,
    )
}
