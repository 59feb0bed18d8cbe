use super::{DiagnosisRequest, DiagnosisResponse, DiagnosisTransport};
use crate::config::CoreConfig;
use crate::{ScreeningError, ScreeningResult};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

/// Diagnosis transport over HTTP: one multipart `POST {service_url}/diagnose`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpTransport {
    pub fn new(config: &CoreConfig) -> ScreeningResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("oralscan/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.diagnose_url()?,
            timeout: config.request_timeout(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn map_send_error(&self, e: reqwest::Error) -> ScreeningError {
        if e.is_timeout() {
            ScreeningError::Timeout(self.timeout)
        } else {
            ScreeningError::Http(e)
        }
    }
}

#[async_trait]
impl DiagnosisTransport for HttpTransport {
    async fn diagnose(&self, request: &DiagnosisRequest) -> ScreeningResult<DiagnosisResponse> {
        tracing::debug!(
            "POST {} submission={} model={}",
            self.endpoint,
            request.submission_id(),
            request.model_name()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(request.to_multipart()?)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let message = match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(parsed) => parsed.error,
                Err(_) => {
                    let text = String::from_utf8_lossy(&body).trim().to_owned();
                    if text.is_empty() {
                        status.canonical_reason().unwrap_or("unknown error").to_owned()
                    } else {
                        text
                    }
                }
            };
            return Err(ScreeningError::Service {
                status: status.as_u16(),
                message,
            });
        }

        DiagnosisResponse::from_json(&body)
    }
}
