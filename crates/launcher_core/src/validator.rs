//! Pre-flight check of the client id against the backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{domain::ClientId, protocol::ClientInfoResponse};
use thiserror::Error;
use tracing::debug;
use url::Url;

const CLIENT_INFO_PATH: &str = "oauth2/client_info";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid validation base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("client validation request failed: {0}")]
    Transport(String),
    #[error("client validation endpoint returned HTTP {0}")]
    Status(u16),
    #[error("client validation response was malformed: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ClientValidator: Send + Sync {
    async fn client_info(&self, client_id: &ClientId)
        -> Result<ClientInfoResponse, ValidationError>;
}

pub struct HttpClientValidator {
    http: Client,
    endpoint: String,
}

impl HttpClientValidator {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ValidationError> {
        let base = Url::parse(base_url).map_err(|err| ValidationError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "expected an http(s) url".to_string(),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ValidationError::Transport(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/{CLIENT_INFO_PATH}", base.as_str().trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ClientValidator for HttpClientValidator {
    async fn client_info(
        &self,
        client_id: &ClientId,
    ) -> Result<ClientInfoResponse, ValidationError> {
        debug!(client_id = %client_id, endpoint = %self.endpoint, "launcher: validating client");
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("client_id", client_id.as_str())])
            .send()
            .await
            .map_err(|err| ValidationError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValidationError::Status(status.as_u16()));
        }

        response
            .json::<ClientInfoResponse>()
            .await
            .map_err(|err| ValidationError::InvalidResponse(err.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/validator_tests.rs"]
mod tests;
