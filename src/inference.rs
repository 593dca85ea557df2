//! Text inference boundary: an HTTP service accepting chat turns and
//! returning generated text.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::InferenceConfig;
use crate::error::UpstreamError;

const SERVICE: &str = "inference";

/// One conversation turn sent to the service.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub content: String,
    pub role: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: "user".into(),
        }
    }
}

/// The only field the contract guarantees in a response.
#[derive(Debug, Deserialize)]
struct InferenceResponse {
    text: String,
}

/// The text inference capability both the classifier and the drafter use.
#[async_trait]
pub trait Inference: Send + Sync {
    /// Send turns, return the generated text verbatim.
    async fn generate(&self, turns: Vec<Turn>) -> Result<String, UpstreamError>;
}

/// HTTP implementation of the inference contract.
pub struct HttpInference {
    http: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl HttpInference {
    pub fn new(http: reqwest::Client, config: &InferenceConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl Inference for HttpInference {
    async fn generate(&self, turns: Vec<Turn>) -> Result<String, UpstreamError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", self.api_key.expose_secret())
            .json(&turns)
            .send()
            .await
            .map_err(|source| UpstreamError::Http {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let body: InferenceResponse =
            response
                .json()
                .await
                .map_err(|source| UpstreamError::Http {
                    service: SERVICE,
                    source,
                })?;
        Ok(body.text)
    }
}
