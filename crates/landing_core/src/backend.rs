//! Backend collaborator: the registration and registrant-count endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    error::ErrorBody,
    protocol::{RegisterRequest, RegisterResponse, UserCountResponse, REGISTER_PATH, USER_COUNT_PATH},
};
use thiserror::Error;
use tracing::debug;

/// A response was received; only its status decides which arm applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Accepted(RegisterResponse),
    Rejected { status: u16, body: ErrorBody },
}

/// No usable HTTP response: the request never completed or its body was not JSON.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CounterFetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("count endpoint returned status {0}")]
    Status(u16),
    #[error("malformed count body: {0}")]
    Body(String),
}

#[async_trait]
pub trait RegistrationBackend: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterOutcome, TransportError>;
    async fn registrant_count(&self) -> Result<u64, CounterFetchError>;
}

pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn json_body(bytes: &[u8]) -> Result<Value, TransportError> {
    serde_json::from_slice(bytes)
        .map_err(|err| TransportError(format!("response body is not JSON: {err}")))
}

#[async_trait]
impl RegistrationBackend for HttpBackend {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterOutcome, TransportError> {
        let url = self.endpoint(REGISTER_PATH);
        let res = self.http.post(&url).json(request).send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        debug!(%url, status = status.as_u16(), "backend: register responded");

        let body = json_body(&bytes)?;
        if status.is_success() {
            Ok(RegisterOutcome::Accepted(RegisterResponse::from_json(&body)))
        } else {
            Ok(RegisterOutcome::Rejected {
                status: status.as_u16(),
                body: ErrorBody::from_json(&body),
            })
        }
    }

    async fn registrant_count(&self) -> Result<u64, CounterFetchError> {
        let url = self.endpoint(USER_COUNT_PATH);
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(TransportError::from)?;
        let status = res.status();
        if !status.is_success() {
            return Err(CounterFetchError::Status(status.as_u16()));
        }
        let bytes = res.bytes().await.map_err(TransportError::from)?;
        let body: UserCountResponse = serde_json::from_slice(&bytes)
            .map_err(|err| CounterFetchError::Body(err.to_string()))?;
        Ok(body.count)
    }
}
