//! Transport collaborator: one request in, one response out
//!
//! The trait is the seam the batch tasks talk through; tests substitute
//! in-process mocks. [`HttpTransport`] is the production adapter over
//! reqwest. Per-request retry/backoff is deliberately not implemented here;
//! the scheduler owns retries and only for errors marked retryable.

use async_trait::async_trait;
use cds_core::wire::{DiscoveryRequest, DiscoveryResponse, TokenLookupRequest, TokenLookupResponse};
use cds_core::Error;
use thiserror::Error;

/// Transport-level failure classification.
///
/// `NotProcessable` covers a missing or unusable response body and is the
/// only retryable case besides `Other`. HTTP 413 is surfaced distinctly so
/// callers can back off instead of retrying.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no usable response from server")]
    NotProcessable,

    #[error("rate limited (http 413)")]
    RateLimited,

    #[error("transport failure: {0}")]
    Other(String),
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NotProcessable => Error::NotProcessable,
            TransportError::RateLimited => Error::RateLimited,
            TransportError::Other(cause) => Error::Transport(cause),
        }
    }
}

/// Sends discovery requests to the directory service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Legacy protocol: look up a batch of hash tokens
    async fn lookup_tokens(
        &self,
        request: &TokenLookupRequest,
    ) -> Result<TokenLookupResponse, TransportError>;

    /// Enclave protocol: submit an encrypted address block
    async fn discover_addresses(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<DiscoveryResponse, TransportError>;
}

/// Production transport over HTTP
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn classify(err: reqwest::Error) -> TransportError {
        if err.status() == Some(reqwest::StatusCode::PAYLOAD_TOO_LARGE) {
            return TransportError::RateLimited;
        }
        TransportError::Other(err.to_string())
    }

    fn classify_status(status: reqwest::StatusCode) -> Option<TransportError> {
        if status == reqwest::StatusCode::PAYLOAD_TOO_LARGE {
            return Some(TransportError::RateLimited);
        }
        if !status.is_success() {
            return Some(TransportError::Other(format!("http status {status}")));
        }
        None
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn lookup_tokens(
        &self,
        request: &TokenLookupRequest,
    ) -> Result<TokenLookupResponse, TransportError> {
        let url = format!("{}/v1/directory/tokens", self.base_url);

        let resp = self
            .http
            .put(&url)
            .json(request)
            .send()
            .await
            .map_err(Self::classify)?;

        if let Some(err) = Self::classify_status(resp.status()) {
            return Err(err);
        }

        resp.json().await.map_err(|_| TransportError::NotProcessable)
    }

    async fn discover_addresses(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<DiscoveryResponse, TransportError> {
        let url = format!("{}/v1/discovery/{}", self.base_url, request.enclave_id);

        let mut builder = self
            .http
            .put(&url)
            .basic_auth(&request.auth_username, Some(&request.auth_password))
            .json(request);
        if !request.cookies.is_empty() {
            builder = builder.header(reqwest::header::COOKIE, request.cookies.join("; "));
        }

        let resp = builder.send().await.map_err(Self::classify)?;

        if let Some(err) = Self::classify_status(resp.status()) {
            return Err(err);
        }

        resp.json().await.map_err(|_| TransportError::NotProcessable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert_eq!(Error::from(TransportError::NotProcessable), Error::NotProcessable);
        assert_eq!(Error::from(TransportError::RateLimited), Error::RateLimited);
        assert_eq!(
            Error::from(TransportError::Other("reset".into())),
            Error::Transport("reset".into())
        );
    }

    #[test]
    fn test_retryability_through_mapping() {
        assert!(Error::from(TransportError::NotProcessable).is_retryable());
        assert!(Error::from(TransportError::Other("timeout".into())).is_retryable());
        assert!(!Error::from(TransportError::RateLimited).is_retryable());
    }

    #[test]
    fn test_base_url_normalization() {
        let transport = HttpTransport::new("https://cds.example.org/");
        assert_eq!(transport.base_url, "https://cds.example.org");
    }
}
