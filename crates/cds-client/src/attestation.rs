//! Attestation collaborator
//!
//! The remote-attestation handshake (quote verification, key agreement) is
//! external; this crate only consumes the resulting [`AttestationSession`].
//! A failed attestation fails the enclave batch and is classified separately
//! in feedback. No local retry.

use async_trait::async_trait;
use cds_core::{AttestationSession, Error};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttestationError {
    #[error("attestation handshake failed: {0}")]
    Handshake(String),

    #[error("attestation transport failed: {0}")]
    Transport(String),
}

impl From<AttestationError> for Error {
    fn from(err: AttestationError) -> Self {
        Error::AttestationFailed(err.to_string())
    }
}

/// Supplies one attested enclave session per discovery attempt
#[async_trait]
pub trait Attestor: Send + Sync {
    async fn attest(&self) -> Result<AttestationSession, AttestationError>;
}
