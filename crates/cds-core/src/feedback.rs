//! Comparison of the two protocols' results
//!
//! While the enclave protocol is being rolled out, every legacy run is
//! shadowed by an enclave run over the same identifiers and the outcome of
//! the comparison is reported as telemetry. The categories are fixed by the
//! feedback endpoint contract.

use crate::{DiscoveryResult, Error};
use std::fmt;

/// Outcome of comparing a legacy run against its shadow enclave run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// Both protocols returned the same registered set
    Ok,
    /// Both succeeded but the sets differ
    Mismatch,
    /// Enclave side failed in transport (including rate limiting)
    ServerError,
    /// Enclave side failed on the client: crypto or protocol violation
    ClientError,
    /// Attestation session could not be established
    AttestationError,
    /// Anything the other categories do not cover
    UnexpectedError,
}

impl FeedbackOutcome {
    /// Wire label, as used by the feedback endpoint path
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackOutcome::Ok => "ok",
            FeedbackOutcome::Mismatch => "mismatch",
            FeedbackOutcome::ServerError => "server-error",
            FeedbackOutcome::ClientError => "client-error",
            FeedbackOutcome::AttestationError => "attestation-error",
            FeedbackOutcome::UnexpectedError => "unexpected-error",
        }
    }
}

impl fmt::Display for FeedbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify one comparison.
///
/// When the enclave run failed, the category is chosen by the failure's
/// origin rather than by set comparison: attestation failures get their own
/// bucket, transport failures count against the server, and crypto or
/// protocol violations count against the client.
pub fn classify(legacy: &DiscoveryResult, enclave: &Result<DiscoveryResult, Error>) -> FeedbackOutcome {
    match enclave {
        Ok(result) if result == legacy => FeedbackOutcome::Ok,
        Ok(_) => FeedbackOutcome::Mismatch,
        Err(Error::AttestationFailed(_)) => FeedbackOutcome::AttestationError,
        Err(Error::NotProcessable | Error::RateLimited | Error::Transport(_)) => {
            FeedbackOutcome::ServerError
        }
        Err(
            Error::EncryptionFailed
            | Error::DecryptionFailed
            | Error::LengthMismatch { .. }
            | Error::ProtocolViolation(_)
            | Error::TokenCollision { .. }
            | Error::InvalidIdentifier(_),
        ) => FeedbackOutcome::ClientError,
        Err(Error::Cancelled | Error::Internal(_)) => FeedbackOutcome::UnexpectedError,
    }
}
