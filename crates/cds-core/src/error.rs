//! Error taxonomy for contact discovery
//!
//! Every failure a batch task can surface falls into one of five families:
//! transient transport trouble (retryable), rate limiting (surfaced
//! distinctly so callers can back off), protocol violations (server/client
//! disagreement that cannot be locally repaired), cryptographic failures,
//! and attestation failures. Cancellation is modeled as an error so a task
//! body can abort through `?` at any checkpoint.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The server replied but the response was unusable. Retryable.
    #[error("unable to process server response")]
    NotProcessable,

    /// HTTP 413. Not retryable at this layer; callers should back off.
    #[error("contact discovery rate limited")]
    RateLimited,

    /// Any other transport-level failure, passed through unchanged. Retryable.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server named a token or identifier the client never asked about,
    /// or the response shape disagrees with the request. Fatal for the batch.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Two identifiers in one batch produced the same hash token. The input
    /// was supposed to be distinct and well-formed, so this is corrupted
    /// input, not a recoverable condition.
    #[error("hash token collision: {token:?} maps to both {existing} and {duplicate}")]
    TokenCollision {
        token: String,
        existing: String,
        duplicate: String,
    },

    /// Identifier failed `+<digits>` validation. Such values should never
    /// reach the codec, so downstream this indicates a broken invariant.
    #[error("invalid recipient identifier: {0}")]
    InvalidIdentifier(String),

    /// Sealing the outbound address block failed. Fatal for the batch.
    #[error("address encryption failed")]
    EncryptionFailed,

    /// Opening the inbound result block failed (bad key, corrupted tag).
    #[error("response decryption failed")]
    DecryptionFailed,

    /// Decrypted or raw payload has the wrong length for the claimed count.
    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Remote attestation session could not be established.
    #[error("attestation failed: {0}")]
    AttestationFailed(String),

    /// Task observed its cancellation flag.
    #[error("cancelled")]
    Cancelled,

    /// Scheduler-internal failure (e.g. a task panicked).
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a batch task may retry after this error. Only transient
    /// transport failures qualify; everything else is terminal for the batch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NotProcessable | Error::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::NotProcessable.is_retryable());
        assert!(Error::Transport("connection reset".into()).is_retryable());

        assert!(!Error::RateLimited.is_retryable());
        assert!(!Error::EncryptionFailed.is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(!Error::ProtocolViolation("bad token".into()).is_retryable());
    }
}
