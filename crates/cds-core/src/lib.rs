//! cds-core: Core types and protocol logic for contact discovery
//!
//! Contact discovery answers one question: which of the phone numbers in a
//! local address book are registered with the service? Two protocols coexist
//! while the service migrates from one to the other:
//! - Legacy: send truncated hash tokens of each number, receive the matching
//!   tokens back.
//! - Enclave: encrypt the numbers under a key negotiated via remote
//!   attestation, receive an encrypted positional bitmap.
//!
//! # Privacy & Threat Model
//!
//! - **Server model**: honest-but-curious directory service
//! - **Legacy protocol**: the server sees truncated digests of every queried
//!   number. Pseudonymous, not private; this is why it is being replaced.
//! - **Enclave protocol**: numbers are only visible inside an attested
//!   enclave; the operator sees AES-256-GCM ciphertext.
//! - **Non-goals**: network anonymity, attestation proof verification,
//!   availability.
//!
//! This crate holds the pure, synchronous half of the system: identifier
//! parsing and batching, the binary address codec, the hash-token mapping,
//! the enclave cipher, wire DTOs, and feedback classification. The async
//! tasks that drive the protocols live in `cds-client`.

mod batch;
mod cipher;
mod codec;
mod error;
mod feedback;
mod recipient;
mod session;
mod token;
pub mod wire;

pub use batch::partition;
pub use cipher::{open, seal, EncryptedAddressBlock};
pub use codec::{decode_addresses, encode_addresses};
pub use error::Error;
pub use feedback::{classify, FeedbackOutcome};
pub use recipient::RecipientIdentifier;
pub use session::AttestationSession;
pub use token::{token_for, HashToken, TokenMap};

pub type Result<T> = std::result::Result<T, Error>;

/// Set of identifiers known to be registered, as determined by one protocol
/// run. Built incrementally by a coordinator, immutable once the run
/// completes.
pub type DiscoveryResult = std::collections::HashSet<RecipientIdentifier>;

/// Constants shared by both protocols
pub mod constants {
    /// Maximum identifiers per batch (both protocols)
    pub const BATCH_SIZE: usize = 2048;

    /// Bytes per serialized identifier (big-endian u64)
    pub const ADDRESS_RECORD_SIZE: usize = 8;

    /// Truncated digest length for legacy hash tokens
    pub const TOKEN_DIGEST_SIZE: usize = 10;

    /// AES-256-GCM nonce length
    pub const IV_SIZE: usize = 12;

    /// AES-256-GCM authentication tag length
    pub const TAG_SIZE: usize = 16;

    /// Symmetric key length (AES-256)
    pub const KEY_SIZE: usize = 32;

    /// Numeric identifiers at or below this value are malformed
    pub const MIN_NUMERIC_VALUE: u64 = 99;
}
