//! Wire DTOs for both discovery protocols
//!
//! Binary fields cross the wire base64-encoded inside JSON. Unknown response
//! fields are ignored everywhere; this client only consumes what the
//! protocols define.

use serde::{Deserialize, Serialize};

use crate::cipher::{check_block, EncryptedAddressBlock};
use crate::constants::BATCH_SIZE;
use crate::{AttestationSession, Error, Result};

/// Legacy request: one deduplicated hash token per identifier in the batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLookupRequest {
    pub contacts: Vec<String>,
}

/// Legacy response record; only `token` is consumed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRecord {
    pub token: String,
}

/// Legacy response: the subset of requested tokens that are registered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLookupResponse {
    pub contacts: Vec<ContactRecord>,
}

/// Enclave discovery request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    /// Opaque attestation request id, also the AAD of `data`
    #[serde(with = "b64")]
    pub request_id: Vec<u8>,
    /// Count of identifiers, 1..=2048
    pub address_count: usize,
    /// AES-256-GCM ciphertext of `address_count` big-endian u64 records
    #[serde(with = "b64")]
    pub data: Vec<u8>,
    /// Client-chosen 12-byte IV
    #[serde(with = "b64")]
    pub iv: Vec<u8>,
    /// 16-byte GCM tag over `data`
    #[serde(with = "b64")]
    pub mac: Vec<u8>,
    /// Target enclave identity
    pub enclave_id: String,
    /// Attestation-derived credentials and cookies for the transport
    pub auth_username: String,
    pub auth_password: String,
    pub cookies: Vec<String>,
}

impl DiscoveryRequest {
    /// Assemble a request from a sealed block and its session.
    ///
    /// Validates the block's count/length invariant and the protocol's
    /// count range before it leaves the client.
    pub fn new(block: EncryptedAddressBlock, session: &AttestationSession) -> Result<Self> {
        check_block(&block)?;
        if !(1..=BATCH_SIZE).contains(&block.address_count) {
            return Err(Error::ProtocolViolation(format!(
                "address count {} outside 1..={BATCH_SIZE}",
                block.address_count
            )));
        }

        Ok(Self {
            request_id: session.request_id.clone(),
            address_count: block.address_count,
            data: block.ciphertext,
            iv: block.iv.to_vec(),
            mac: block.tag.to_vec(),
            enclave_id: session.enclave_id.clone(),
            auth_username: session.auth_username.clone(),
            auth_password: session.auth_password.clone(),
            cookies: session.cookies.clone(),
        })
    }
}

/// Enclave discovery response: encrypted positional bitmap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    /// AES-256-GCM ciphertext of one byte per queried identifier
    #[serde(with = "b64")]
    pub data: Vec<u8>,
    /// Server-chosen 12-byte IV
    #[serde(with = "b64")]
    pub iv: Vec<u8>,
    /// 16-byte GCM tag over `data`
    #[serde(with = "b64")]
    pub mac: Vec<u8>,
}

mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
