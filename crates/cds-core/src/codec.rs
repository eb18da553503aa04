//! Binary address codec for the enclave protocol
//!
//! Each identifier crosses the wire as its numeric value in 8 big-endian
//! bytes. Ordering is significant: the enclave's response bitmap is
//! positional, so decode must preserve input byte order exactly.

use crate::constants::ADDRESS_RECORD_SIZE;
use crate::{Error, RecipientIdentifier, Result};

/// Serialize identifiers as consecutive 8-byte big-endian records.
///
/// Output order matches input order. Validity of each identifier is
/// guaranteed by the [`RecipientIdentifier`] constructor, so this stage is
/// infallible.
pub fn encode_addresses(ids: &[RecipientIdentifier]) -> Vec<u8> {
    let mut block = Vec::with_capacity(ids.len() * ADDRESS_RECORD_SIZE);
    for id in ids {
        block.extend_from_slice(&id.numeric().to_be_bytes());
    }
    block
}

/// Parse a block of `count` consecutive 8-byte big-endian records.
///
/// Fails with a length mismatch unless `block.len() == count * 8`.
pub fn decode_addresses(block: &[u8], count: usize) -> Result<Vec<u64>> {
    let expected = count * ADDRESS_RECORD_SIZE;
    if block.len() != expected {
        return Err(Error::LengthMismatch {
            expected,
            actual: block.len(),
        });
    }

    Ok(block
        .chunks_exact(ADDRESS_RECORD_SIZE)
        .map(|chunk| u64::from_be_bytes(chunk.try_into().expect("chunk is 8 bytes")))
        .collect())
}
