//! AES-256-GCM sealing and opening for the enclave protocol
//!
//! Outbound: the serialized address block is encrypted under the session's
//! client key with the session's request id as associated data and a fresh
//! random nonce. Inbound: the result block is decrypted under the server
//! key with empty associated data and must be exactly one byte per queried
//! identifier (zero = unregistered).
//!
//! Serialization order is the batch's original sequence order. The response
//! bitmap is positional, so this order is a correctness requirement: index
//! *i* of the opened plaintext refers to the *i*-th identifier passed to
//! [`seal`].

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

use crate::constants::{ADDRESS_RECORD_SIZE, IV_SIZE, TAG_SIZE};
use crate::{codec, AttestationSession, Error, RecipientIdentifier, Result};

/// Encrypted outbound address block.
///
/// `ciphertext.len() == address_count * 8`; the 16-byte GCM tag travels
/// separately in `tag`, matching the wire format.
#[derive(Debug, Clone)]
pub struct EncryptedAddressBlock {
    pub address_count: usize,
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_SIZE],
    pub tag: [u8; TAG_SIZE],
}

/// Seal a batch of identifiers for the enclave.
///
/// Identifiers are serialized in the order given. A primitive failure is
/// fatal for the batch: no partial block is returned.
pub fn seal(ids: &[RecipientIdentifier], session: &AttestationSession) -> Result<EncryptedAddressBlock> {
    let plaintext = codec::encode_addresses(ids);

    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let cipher = Aes256Gcm::new(&session.client_key.into());
    let sealed = cipher
        .encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: &plaintext,
                aad: &session.request_id,
            },
        )
        .map_err(|_| Error::EncryptionFailed)?;

    // aes-gcm appends the tag to the ciphertext
    let split = sealed.len() - TAG_SIZE;
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&sealed[split..]);

    Ok(EncryptedAddressBlock {
        address_count: ids.len(),
        ciphertext: sealed[..split].to_vec(),
        iv,
        tag,
    })
}

/// Open the enclave's result block.
///
/// Decrypts under the session's server key (empty AAD) and validates that
/// the plaintext holds exactly `expected_count` booleans, positionally
/// aligned with the identifier order used in [`seal`].
pub fn open(
    data: &[u8],
    iv: &[u8],
    mac: &[u8],
    session: &AttestationSession,
    expected_count: usize,
) -> Result<Vec<bool>> {
    if iv.len() != IV_SIZE {
        return Err(Error::LengthMismatch {
            expected: IV_SIZE,
            actual: iv.len(),
        });
    }
    if mac.len() != TAG_SIZE {
        return Err(Error::LengthMismatch {
            expected: TAG_SIZE,
            actual: mac.len(),
        });
    }

    let mut sealed = Vec::with_capacity(data.len() + TAG_SIZE);
    sealed.extend_from_slice(data);
    sealed.extend_from_slice(mac);

    let cipher = Aes256Gcm::new(&session.server_key.into());
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(iv),
            Payload {
                msg: &sealed,
                aad: &[],
            },
        )
        .map_err(|_| Error::DecryptionFailed)?;

    if plaintext.len() != expected_count {
        return Err(Error::LengthMismatch {
            expected: expected_count,
            actual: plaintext.len(),
        });
    }

    Ok(plaintext.iter().map(|b| *b != 0).collect())
}

/// Invariant check used by request builders: the block must describe
/// exactly `address_count` 8-byte records.
pub fn check_block(block: &EncryptedAddressBlock) -> Result<()> {
    let expected = block.address_count * ADDRESS_RECORD_SIZE;
    if block.ciphertext.len() != expected {
        return Err(Error::LengthMismatch {
            expected,
            actual: block.ciphertext.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> AttestationSession {
        AttestationSession {
            request_id: b"request-0001".to_vec(),
            enclave_id: "test-enclave".into(),
            client_key: [0x41; 32],
            server_key: [0x42; 32],
            auth_username: "user".into(),
            auth_password: "pass".into(),
            cookies: vec![],
        }
    }

    fn ids(count: u64) -> Vec<RecipientIdentifier> {
        (0..count)
            .map(|i| RecipientIdentifier::parse(format!("+1415555{i:04}")).unwrap())
            .collect()
    }

    /// Decrypt a sealed block the way the enclave would, then re-encrypt a
    /// result bitmap under the server key.
    fn mock_enclave_respond(
        block: &EncryptedAddressBlock,
        session: &AttestationSession,
        registered: &[u64],
    ) -> (Vec<u8>, [u8; IV_SIZE], Vec<u8>) {
        let cipher = Aes256Gcm::new(&session.client_key.into());
        let mut sealed = block.ciphertext.clone();
        sealed.extend_from_slice(&block.tag);
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&block.iv),
                Payload {
                    msg: &sealed,
                    aad: &session.request_id,
                },
            )
            .unwrap();

        let numbers = codec::decode_addresses(&plaintext, block.address_count).unwrap();
        let bitmap: Vec<u8> = numbers
            .iter()
            .map(|n| u8::from(registered.contains(n)))
            .collect();

        let iv = [0x99; IV_SIZE];
        let server_cipher = Aes256Gcm::new(&session.server_key.into());
        let mut sealed = server_cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: &bitmap,
                    aad: &[],
                },
            )
            .unwrap();
        let mac = sealed.split_off(sealed.len() - TAG_SIZE);
        (sealed, iv, mac)
    }

    #[test]
    fn test_seal_shape() {
        let session = test_session();
        let batch = ids(3);

        let block = seal(&batch, &session).unwrap();
        assert_eq!(block.address_count, 3);
        assert_eq!(block.ciphertext.len(), 24);
        check_block(&block).unwrap();
    }

    #[test]
    fn test_seal_open_roundtrip_positional() {
        let session = test_session();
        let batch = ids(5);
        // Mark the 2nd and 5th identifiers registered
        let registered = [batch[1].numeric(), batch[4].numeric()];

        let block = seal(&batch, &session).unwrap();
        let (data, iv, mac) = mock_enclave_respond(&block, &session, &registered);

        let flags = open(&data, &iv, &mac, &session, batch.len()).unwrap();
        assert_eq!(flags, vec![false, true, false, false, true]);
    }

    #[test]
    fn test_open_wrong_key_fails() {
        let session = test_session();
        let batch = ids(2);
        let block = seal(&batch, &session).unwrap();
        let (data, iv, mac) = mock_enclave_respond(&block, &session, &[]);

        let mut other = test_session();
        other.server_key = [0x43; 32];
        assert_eq!(
            open(&data, &iv, &mac, &other, batch.len()).unwrap_err(),
            Error::DecryptionFailed
        );
    }

    #[test]
    fn test_open_corrupted_tag_fails() {
        let session = test_session();
        let batch = ids(2);
        let block = seal(&batch, &session).unwrap();
        let (data, iv, mut mac) = mock_enclave_respond(&block, &session, &[]);

        mac[0] ^= 0xff;
        assert_eq!(
            open(&data, &iv, &mac, &session, batch.len()).unwrap_err(),
            Error::DecryptionFailed
        );
    }

    #[test]
    fn test_open_count_mismatch_fails() {
        let session = test_session();
        let batch = ids(2);
        let block = seal(&batch, &session).unwrap();
        let (data, iv, mac) = mock_enclave_respond(&block, &session, &[]);

        let err = open(&data, &iv, &mac, &session, 3).unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_open_rejects_bad_iv_length() {
        let session = test_session();
        let err = open(&[], &[0u8; 8], &[0u8; TAG_SIZE], &session, 0).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 12, .. }));
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let session = test_session();
        let batch = ids(1);
        let a = seal(&batch, &session).unwrap();
        let b = seal(&batch, &session).unwrap();
        assert_ne!(a.iv, b.iv);
    }
}
