//! Attestation session state
//!
//! Produced by the external remote-attestation collaborator; read-only here.
//! The handshake itself (quote verification, key agreement) is out of scope;
//! this crate only consumes the negotiated material.

use crate::constants::KEY_SIZE;

/// A trusted session with a discovery enclave, valid for one discovery
/// attempt.
///
/// `client_key` encrypts the outbound address block; `server_key` decrypts
/// the inbound result block. They are distinct keys derived during the
/// attestation handshake.
#[derive(Clone)]
pub struct AttestationSession {
    /// Opaque request identifier, echoed as AAD on the outbound block
    pub request_id: Vec<u8>,
    /// Identity of the attested enclave, used to route the request
    pub enclave_id: String,
    /// Key for client -> enclave encryption
    pub client_key: [u8; KEY_SIZE],
    /// Key for enclave -> client encryption
    pub server_key: [u8; KEY_SIZE],
    /// Basic-auth credentials established during attestation
    pub auth_username: String,
    pub auth_password: String,
    /// Session cookies the transport must replay
    pub cookies: Vec<String>,
}

impl std::fmt::Debug for AttestationSession {
    // Keys never appear in logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationSession")
            .field("request_id", &hex::encode(&self.request_id))
            .field("enclave_id", &self.enclave_id)
            .field("auth_username", &self.auth_username)
            .field("cookies", &self.cookies.len())
            .finish_non_exhaustive()
    }
}
