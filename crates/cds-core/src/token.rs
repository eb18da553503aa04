//! Hash tokens for the legacy protocol
//!
//! A token is the first 10 bytes of the SHA-1 digest of the identifier's
//! canonical text, rendered as unpadded standard base64. The server never
//! sees the identifier itself, only the token; the client keeps a
//! token -> identifier mapping to interpret the response.

use crate::constants::TOKEN_DIGEST_SIZE;
use crate::{Error, RecipientIdentifier, Result};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fmt;

/// Base64 text form of a truncated identifier digest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashToken(String);

impl HashToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the hash token for one identifier
pub fn token_for(id: &RecipientIdentifier) -> HashToken {
    let digest = Sha1::digest(id.as_str().as_bytes());
    HashToken(STANDARD_NO_PAD.encode(&digest[..TOKEN_DIGEST_SIZE]))
}

/// Token -> identifier mapping for one batch.
///
/// Within a batch the mapping must be injective: two distinct well-formed
/// phone numbers never share a truncated digest in practice, so a collision
/// means the input itself was corrupted (duplicates, or identifiers the
/// protocol cannot distinguish) and the batch is failed rather than silently
/// resolving the token to one of the two.
#[derive(Debug)]
pub struct TokenMap {
    by_token: HashMap<HashToken, RecipientIdentifier>,
}

impl TokenMap {
    /// Build the mapping for a batch, failing on any collision
    pub fn build(ids: &[RecipientIdentifier]) -> Result<Self> {
        let mut by_token: HashMap<HashToken, RecipientIdentifier> =
            HashMap::with_capacity(ids.len());

        for id in ids {
            let token = token_for(id);
            if let Some(existing) = by_token.get(&token) {
                return Err(Error::TokenCollision {
                    token: token.as_str().to_string(),
                    existing: existing.to_string(),
                    duplicate: id.to_string(),
                });
            }
            by_token.insert(token, id.clone());
        }

        Ok(Self { by_token })
    }

    /// Tokens to send in the lookup request, deduplicated by construction
    pub fn tokens(&self) -> Vec<String> {
        self.by_token.keys().map(|t| t.as_str().to_string()).collect()
    }

    /// Resolve a token from the response back to an identifier.
    ///
    /// `None` means the server named a contact the client never asked about;
    /// callers must treat that as a protocol violation, not skip it quietly.
    pub fn resolve(&self, token: &str) -> Option<&RecipientIdentifier> {
        self.by_token.get(&HashToken(token.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> RecipientIdentifier {
        RecipientIdentifier::parse(text).unwrap()
    }

    #[test]
    fn test_token_shape() {
        let token = token_for(&id("+14155550198"));
        // 10 bytes -> 14 unpadded base64 chars
        assert_eq!(token.as_str().len(), 14);
        assert!(!token.as_str().contains('='));
    }

    #[test]
    fn test_token_deterministic() {
        assert_eq!(token_for(&id("+14155550198")), token_for(&id("+14155550198")));
        assert_ne!(token_for(&id("+14155550198")), token_for(&id("+14155550199")));
    }

    #[test]
    fn test_injectivity_over_distinct_inputs() {
        let ids: Vec<_> = (0..500)
            .map(|i| id(&format!("+1415555{i:04}")))
            .collect();

        let map = TokenMap::build(&ids).unwrap();
        assert_eq!(map.len(), ids.len());
    }

    #[test]
    fn test_duplicate_input_is_fatal() {
        let ids = vec![id("+14155550198"), id("+14155550198")];
        let err = TokenMap::build(&ids).unwrap_err();
        assert!(matches!(err, Error::TokenCollision { .. }));
    }

    #[test]
    fn test_resolve() {
        let a = id("+14155550198");
        let map = TokenMap::build(std::slice::from_ref(&a)).unwrap();

        let token = token_for(&a);
        assert_eq!(map.resolve(token.as_str()), Some(&a));
        assert_eq!(map.resolve("AAAAAAAAAAAAAA"), None);
    }
}
