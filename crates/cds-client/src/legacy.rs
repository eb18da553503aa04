//! Legacy discovery batch: hash-token lookup

use async_trait::async_trait;
use cds_core::wire::TokenLookupRequest;
use cds_core::{DiscoveryResult, Error, RecipientIdentifier, TokenMap};
use std::sync::Arc;

use crate::scheduler::{BatchTask, TaskContext};
use crate::transport::Transport;

/// One legacy-protocol batch: compute tokens, send them, resolve the
/// returned subset back to identifiers.
pub struct LegacyDiscoveryBatch {
    ids: Vec<RecipientIdentifier>,
    transport: Arc<dyn Transport>,
}

impl LegacyDiscoveryBatch {
    pub fn new(ids: Vec<RecipientIdentifier>, transport: Arc<dyn Transport>) -> Self {
        Self { ids, transport }
    }
}

#[async_trait]
impl BatchTask for LegacyDiscoveryBatch {
    async fn run(&self, ctx: &TaskContext) -> Result<DiscoveryResult, Error> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tracing::debug!(batch = self.ids.len(), "running legacy discovery batch");

        let map = TokenMap::build(&self.ids)?;
        let request = TokenLookupRequest {
            contacts: map.tokens(),
        };

        let response = self.transport.lookup_tokens(&request).await?;

        let mut registered = DiscoveryResult::default();
        for record in &response.contacts {
            // The server may only echo tokens we asked about; anything else
            // is a protocol violation that fails the batch rather than
            // corrupting the result set.
            let Some(id) = map.resolve(&record.token) else {
                tracing::error!(
                    token = %record.token,
                    "server returned a token outside the lookup set"
                );
                return Err(Error::ProtocolViolation(format!(
                    "unknown token in response: {}",
                    record.token
                )));
            };
            registered.insert(id.clone());
        }

        tracing::debug!(
            batch = self.ids.len(),
            registered = registered.len(),
            "legacy discovery batch complete"
        );
        Ok(registered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{CancelFlag, Lane, Scheduler};
    use crate::transport::TransportError;
    use cds_core::token_for;
    use cds_core::wire::{
        ContactRecord, DiscoveryRequest, DiscoveryResponse, TokenLookupResponse,
    };

    fn ids(texts: &[&str]) -> Vec<RecipientIdentifier> {
        texts
            .iter()
            .map(|t| RecipientIdentifier::parse(*t).unwrap())
            .collect()
    }

    /// Transport that knows which identifiers are registered and answers by
    /// intersecting their tokens with the request.
    struct MockDirectory {
        registered: Vec<RecipientIdentifier>,
    }

    #[async_trait]
    impl Transport for MockDirectory {
        async fn lookup_tokens(
            &self,
            request: &TokenLookupRequest,
        ) -> Result<TokenLookupResponse, TransportError> {
            let contacts = self
                .registered
                .iter()
                .map(|id| token_for(id).as_str().to_string())
                .filter(|token| request.contacts.contains(token))
                .map(|token| ContactRecord { token })
                .collect();
            Ok(TokenLookupResponse { contacts })
        }

        async fn discover_addresses(
            &self,
            _request: &DiscoveryRequest,
        ) -> Result<DiscoveryResponse, TransportError> {
            unimplemented!("legacy tests never reach the enclave protocol")
        }
    }

    struct BadTokenDirectory;

    #[async_trait]
    impl Transport for BadTokenDirectory {
        async fn lookup_tokens(
            &self,
            _request: &TokenLookupRequest,
        ) -> Result<TokenLookupResponse, TransportError> {
            Ok(TokenLookupResponse {
                contacts: vec![ContactRecord {
                    token: "never/asked+about".into(),
                }],
            })
        }

        async fn discover_addresses(
            &self,
            _request: &DiscoveryRequest,
        ) -> Result<DiscoveryResponse, TransportError> {
            unimplemented!()
        }
    }

    struct RateLimitedDirectory;

    #[async_trait]
    impl Transport for RateLimitedDirectory {
        async fn lookup_tokens(
            &self,
            _request: &TokenLookupRequest,
        ) -> Result<TokenLookupResponse, TransportError> {
            Err(TransportError::RateLimited)
        }

        async fn discover_addresses(
            &self,
            _request: &DiscoveryRequest,
        ) -> Result<DiscoveryResponse, TransportError> {
            unimplemented!()
        }
    }

    async fn run_single(task: LegacyDiscoveryBatch) -> Result<DiscoveryResult, Error> {
        let scheduler = Scheduler::new(1);
        let lane = Lane::new(1);
        let (result, _) = scheduler
            .run_protocol(&lane, vec![Arc::new(task)], CancelFlag::new())
            .await;
        result
    }

    #[tokio::test]
    async fn test_resolves_registered_subset() {
        let lookup = ids(&["+14155550100", "+14155550101", "+14155550102"]);
        let transport = Arc::new(MockDirectory {
            registered: ids(&["+14155550101", "+19995550000"]),
        });

        let result = run_single(LegacyDiscoveryBatch::new(lookup, transport))
            .await
            .unwrap();

        assert_eq!(result, ids(&["+14155550101"]).into_iter().collect());
    }

    #[tokio::test]
    async fn test_unknown_token_fails_batch() {
        let lookup = ids(&["+14155550100"]);
        let result =
            run_single(LegacyDiscoveryBatch::new(lookup, Arc::new(BadTokenDirectory))).await;

        assert!(matches!(result, Err(Error::ProtocolViolation(_))));
    }

    #[tokio::test]
    async fn test_rate_limit_passthrough() {
        let lookup = ids(&["+14155550100"]);
        let result = run_single(LegacyDiscoveryBatch::new(
            lookup,
            Arc::new(RateLimitedDirectory),
        ))
        .await;

        assert_eq!(result.unwrap_err(), Error::RateLimited);
    }

    #[tokio::test]
    async fn test_duplicate_input_fails_before_network() {
        let lookup = ids(&["+14155550100", "+14155550100"]);
        // Token collision must fail before any request is issued; if the
        // task reached the transport this would surface as RateLimited.
        let result = run_single(LegacyDiscoveryBatch::new(
            lookup,
            Arc::new(RateLimitedDirectory),
        ))
        .await;

        assert!(matches!(result, Err(Error::TokenCollision { .. })));
    }
}
