//! Enclave discovery batch: attested, encrypted lookup

use async_trait::async_trait;
use cds_core::wire::DiscoveryRequest;
use cds_core::{seal, DiscoveryResult, Error, RecipientIdentifier};
use std::sync::Arc;

use crate::attestation::Attestor;
use crate::scheduler::{BatchTask, TaskContext, TaskState};
use crate::transport::Transport;

/// One enclave-protocol batch: attest, seal the batch under the session's
/// client key, submit, open the positional result bitmap.
pub struct EnclaveDiscoveryBatch {
    ids: Vec<RecipientIdentifier>,
    transport: Arc<dyn Transport>,
    attestor: Arc<dyn Attestor>,
}

impl EnclaveDiscoveryBatch {
    pub fn new(
        ids: Vec<RecipientIdentifier>,
        transport: Arc<dyn Transport>,
        attestor: Arc<dyn Attestor>,
    ) -> Self {
        Self {
            ids,
            transport,
            attestor,
        }
    }
}

#[async_trait]
impl BatchTask for EnclaveDiscoveryBatch {
    async fn run(&self, ctx: &TaskContext) -> Result<DiscoveryResult, Error> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tracing::debug!(batch = self.ids.len(), "running enclave discovery batch");

        ctx.enter(TaskState::Attesting);
        let session = self.attestor.attest().await?;

        // Attestation can be slow; re-check before using the session
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tracing::debug!(
            request_id = %hex::encode(&session.request_id),
            enclave_id = %session.enclave_id,
            "attestation session established"
        );

        // Sealing order is the batch's sequence order; the response bitmap
        // is positional against exactly this order.
        let block = seal(&self.ids, &session)?;
        let request = DiscoveryRequest::new(block, &session)?;

        ctx.enter(TaskState::Requesting);
        let response = self.transport.discover_addresses(&request).await?;

        // A sibling may have failed while the request was in flight
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let flags = cds_core::open(
            &response.data,
            &response.iv,
            &response.mac,
            &session,
            self.ids.len(),
        )?;

        let registered: DiscoveryResult = self
            .ids
            .iter()
            .zip(&flags)
            .filter(|(_, registered)| **registered)
            .map(|(id, _)| id.clone())
            .collect();

        tracing::debug!(
            batch = self.ids.len(),
            registered = registered.len(),
            "enclave discovery batch complete"
        );
        Ok(registered)
    }
}
