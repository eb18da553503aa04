//! Discovery entry point
//!
//! `discover` runs the legacy protocol on the caller's critical path and
//! returns its aggregated result. On success it shadows the run with the
//! enclave protocol over the same identifiers, compares the two results, and
//! reports the outcome — all off the critical path, on a serialized lane so
//! the comparison never races a second discovery attempt.

use cds_core::{classify, partition, DiscoveryResult, Error, FeedbackOutcome, RecipientIdentifier};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::attestation::Attestor;
use crate::config::DiscoveryConfig;
use crate::enclave::EnclaveDiscoveryBatch;
use crate::feedback::{report_outcome, FeedbackSink};
use crate::legacy::LegacyDiscoveryBatch;
use crate::scheduler::{BatchTask, CancelFlag, Lane, Scheduler};
use crate::transport::Transport;

/// One discovery attempt's answer plus a handle to its shadow comparison
#[derive(Debug)]
pub struct Discovery {
    /// Identifiers the legacy protocol found registered
    pub registered: DiscoveryResult,
    /// The in-flight enclave comparison; await it to observe the reported
    /// outcome (tests do; production callers may drop it)
    pub comparison: Comparison,
}

/// Handle to the spawned enclave-shadow-and-feedback stage
#[derive(Debug)]
pub struct Comparison {
    join: JoinHandle<FeedbackOutcome>,
}

impl Comparison {
    /// Wait for the comparison to finish and return the reported outcome
    pub async fn outcome(self) -> FeedbackOutcome {
        self.join.await.unwrap_or(FeedbackOutcome::UnexpectedError)
    }
}

/// Contact discovery against a directory service.
///
/// Collaborators are injected; the scheduler and its lanes are owned here,
/// not shared process-wide.
pub struct ContactDiscovery {
    transport: Arc<dyn Transport>,
    attestor: Arc<dyn Attestor>,
    feedback: Arc<dyn FeedbackSink>,
    config: DiscoveryConfig,
    scheduler: Scheduler,
    /// Serialized lane for the enclave shadow run and feedback reporting
    comparison_lane: Lane,
}

impl ContactDiscovery {
    pub fn new(
        transport: Arc<dyn Transport>,
        attestor: Arc<dyn Attestor>,
        feedback: Arc<dyn FeedbackSink>,
        config: DiscoveryConfig,
    ) -> Self {
        let scheduler = Scheduler::new(config.max_attempts);
        Self {
            transport,
            attestor,
            feedback,
            config,
            scheduler,
            comparison_lane: Lane::serialized(),
        }
    }

    /// Run one discovery attempt.
    ///
    /// Returns the legacy protocol's aggregated result, or the first
    /// classified failure observed across its batches. The enclave shadow
    /// run is scheduled only on success.
    pub async fn discover(&self, ids: Vec<RecipientIdentifier>) -> Result<Discovery, Error> {
        tracing::debug!(identifiers = ids.len(), "starting contact discovery");

        let batches = partition(&ids, self.config.batch_size);
        let legacy_tasks: Vec<Arc<dyn BatchTask>> = batches
            .iter()
            .map(|batch| {
                Arc::new(LegacyDiscoveryBatch::new(
                    batch.clone(),
                    self.transport.clone(),
                )) as Arc<dyn BatchTask>
            })
            .collect();

        let legacy_lane = Lane::new(self.config.legacy_concurrency);
        let (legacy_result, _handles) = self
            .scheduler
            .run_protocol(&legacy_lane, legacy_tasks, CancelFlag::new())
            .await;

        let registered = legacy_result?;
        tracing::info!(
            identifiers = ids.len(),
            registered = registered.len(),
            "legacy contact discovery complete"
        );

        let comparison = self.spawn_comparison(batches, registered.clone());

        Ok(Discovery {
            registered,
            comparison,
        })
    }

    /// Shadow the legacy run with the enclave protocol, classify, report
    fn spawn_comparison(
        &self,
        batches: Vec<Vec<RecipientIdentifier>>,
        legacy: DiscoveryResult,
    ) -> Comparison {
        let tasks: Vec<Arc<dyn BatchTask>> = batches
            .into_iter()
            .map(|batch| {
                Arc::new(EnclaveDiscoveryBatch::new(
                    batch,
                    self.transport.clone(),
                    self.attestor.clone(),
                )) as Arc<dyn BatchTask>
            })
            .collect();

        let scheduler = self.scheduler.clone();
        let lane = self.comparison_lane.clone();
        let feedback = self.feedback.clone();

        let join = tokio::spawn(async move {
            let (enclave_result, _handles) = scheduler
                .run_protocol(&lane, tasks, CancelFlag::new())
                .await;

            // Feedback depends on the enclave coordinator's terminal state;
            // the sequential await on the serialized lane expresses that.
            let outcome = classify(&legacy, &enclave_result);
            report_outcome(feedback.as_ref(), outcome).await;
            outcome
        });

        Comparison { join }
    }
}
