//! cds-client: async contact discovery against the directory service
//!
//! Drives both discovery protocols over abstract collaborators:
//! - [`Transport`]: sends one request, returns one response. Retry/backoff
//!   of individual requests lives behind this seam, not here.
//! - [`Attestor`]: supplies an attested enclave session.
//! - [`FeedbackSink`]: receives the comparison outcome, fire-and-forget.
//!
//! [`ContactDiscovery`] is the entry point: it partitions the input,
//! runs the legacy protocol's batches under the dependency scheduler, and on
//! success shadows the run with the enclave protocol plus feedback reporting
//! on a serialized lane.

pub mod attestation;
pub mod config;
pub mod discovery;
pub mod enclave;
pub mod feedback;
pub mod legacy;
pub mod scheduler;
pub mod transport;

pub use attestation::{AttestationError, Attestor};
pub use config::DiscoveryConfig;
pub use discovery::{Comparison, ContactDiscovery, Discovery};
pub use enclave::EnclaveDiscoveryBatch;
pub use feedback::{FeedbackSink, HttpFeedbackSink};
pub use legacy::LegacyDiscoveryBatch;
pub use scheduler::{BatchTask, CancelFlag, Lane, Scheduler, TaskContext, TaskHandle, TaskState};
pub use transport::{HttpTransport, Transport, TransportError};
