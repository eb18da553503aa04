//! Privacy-preserving contact discovery
//!
//! Re-exports the workspace surface: `cds-core` holds identifier types,
//! wire codecs, and the enclave cipher; `cds-client` holds the batch tasks,
//! the dependency scheduler, and the discovery entry point.

pub use cds_client::{
    Attestor, ContactDiscovery, Discovery, DiscoveryConfig, FeedbackSink, HttpFeedbackSink,
    HttpTransport, Transport,
};
pub use cds_core::{DiscoveryResult, Error, FeedbackOutcome, RecipientIdentifier};
