//! Feedback reporting: fire-and-forget comparison telemetry

use async_trait::async_trait;
use cds_core::FeedbackOutcome;

use crate::transport::TransportError;

/// Receives one comparison outcome per discovery attempt.
///
/// Reporting is best-effort: a sink failure is logged and never escalated or
/// retried.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn report(&self, outcome: FeedbackOutcome) -> Result<(), TransportError>;
}

/// HTTP sink: `PUT /v1/directory/feedback/<outcome>`
pub struct HttpFeedbackSink {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFeedbackSink {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FeedbackSink for HttpFeedbackSink {
    async fn report(&self, outcome: FeedbackOutcome) -> Result<(), TransportError> {
        let url = format!("{}/v1/directory/feedback/{}", self.base_url, outcome);

        let resp = self
            .http
            .put(&url)
            .send()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TransportError::Other(format!(
                "feedback endpoint returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// Report an outcome, swallowing sink failures
pub(crate) async fn report_outcome(sink: &dyn FeedbackSink, outcome: FeedbackOutcome) {
    tracing::info!(outcome = %outcome, "reporting discovery comparison outcome");
    if let Err(err) = sink.report(outcome).await {
        tracing::warn!(outcome = %outcome, error = %err, "failed to submit discovery feedback");
    }
}
