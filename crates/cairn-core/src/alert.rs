#[cfg(test)]
use mockall::automock;

/// Fire-and-forget reporting channel for reconciliation findings.
///
/// Dropping a transaction during reconciliation is a safety behavior, not
/// silent data loss: every exclusion goes through here so it can be
/// investigated out of band.
#[cfg_attr(test, automock)]
pub trait AlertSink: Send + Sync {
    fn report(&self, event: &str, context: serde_json::Value);
}

/// Default sink: structured warning logs.
#[derive(Debug, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn report(&self, event: &str, context: serde_json::Value) {
        tracing::warn!(event = event, context = %context, "reconciliation alert");
    }
}
