use crate::{
    domain::AuditEntry,
    ports::audit::{AuditPort, Error},
};

/// Audit sink writing each entry as a structured `tracing` event
///
/// Events are emitted on the `loyalty_ledger::audit` target so that they can be routed
/// separately from the operational logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

#[async_trait::async_trait]
impl AuditPort for TracingAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), Error> {
        tracing::info!(
            target: "loyalty_ledger::audit",
            customer_id = entry.customer_id,
            delta = entry.delta,
            reason = %entry.reason,
            resulting_balance = entry.resulting_balance,
            timestamp = %entry.timestamp,
            "points balance changed"
        );

        Ok(())
    }
}
