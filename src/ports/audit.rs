use crate::domain::AuditEntry;

/// Sink for the audit trail of balance mutations
///
/// Delivery is best-effort: callers log failures and carry on.
#[mockall::automock]
#[async_trait::async_trait]
pub trait AuditPort {
    async fn record(&self, entry: AuditEntry) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Concrete adapter errors
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
