use crate::{
    domain::{AuditEntry, CustomerId},
    ports::audit::{AuditPort, Error},
};
use std::sync::{Arc, Mutex};

/// Audit sink keeping every entry in memory
///
/// Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    /// Entries recorded so far, in order of arrival
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn entries_for(&self, customer_id: CustomerId) -> Vec<AuditEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.customer_id == customer_id)
            .collect()
    }
}

#[async_trait::async_trait]
impl AuditPort for MemoryAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), Error> {
        self.entries
            .lock()
            .map_err(|err| Error::Adapter(err.to_string().into()))?
            .push(entry);

        Ok(())
    }
}
