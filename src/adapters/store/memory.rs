use crate::{
    domain::{CustomerId, NewPointsRecord, PointsRecord},
    ports::store::{Error, PointsStorePort},
};
use chrono::Utc;
use std::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet, HashMap},
    sync::{Arc, Mutex, PoisonError},
};
use uuid::Uuid;

/// In-memory points store
///
/// Clones share the same underlying records.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    records: Arc<Mutex<Records>>,
}

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<Uuid, PointsRecord>,
    /// Customer uniqueness index
    by_customer: BTreeMap<CustomerId, Uuid>,
}

impl Records {
    fn customer(&self, customer_id: CustomerId) -> Option<&PointsRecord> {
        self.by_customer
            .get(&customer_id)
            .and_then(|id| self.by_id.get(id))
    }
}

#[async_trait::async_trait]
impl PointsStorePort for MemoryStore {
    async fn load_by_id(&self, id: Uuid) -> Result<PointsRecord, Error> {
        self.records
            .lock()?
            .by_id
            .get(&id)
            .cloned()
            .ok_or(Error::RecordNotFound(id))
    }

    async fn load_by_customer_id(&self, customer_id: CustomerId) -> Result<PointsRecord, Error> {
        self.records
            .lock()?
            .customer(customer_id)
            .cloned()
            .ok_or(Error::CustomerNotFound(customer_id))
    }

    async fn load_by_customer_ids(
        &self,
        customer_ids: Vec<CustomerId>,
    ) -> Result<Vec<PointsRecord>, Error> {
        let records = self.records.lock()?;
        let customer_ids: BTreeSet<_> = customer_ids.into_iter().collect();

        Ok(customer_ids
            .into_iter()
            .filter_map(|customer_id| records.customer(customer_id).cloned())
            .collect())
    }

    async fn customer_has_points(&self, customer_id: CustomerId) -> Result<bool, Error> {
        Ok(self.records.lock()?.by_customer.contains_key(&customer_id))
    }

    async fn total_points_balance(&self) -> Result<u64, Error> {
        Ok(self
            .records
            .lock()?
            .by_id
            .values()
            .fold(0u64, |total, record| total.saturating_add(record.balance)))
    }

    async fn create(&self, record: NewPointsRecord) -> Result<PointsRecord, Error> {
        let mut records = self.records.lock()?;
        let id = match records.by_customer.entry(record.customer_id) {
            // Lost a creation race, or the caller did not check first
            Entry::Occupied(_) => return Err(Error::DuplicateCustomer(record.customer_id)),
            Entry::Vacant(entry) => *entry.insert(Uuid::new_v4()),
        };

        let stored = PointsRecord {
            id,
            customer_id: record.customer_id,
            balance: record.balance,
            total_earned: record.total_earned,
            total_spent: record.total_spent,
            version: 1,
            updated_at: Utc::now(),
        };
        records.by_id.insert(id, stored.clone());

        Ok(stored)
    }

    async fn update(&self, record: PointsRecord) -> Result<PointsRecord, Error> {
        let mut records = self.records.lock()?;
        let stored = records
            .by_id
            .get_mut(&record.id)
            .ok_or(Error::RecordNotFound(record.id))?;

        if stored.version != record.version {
            return Err(Error::VersionMismatch {
                id: stored.id,
                customer_id: stored.customer_id,
                expected: record.version,
                actual: stored.version,
            });
        }

        stored.balance = record.balance;
        stored.total_earned = record.total_earned;
        stored.total_spent = record.total_spent;
        stored.version += 1;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), Error> {
        let mut records = self.records.lock()?;
        let removed = records.by_id.remove(&id).ok_or(Error::RecordNotFound(id))?;
        records.by_customer.remove(&removed.customer_id);

        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(Records::default())),
        }
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
