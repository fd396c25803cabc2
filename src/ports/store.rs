use uuid::Uuid;

use crate::domain::{CustomerId, NewPointsRecord, PointsRecord};

/// Durable storage for points records
///
/// The store holds no business logic: it never checks balances, it only enforces record
/// identity, customer uniqueness, and optimistic versioning.
#[mockall::automock]
#[async_trait::async_trait]
pub trait PointsStorePort {
    async fn load_by_id(&self, id: Uuid) -> Result<PointsRecord, Error>;
    async fn load_by_customer_id(&self, customer_id: CustomerId) -> Result<PointsRecord, Error>;
    /// Load the records of several customers, ordered by customer
    ///
    /// Customers without a record are skipped.
    async fn load_by_customer_ids(
        &self,
        customer_ids: Vec<CustomerId>,
    ) -> Result<Vec<PointsRecord>, Error>;
    async fn customer_has_points(&self, customer_id: CustomerId) -> Result<bool, Error>;
    /// Sum of the balances of every record
    async fn total_points_balance(&self) -> Result<u64, Error>;

    /// Persist a new record, assigning its id, version and timestamp
    async fn create(&self, record: NewPointsRecord) -> Result<PointsRecord, Error>;
    /// Persist the counters of an existing record
    ///
    /// `record.version` must match the stored version, otherwise the update is rejected with
    /// [`Error::VersionMismatch`].
    async fn update(&self, record: PointsRecord) -> Result<PointsRecord, Error>;
    async fn delete(&self, id: Uuid) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("points record {0} does not exist")]
    RecordNotFound(Uuid),

    #[error("no points record for customer {0}")]
    CustomerNotFound(CustomerId),

    /// Another record already exists for this customer
    ///
    /// This usually means a concurrent creation won the race.
    #[error("customer {0} already has a points record")]
    DuplicateCustomer(CustomerId),

    /// The record changed since it was read
    #[error("points record {id} of customer {customer_id} changed: expected version {expected}, found {actual}")]
    VersionMismatch {
        id: Uuid,
        customer_id: CustomerId,
        expected: u64,
        actual: u64,
    },

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::RecordNotFound(_) | Error::CustomerNotFound(_))
    }

    /// Whether retrying with fresh data could succeed
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::DuplicateCustomer(_) | Error::VersionMismatch { .. }
        )
    }
}
