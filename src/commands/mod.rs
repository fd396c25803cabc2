use std::{borrow::Cow, sync::Arc};

use tracing::{debug, warn};

use crate::{
    config::LedgerConfig,
    domain::{AuditEntry, BalanceError, CustomerId, PointsRecord},
    ports::{
        audit::AuditPort,
        store::{self, PointsStorePort},
    },
};

pub mod add_points;
pub mod delete;
pub mod get_or_create;
pub mod lookup;
pub mod spend_points;

/// Points ledger operations
///
/// The ledger holds no state of its own: every operation reads fresh data from the store, and
/// clones share the same store and audit sink.
pub struct Ledger<S, A> {
    store: Arc<S>,
    audit: Arc<A>,
    config: LedgerConfig,
}

impl<S, A> Ledger<S, A> {
    pub fn new(store: Arc<S>, audit: Arc<A>, config: LedgerConfig) -> Self {
        Self {
            store,
            audit,
            config,
        }
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }
}

impl<S, A> Clone for Ledger<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            audit: self.audit.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, A> Ledger<S, A>
where
    S: PointsStorePort + Send + Sync,
    A: AuditPort + Send + Sync,
{
    /// Read-modify-write cycle on the record of a customer
    ///
    /// `apply` runs against a fresh snapshot on every attempt. The cycle is retried when the
    /// store reports a concurrent write, up to the configured number of attempts.
    async fn mutate<F>(&self, customer_id: CustomerId, apply: F) -> Result<PointsRecord, Error>
    where
        F: Fn(&mut PointsRecord) -> Result<(), BalanceError> + Send,
    {
        let max_attempts = self.max_attempts();
        for attempt in 1..=max_attempts {
            let mut record = self.get_or_create(customer_id).await?;
            apply(&mut record)?;

            match self.store.update(record).await {
                Ok(record) => return Ok(record),
                Err(err) if err.is_conflict() => {
                    debug!(customer_id, attempt, error = %err, "concurrent update, retrying");
                    tokio::task::yield_now().await;
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(customer_id, attempts = max_attempts, "giving up after repeated conflicts");
        Err(Error::Conflict {
            customer_id,
            attempts: max_attempts,
        })
    }

    /// Best-effort delivery to the audit sink
    async fn emit_audit(&self, entry: AuditEntry) {
        let customer_id = entry.customer_id;
        if let Err(err) = self.audit.record(entry).await {
            warn!(customer_id, error = %err, "failed to record audit entry");
        }
    }
}

/// Validate a caller-provided amount of points
fn positive_amount(amount: i64) -> Result<u64, Error> {
    if amount <= 0 {
        return Err(Error::InvalidArgument(
            format!("amount must be positive, got {amount}").into(),
        ));
    }

    Ok(amount.unsigned_abs())
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The record, id, or customer does not exist
    #[error("not found: {0}")]
    NotFound(#[source] store::Error),

    /// Concurrent writers kept changing the record
    #[error("conflicting writes on customer {customer_id} after {attempts} attempt(s)")]
    Conflict {
        customer_id: CustomerId,
        attempts: u32,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(Cow<'static, str>),

    #[error("insufficient points: balance {balance}, requested {requested}")]
    InsufficientBalance { balance: u64, requested: u64 },

    #[error("storage failure: {0}")]
    Storage(#[source] store::Error),
}

impl From<store::Error> for Error {
    fn from(err: store::Error) -> Self {
        match err {
            store::Error::RecordNotFound(_) | store::Error::CustomerNotFound(_) => {
                Self::NotFound(err)
            }
            store::Error::DuplicateCustomer(customer_id)
            | store::Error::VersionMismatch { customer_id, .. } => Self::Conflict {
                customer_id,
                attempts: 1,
            },
            store::Error::Adapter(_) => Self::Storage(err),
        }
    }
}

impl From<BalanceError> for Error {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::Insufficient { balance, requested } => {
                Self::InsufficientBalance { balance, requested }
            }
            BalanceError::Overflow { .. } => Self::InvalidArgument(err.to_string().into()),
        }
    }
}
