use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Identifier of the customer owning a points record
pub type CustomerId = u64;

/// Points balance of a customer, as persisted by the store
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PointsRecord {
    /// Unique identifier for the record
    ///
    /// Assigned by the store on creation and never changed afterwards.
    pub id: Uuid,
    /// Owning customer. A customer has at most one record.
    pub customer_id: CustomerId,
    /// Number of spendable points
    pub balance: u64,
    /// Sum of every credit ever applied
    pub total_earned: u64,
    /// Sum of every debit ever applied
    pub total_spent: u64,
    /// Optimistic concurrency token
    ///
    /// The store bumps this on every successful update and rejects updates that carry a stale
    /// value.
    pub version: u64,
    /// Time of the last write
    pub updated_at: DateTime<Utc>,
}

impl PointsRecord {
    /// Add `amount` points to the balance and to the earned total
    pub fn credit(&mut self, amount: u64) -> Result<(), BalanceError> {
        let overflow = || BalanceError::Overflow {
            balance: self.balance,
            amount,
        };
        let balance = self.balance.checked_add(amount).ok_or_else(overflow)?;
        let total_earned = self.total_earned.checked_add(amount).ok_or_else(overflow)?;

        self.balance = balance;
        self.total_earned = total_earned;
        Ok(())
    }

    /// Remove `amount` points from the balance and add them to the spent total
    ///
    /// Nothing is modified if the balance is lower than `amount`.
    pub fn debit(&mut self, amount: u64) -> Result<(), BalanceError> {
        if self.balance < amount {
            return Err(BalanceError::Insufficient {
                balance: self.balance,
                requested: amount,
            });
        }
        let total_spent = self
            .total_spent
            .checked_add(amount)
            .ok_or(BalanceError::Overflow {
                balance: self.balance,
                amount,
            })?;

        self.balance -= amount;
        self.total_spent = total_spent;
        Ok(())
    }

    /// Whether the balance matches the earned and spent totals
    pub fn is_consistent(&self) -> bool {
        self.total_earned.checked_sub(self.total_spent) == Some(self.balance)
    }
}

/// Points record that does not exist in the store yet
///
/// Kept apart from [`PointsRecord`] so that a missing record is never mistaken for a record
/// with a zero balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPointsRecord {
    pub customer_id: CustomerId,
    pub balance: u64,
    pub total_earned: u64,
    pub total_spent: u64,
}

impl NewPointsRecord {
    /// Zero-valued record for a customer
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            balance: 0,
            total_earned: 0,
            total_spent: 0,
        }
    }
}

/// Audit trail entry emitted for every balance mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub customer_id: CustomerId,
    /// Difference in points
    ///
    /// A positive number is a credit. A negative number is a debit.
    pub delta: i64,
    /// Message explaining the reason for this mutation.
    pub reason: String,
    /// Balance after the mutation was persisted
    pub resulting_balance: u64,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(record: &PointsRecord, delta: i64, reason: impl Into<String>) -> Self {
        Self {
            customer_id: record.customer_id,
            delta,
            reason: reason.into(),
            resulting_balance: record.balance,
            timestamp: record.updated_at,
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    /// Trying to remove more points than the current balance
    #[error("insufficient points: balance {balance}, requested {requested}")]
    Insufficient { balance: u64, requested: u64 },

    #[error("adding {amount} points to {balance} overflows the counters")]
    Overflow { balance: u64, amount: u64 },
}
