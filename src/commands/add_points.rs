use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{AuditEntry, CustomerId, PointsRecord},
    ports::{audit::AuditPort, store::PointsStorePort},
};
use tower::Service;
use tracing::info;

use super::{positive_amount, Error, Ledger};

pub struct AddPointsRequest {
    pub customer_id: CustomerId,
    /// Number of points to credit, must be positive
    pub amount: i64,
    /// Message explaining the reason for this credit.
    pub reason: String,
}

impl<S, A> Ledger<S, A>
where
    S: PointsStorePort + Send + Sync,
    A: AuditPort + Send + Sync,
{
    /// Credit points to a customer, creating their record if needed
    #[tracing::instrument(skip(self))]
    pub async fn add_points(
        &self,
        customer_id: CustomerId,
        amount: i64,
        reason: &str,
    ) -> Result<PointsRecord, Error> {
        let points = positive_amount(amount)?;

        let record = self
            .mutate(customer_id, |record| record.credit(points))
            .await?;
        info!(customer_id, points, balance = record.balance, "added points");

        self.emit_audit(AuditEntry::new(&record, amount, reason))
            .await;

        Ok(record)
    }
}

impl<S, A> Service<AddPointsRequest> for Ledger<S, A>
where
    S: PointsStorePort + Send + Sync + 'static,
    A: AuditPort + Send + Sync + 'static,
{
    type Response = PointsRecord;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: AddPointsRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move {
            ledger
                .add_points(req.customer_id, req.amount, &req.reason)
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::{audit::memory::MemoryAuditSink, store::memory::MemoryStore},
        config::LedgerConfig,
        ports::{
            audit::{Error as AuditError, MockAuditPort},
            store::{Error as StoreError, MockPointsStorePort},
        },
    };
    use chrono::Utc;
    use mockall::predicate::*;
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};
    use uuid::Uuid;

    #[fixture]
    fn customer_id() -> CustomerId {
        42
    }

    fn stored(customer_id: CustomerId, balance: u64, version: u64) -> PointsRecord {
        PointsRecord {
            id: Uuid::nil(),
            customer_id,
            balance,
            total_earned: balance,
            total_spent: 0,
            version,
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_call(customer_id: CustomerId) -> Result<(), BoxError> {
        // GIVEN
        // * a store with existing points
        // * an audit sink
        let store = MemoryStore::default();
        let audit = MemoryAuditSink::default();
        let ledger = Ledger::new(
            Arc::new(store.clone()),
            Arc::new(audit.clone()),
            LedgerConfig::default(),
        );
        ledger.add_points(customer_id, 305, "SOME REASON").await?;

        // WHEN calling the service
        let req = AddPointsRequest {
            customer_id,
            amount: 45,
            reason: "In-store purchase".to_string(),
        };
        let res = ledger.oneshot(req).await;

        // THEN
        // * it returns the updated record
        // * the store holds the same record
        // * both credits are audited
        assert_that!(res).is_ok().matches(|record| {
            record.balance == 350 && record.total_earned == 350 && record.total_spent == 0
        });
        assert_that!(store.load_by_customer_id(customer_id).await)
            .is_ok()
            .matches(|record| record.balance == 350 && record.version == 3);
        let entries = audit.entries_for(customer_id);
        assert_that!(entries).has_length(2);
        assert_that!(entries[1]).matches(|entry| {
            entry.delta == 45
                && entry.reason == "In-store purchase"
                && entry.resulting_balance == 350
        });

        Ok(())
    }

    #[rstest]
    #[case(0)]
    #[case(-10)]
    #[tokio::test]
    async fn test_invalid_amount(customer_id: CustomerId, #[case] amount: i64) {
        // GIVEN a store and an audit sink that must not be called
        let ledger = Ledger::new(
            Arc::new(MockPointsStorePort::new()),
            Arc::new(MockAuditPort::new()),
            LedgerConfig::default(),
        );

        // WHEN adding a non-positive amount
        let res = ledger.add_points(customer_id, amount, "").await;

        // THEN it is rejected before reaching the store
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::InvalidArgument(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn test_retry_on_conflict(customer_id: CustomerId) {
        // GIVEN a store where a concurrent writer changes the record once
        let mut store = MockPointsStorePort::new();
        let mut reads = 0;
        store
            .expect_load_by_customer_id()
            .times(2)
            .with(eq(customer_id))
            .returning(move |customer_id| {
                reads += 1;
                Ok(stored(customer_id, 10 * reads, reads))
            });
        let mut writes = 0;
        store.expect_update().times(2).returning(move |record| {
            writes += 1;
            if writes == 1 {
                Err(StoreError::VersionMismatch {
                    id: record.id,
                    customer_id: record.customer_id,
                    expected: record.version,
                    actual: record.version + 1,
                })
            } else {
                Ok(PointsRecord {
                    version: record.version + 1,
                    ..record
                })
            }
        });
        let mut audit = MockAuditPort::new();
        audit
            .expect_record()
            .times(1)
            .withf(|entry| entry.delta == 5 && entry.resulting_balance == 25)
            .returning(|_| Ok(()));
        let ledger = Ledger::new(Arc::new(store), Arc::new(audit), LedgerConfig::default());

        // WHEN adding points
        let res = ledger.add_points(customer_id, 5, "bonus").await;

        // THEN the credit is applied on top of the fresh read
        assert_that!(res).is_ok().matches(|record| {
            record.balance == 25 && record.total_earned == 25 && record.version == 3
        });
        Arc::into_inner(ledger.audit).unwrap().checkpoint();
    }

    #[rstest]
    #[tokio::test]
    async fn test_conflict_exhausted(customer_id: CustomerId) {
        // GIVEN a store that always reports a concurrent writer
        let mut store = MockPointsStorePort::new();
        store
            .expect_load_by_customer_id()
            .times(3)
            .returning(|customer_id| Ok(stored(customer_id, 10, 1)));
        store.expect_update().times(3).returning(|record| {
            Err(StoreError::VersionMismatch {
                id: record.id,
                customer_id: record.customer_id,
                expected: 1,
                actual: 2,
            })
        });
        let mut audit = MockAuditPort::new();
        audit.expect_record().never();
        let ledger = Ledger::new(
            Arc::new(store),
            Arc::new(audit),
            LedgerConfig { max_attempts: 3 },
        );

        // WHEN adding points
        let res = ledger.add_points(customer_id, 5, "").await;

        // THEN the conflict surfaces after the last attempt
        assert_that!(res).is_err().matches(|err| {
            matches!(
                err,
                Error::Conflict {
                    customer_id: 42,
                    attempts: 3
                }
            )
        });
    }

    #[rstest]
    #[tokio::test]
    async fn test_audit_failure_ignored(customer_id: CustomerId) {
        // GIVEN an audit sink that always fails
        let mut audit = MockAuditPort::new();
        audit
            .expect_record()
            .times(1)
            .returning(|_| Err(AuditError::Adapter("sink offline".into())));
        let ledger = Ledger::new(
            Arc::new(MemoryStore::default()),
            Arc::new(audit),
            LedgerConfig::default(),
        );

        // WHEN adding points
        let res = ledger.add_points(customer_id, 50, "bonus").await;

        // THEN the credit still succeeds
        assert_that!(res)
            .is_ok()
            .matches(|record| record.balance == 50);
    }

    #[rstest]
    #[tokio::test]
    async fn test_overflow(customer_id: CustomerId) {
        let store = MemoryStore::default();
        let ledger = Ledger::new(
            Arc::new(store.clone()),
            Arc::new(MemoryAuditSink::default()),
            LedgerConfig::default(),
        );
        ledger
            .add_points(customer_id, i64::MAX, "")
            .await
            .unwrap();
        ledger
            .add_points(customer_id, i64::MAX, "")
            .await
            .unwrap();

        // u64::MAX - 1 points so far, two more would overflow
        let res = ledger.add_points(customer_id, 2, "").await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::InvalidArgument(_)));
        assert_that!(store.load_by_customer_id(customer_id).await)
            .is_ok()
            .matches(|record| record.balance == u64::MAX - 1);
    }
}
