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

pub struct SpendPointsRequest {
    pub customer_id: CustomerId,
    /// Number of points to debit, must be positive
    pub amount: i64,
    /// Message explaining the reason for this debit, such as an order reference.
    pub reason: String,
}

impl<S, A> Ledger<S, A>
where
    S: PointsStorePort + Send + Sync,
    A: AuditPort + Send + Sync,
{
    /// Debit points from a customer
    ///
    /// Fails with [`Error::InsufficientBalance`] without touching the record if the balance is
    /// lower than `amount`.
    #[tracing::instrument(skip(self))]
    pub async fn spend_points(
        &self,
        customer_id: CustomerId,
        amount: i64,
        reason: &str,
    ) -> Result<PointsRecord, Error> {
        let points = positive_amount(amount)?;

        let record = self
            .mutate(customer_id, |record| record.debit(points))
            .await?;
        info!(customer_id, points, balance = record.balance, "spent points");

        self.emit_audit(AuditEntry::new(&record, -amount, reason))
            .await;

        Ok(record)
    }
}

impl<S, A> Service<SpendPointsRequest> for Ledger<S, A>
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

    fn call(&mut self, req: SpendPointsRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move {
            ledger
                .spend_points(req.customer_id, req.amount, &req.reason)
                .await
        })
    }
}
