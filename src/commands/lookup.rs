use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{CustomerId, PointsRecord},
    ports::{audit::AuditPort, store::PointsStorePort},
};
use tower::Service;
use uuid::Uuid;

use super::{Error, Ledger};

/// Read-only lookup of a single record
pub enum LookupRequest {
    ById(Uuid),
    ByCustomerId(CustomerId),
}

impl<S, A> Ledger<S, A>
where
    S: PointsStorePort + Send + Sync,
    A: AuditPort + Send + Sync,
{
    pub async fn get_by_id(&self, id: Uuid) -> Result<PointsRecord, Error> {
        Ok(self.store.load_by_id(id).await?)
    }

    /// Record of a customer, without creating it
    pub async fn get_by_customer_id(&self, customer_id: CustomerId) -> Result<PointsRecord, Error> {
        Ok(self.store.load_by_customer_id(customer_id).await?)
    }

    pub async fn has_points(&self, customer_id: CustomerId) -> Result<bool, Error> {
        Ok(self.store.customer_has_points(customer_id).await?)
    }

    /// Records of several customers, ordered by customer
    ///
    /// Customers without a record are left out.
    pub async fn balances_for(
        &self,
        customer_ids: impl IntoIterator<Item = CustomerId>,
    ) -> Result<Vec<PointsRecord>, Error> {
        let customer_ids = customer_ids.into_iter().collect();
        Ok(self.store.load_by_customer_ids(customer_ids).await?)
    }

    /// Sum of all customer balances
    pub async fn total_points_balance(&self) -> Result<u64, Error> {
        Ok(self.store.total_points_balance().await?)
    }
}

impl<S, A> Service<LookupRequest> for Ledger<S, A>
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

    fn call(&mut self, req: LookupRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move {
            match req {
                LookupRequest::ById(id) => ledger.get_by_id(id).await,
                LookupRequest::ByCustomerId(customer_id) => {
                    ledger.get_by_customer_id(customer_id).await
                }
            }
        })
    }
}
