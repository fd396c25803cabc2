use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::CustomerId,
    ports::{audit::AuditPort, store::PointsStorePort},
};
use tower::Service;
use tracing::info;
use uuid::Uuid;

use super::{Error, Ledger};

/// Administrative removal of a points record
pub enum DeleteRequest {
    ById(Uuid),
    ByCustomerId(CustomerId),
}

impl<S, A> Ledger<S, A>
where
    S: PointsStorePort + Send + Sync,
    A: AuditPort + Send + Sync,
{
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool, Error> {
        self.store.delete(id).await?;
        info!(%id, "deleted points record");

        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_by_customer_id(&self, customer_id: CustomerId) -> Result<bool, Error> {
        let record = self.store.load_by_customer_id(customer_id).await?;
        self.store.delete(record.id).await?;
        info!(customer_id, id = %record.id, balance = record.balance, "deleted points record");

        Ok(true)
    }
}

impl<S, A> Service<DeleteRequest> for Ledger<S, A>
where
    S: PointsStorePort + Send + Sync + 'static,
    A: AuditPort + Send + Sync + 'static,
{
    type Response = bool;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DeleteRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move {
            match req {
                DeleteRequest::ById(id) => ledger.delete_by_id(id).await,
                DeleteRequest::ByCustomerId(customer_id) => {
                    ledger.delete_by_customer_id(customer_id).await
                }
            }
        })
    }
}
