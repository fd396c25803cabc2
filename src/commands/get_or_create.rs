use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{CustomerId, NewPointsRecord, PointsRecord},
    ports::{audit::AuditPort, store::PointsStorePort},
};
use tower::Service;
use tracing::{debug, info};

use super::{Error, Ledger};

pub struct GetOrCreateRequest {
    pub customer_id: CustomerId,
}

impl<S, A> Ledger<S, A>
where
    S: PointsStorePort + Send + Sync,
    A: AuditPort + Send + Sync,
{
    /// Return the record of a customer, creating an empty one if none exists
    ///
    /// When two callers race to create the same record, the loser reads the winner's record.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create(&self, customer_id: CustomerId) -> Result<PointsRecord, Error> {
        let max_attempts = self.max_attempts();
        for attempt in 1..=max_attempts {
            match self.store.load_by_customer_id(customer_id).await {
                Ok(record) => return Ok(record),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err.into()),
            }

            match self.store.create(NewPointsRecord::new(customer_id)).await {
                Ok(record) => {
                    info!(customer_id, id = %record.id, "created points record");
                    return Ok(record);
                }
                Err(err) if err.is_conflict() => {
                    debug!(customer_id, attempt, "lost creation race, reading again");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(Error::Conflict {
            customer_id,
            attempts: max_attempts,
        })
    }
}

impl<S, A> Service<GetOrCreateRequest> for Ledger<S, A>
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

    fn call(&mut self, req: GetOrCreateRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move { ledger.get_or_create(req.customer_id).await })
    }
}
