use super::request::{PayInvoiceRequest, SignEventRequest};
use super::verdict::{PayInvoiceOutcome, SignEventVerdict};
use crate::error::{HandlerResult, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// One opinion on whether an event may be signed.
#[async_trait]
pub trait SignEventHandler: Send + Sync {
    async fn decide(&self, request: &SignEventRequest) -> HandlerResult<bool>;
}

/// One opinion on what should happen to an invoice.
#[async_trait]
pub trait PayInvoiceHandler: Send + Sync {
    async fn decide(&self, request: &PayInvoiceRequest) -> HandlerResult<PayInvoiceOutcome>;
}

/// Delivers verdicts back to the backend that asked for them.
///
/// Implementations send exactly one message per call and report transport
/// failures without retrying.
#[async_trait]
pub trait ResponseEmitter: Send + Sync {
    async fn respond_to_sign_event(&self, event_id: &str, verdict: SignEventVerdict) -> Result<()>;

    async fn respond_to_pay_invoice(
        &self,
        invoice: &str,
        outcome: PayInvoiceOutcome,
    ) -> Result<()>;
}

pub type SharedEmitter = Arc<dyn ResponseEmitter>;

#[async_trait]
impl<F, Fut> SignEventHandler for F
where
    F: Fn(SignEventRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<bool>> + Send + 'static,
{
    async fn decide(&self, request: &SignEventRequest) -> HandlerResult<bool> {
        (self)(request.clone()).await
    }
}

#[async_trait]
impl<F, Fut> PayInvoiceHandler for F
where
    F: Fn(PayInvoiceRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<PayInvoiceOutcome>> + Send + 'static,
{
    async fn decide(&self, request: &PayInvoiceRequest) -> HandlerResult<PayInvoiceOutcome> {
        (self)(request.clone()).await
    }
}
