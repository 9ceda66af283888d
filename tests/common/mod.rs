#![allow(dead_code)]

use async_trait::async_trait;
use keystache_broker::domain::ports::{PayInvoiceHandler, ResponseEmitter, SignEventHandler};
use keystache_broker::domain::request::{PayInvoiceRequest, SignEventRequest, UnsignedEvent};
use keystache_broker::domain::verdict::{OutboundResponse, PayInvoiceOutcome, SignEventVerdict};
use keystache_broker::error::{BrokerError, HandlerError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Order in which handlers were invoked, by name.
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

/// Records every response instead of sending it anywhere.
#[derive(Clone, Default)]
pub struct RecordingEmitter {
    responses: Arc<Mutex<Vec<OutboundResponse>>>,
    fail_next: Arc<AtomicBool>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn responses(&self) -> Vec<OutboundResponse> {
        self.responses.lock().unwrap().clone()
    }

    /// Makes the next send fail with a transport error.
    pub fn fail_next_send(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn record(&self, response: OutboundResponse) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BrokerError::TransportError("backend unreachable".to_string()));
        }
        self.responses.lock().unwrap().push(response);
        Ok(())
    }
}

#[async_trait]
impl ResponseEmitter for RecordingEmitter {
    async fn respond_to_sign_event(&self, event_id: &str, verdict: SignEventVerdict) -> Result<()> {
        self.record(OutboundResponse::sign_event(event_id, verdict))
    }

    async fn respond_to_pay_invoice(
        &self,
        invoice: &str,
        outcome: PayInvoiceOutcome,
    ) -> Result<()> {
        self.record(OutboundResponse::pay_invoice(invoice, outcome))
    }
}

pub fn unsigned_event(id: &str) -> UnsignedEvent {
    UnsignedEvent {
        id: id.to_string(),
        pubkey: "79be667e".to_string(),
        created_at: 1_700_000_000,
        kind: 1,
        tags: vec![vec!["p".to_string(), "abcd".to_string()]],
        content: "hello".to_string(),
    }
}

pub fn sign_request(id: &str) -> SignEventRequest {
    SignEventRequest::new(unsigned_event(id), "79be667e")
}

pub fn pay_request(invoice: &str) -> PayInvoiceRequest {
    PayInvoiceRequest::new(invoice)
}

/// A sign-event handler that logs its name and answers `approve`.
pub fn sign_handler(
    name: &'static str,
    approve: bool,
    log: &CallLog,
) -> impl SignEventHandler + 'static {
    let log = log.clone();
    move |_request: SignEventRequest| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(name);
            Ok::<_, HandlerError>(approve)
        }
    }
}

/// A sign-event handler that logs its name and then fails.
pub fn failing_sign_handler(name: &'static str, log: &CallLog) -> impl SignEventHandler + 'static {
    let log = log.clone();
    move |_request: SignEventRequest| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(name);
            Err::<bool, _>(HandlerError::Failed("policy store offline".to_string()))
        }
    }
}

/// A pay-invoice handler that logs its name and reports `outcome`.
pub fn pay_handler(
    name: &'static str,
    outcome: PayInvoiceOutcome,
    log: &CallLog,
) -> impl PayInvoiceHandler + 'static {
    let log = log.clone();
    move |_request: PayInvoiceRequest| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(name);
            Ok::<_, HandlerError>(outcome)
        }
    }
}

/// A pay-invoice handler that logs its name and then fails.
pub fn failing_pay_handler(name: &'static str, log: &CallLog) -> impl PayInvoiceHandler + 'static {
    let log = log.clone();
    move |_request: PayInvoiceRequest| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(name);
            Err::<PayInvoiceOutcome, _>(HandlerError::Failed("wallet offline".to_string()))
        }
    }
}

/// A pay-invoice handler that logs its name and then panics.
pub fn panicking_pay_handler(
    name: &'static str,
    log: &CallLog,
) -> impl PayInvoiceHandler + 'static {
    let log = log.clone();
    move |_request: PayInvoiceRequest| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(name);
            if name.is_empty() {
                return Ok::<_, HandlerError>(PayInvoiceOutcome::Paid);
            }
            panic!("{name} panicked");
        }
    }
}
