//! Human-in-the-loop decisions.
//!
//! A [`PromptHandler`] forwards each request to a presentation surface as a
//! [`PromptEvent`] and suspends until someone answers through the matching
//! [`PromptResolver`]. Each prompt is resolved at most once; answering a
//! prompt that is not pending does nothing.

use crate::domain::ports::{PayInvoiceHandler, SignEventHandler};
use crate::domain::request::{PayInvoiceRequest, SignEventRequest};
use crate::domain::verdict::PayInvoiceOutcome;
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// What the presentation surface is asked to show.
#[derive(Debug, Serialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptEvent {
    SignEvent(SignEventRequest),
    PayInvoice(PayInvoiceRequest),
}

type PendingMap<T> = Arc<Mutex<HashMap<String, oneshot::Sender<T>>>>;

fn lock<T>(map: &PendingMap<T>) -> MutexGuard<'_, HashMap<String, oneshot::Sender<T>>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct PendingPrompts {
    /// Keyed by event id.
    sign_events: PendingMap<bool>,
    /// Keyed by invoice string.
    invoices: PendingMap<PayInvoiceOutcome>,
}

/// One outstanding prompt. Dropping it withdraws the prompt, so a decision
/// abandoned by a timeout does not linger in the pending map.
struct PendingPrompt<T> {
    map: PendingMap<T>,
    key: String,
    answer: oneshot::Receiver<T>,
}

impl<T> PendingPrompt<T> {
    fn open(map: &PendingMap<T>, key: String) -> Self {
        let (tx, answer) = oneshot::channel();
        lock(map).insert(key.clone(), tx);
        Self {
            map: map.clone(),
            key,
            answer,
        }
    }

    async fn answer(&mut self) -> HandlerResult<T> {
        (&mut self.answer).await.map_err(|_| HandlerError::Abandoned)
    }
}

impl<T> Drop for PendingPrompt<T> {
    fn drop(&mut self) {
        self.answer.close();
        let mut map = lock(&self.map);
        // A newer prompt may have taken the key; only remove our own sender.
        if map.get(&self.key).is_some_and(|tx| tx.is_closed()) {
            map.remove(&self.key);
        }
    }
}

/// Creates a connected handler, resolver and the stream of prompts to show.
pub fn prompt_bridge() -> (
    PromptHandler,
    PromptResolver,
    mpsc::UnboundedReceiver<PromptEvent>,
) {
    let pending = Arc::new(PendingPrompts::default());
    let (events, prompts) = mpsc::unbounded_channel();
    (
        PromptHandler {
            pending: pending.clone(),
            events,
        },
        PromptResolver { pending },
        prompts,
    )
}

/// Handler that defers every decision to a person.
///
/// Implements both handler traits; register a clone with each registry.
#[derive(Clone)]
pub struct PromptHandler {
    pending: Arc<PendingPrompts>,
    events: mpsc::UnboundedSender<PromptEvent>,
}

impl PromptHandler {
    fn show(&self, event: PromptEvent) -> HandlerResult<()> {
        self.events
            .send(event)
            .map_err(|_| HandlerError::Failed("presentation surface is closed".to_string()))
    }
}

#[async_trait]
impl SignEventHandler for PromptHandler {
    async fn decide(&self, request: &SignEventRequest) -> HandlerResult<bool> {
        let event_id = request.event_id().to_string();
        let mut prompt = PendingPrompt::open(&self.pending.sign_events, event_id.clone());
        self.show(PromptEvent::SignEvent(request.clone()))?;
        debug!(event_id = %event_id, "Awaiting sign-event prompt");

        prompt.answer().await
    }
}

#[async_trait]
impl PayInvoiceHandler for PromptHandler {
    async fn decide(&self, request: &PayInvoiceRequest) -> HandlerResult<PayInvoiceOutcome> {
        let invoice = request.invoice().to_string();
        let mut prompt = PendingPrompt::open(&self.pending.invoices, invoice.clone());
        self.show(PromptEvent::PayInvoice(request.clone()))?;
        debug!(invoice = %invoice, "Awaiting pay-invoice prompt");

        prompt.answer().await
    }
}

/// Answers prompts raised by the paired [`PromptHandler`].
#[derive(Clone)]
pub struct PromptResolver {
    pending: Arc<PendingPrompts>,
}

impl PromptResolver {
    /// Returns `true` if a waiting prompt received the answer.
    pub fn resolve_sign_event(&self, event_id: &str, approved: bool) -> bool {
        let sender = lock(&self.pending.sign_events).remove(event_id);
        sender.is_some_and(|tx| tx.send(approved).is_ok())
    }

    /// Returns `true` if a waiting prompt received the answer.
    pub fn resolve_pay_invoice(&self, invoice: &str, outcome: PayInvoiceOutcome) -> bool {
        let sender = lock(&self.pending.invoices).remove(invoice);
        sender.is_some_and(|tx| tx.send(outcome).is_ok())
    }

    /// Number of prompts still waiting for an answer.
    pub fn pending(&self) -> usize {
        lock(&self.pending.sign_events).len() + lock(&self.pending.invoices).len()
    }
}
