use super::aggregate::{PayInvoiceTally, SignEventTally};
use super::registry::{HandlerRegistry, Registration};
use crate::config::BrokerConfig;
use crate::domain::ports::{PayInvoiceHandler, SharedEmitter, SignEventHandler};
use crate::domain::request::{InboundRequest, PayInvoiceRequest, SignEventRequest};
use crate::domain::verdict::{OutboundResponse, PayInvoiceOutcome, SignEventVerdict};
use crate::error::{HandlerError, HandlerResult, Result};
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Collects handler opinions for each request and reports one verdict back.
///
/// Every broker owns its own pair of registries, so independent brokers never
/// see each other's handlers. Cloning a broker shares its registries and
/// emitter.
#[derive(Clone)]
pub struct Broker {
    sign_event_handlers: HandlerRegistry<dyn SignEventHandler>,
    pay_invoice_handlers: HandlerRegistry<dyn PayInvoiceHandler>,
    emitter: SharedEmitter,
    config: BrokerConfig,
}

impl Broker {
    /// Creates a new `Broker` with empty registries.
    ///
    /// # Arguments
    ///
    /// * `emitter` - Where verdicts are sent.
    /// * `config` - Handler timeout and channel sizing.
    pub fn new(emitter: SharedEmitter, config: BrokerConfig) -> Self {
        Self {
            sign_event_handlers: HandlerRegistry::new(),
            pay_invoice_handlers: HandlerRegistry::new(),
            emitter,
            config,
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn register_sign_event_handler<H>(&self, handler: H) -> Registration
    where
        H: SignEventHandler + 'static,
    {
        self.sign_event_handlers.register(Arc::new(handler))
    }

    pub fn register_pay_invoice_handler<H>(&self, handler: H) -> Registration
    where
        H: PayInvoiceHandler + 'static,
    {
        self.pay_invoice_handlers.register(Arc::new(handler))
    }

    pub fn sign_event_handlers(&self) -> &HandlerRegistry<dyn SignEventHandler> {
        &self.sign_event_handlers
    }

    pub fn pay_invoice_handlers(&self) -> &HandlerRegistry<dyn PayInvoiceHandler> {
        &self.pay_invoice_handlers
    }

    /// Polls sign-event handlers one at a time until one approves, then
    /// reports the verdict for `request`'s event id.
    ///
    /// An empty registry, or one where every handler refuses or faults,
    /// yields `Denied`. An emitter failure is returned as is and never retried.
    pub async fn handle_sign_event(&self, request: SignEventRequest) -> Result<SignEventVerdict> {
        let request = Arc::new(request);
        let handlers = self.sign_event_handlers.snapshot();
        debug!(
            event_id = request.event_id(),
            handlers = handlers.len(),
            "Dispatching sign-event request"
        );

        let mut tally = SignEventTally::new();
        let mut decided = None;
        for handler in handlers {
            let shared = request.clone();
            let opinion = self
                .poll(async move { handler.decide(&shared).await })
                .await;
            if let Err(e) = &opinion {
                warn!(event_id = request.event_id(), error = %e, "Sign-event handler fault");
            }
            if let ControlFlow::Break(verdict) = tally.observe(&opinion) {
                decided = Some(verdict);
                break;
            }
        }

        let polled = tally.polled();
        let verdict = decided.unwrap_or_else(|| tally.finish());
        info!(
            event_id = request.event_id(),
            polled,
            approved = verdict.is_approved(),
            "Sign-event verdict"
        );

        self.emitter
            .respond_to_sign_event(request.event_id(), verdict)
            .await?;
        Ok(verdict)
    }

    /// Polls pay-invoice handlers one at a time. The first `Paid` wins;
    /// otherwise any `Failed` beats `Denied`.
    pub async fn handle_pay_invoice(&self, request: PayInvoiceRequest) -> Result<PayInvoiceOutcome> {
        let request = Arc::new(request);
        let handlers = self.pay_invoice_handlers.snapshot();
        debug!(
            invoice = request.invoice(),
            handlers = handlers.len(),
            "Dispatching pay-invoice request"
        );

        let mut tally = PayInvoiceTally::new();
        let mut decided = None;
        for handler in handlers {
            let shared = request.clone();
            let opinion = self
                .poll(async move { handler.decide(&shared).await })
                .await;
            if let Err(e) = &opinion {
                warn!(invoice = request.invoice(), error = %e, "Pay-invoice handler fault");
            }
            if let ControlFlow::Break(outcome) = tally.observe(&opinion) {
                decided = Some(outcome);
                break;
            }
        }

        let polled = tally.polled();
        let outcome = decided.unwrap_or_else(|| tally.finish());
        info!(
            invoice = request.invoice(),
            polled,
            %outcome,
            "Pay-invoice verdict"
        );

        self.emitter
            .respond_to_pay_invoice(request.invoice(), outcome)
            .await?;
        Ok(outcome)
    }

    /// Routes an inbound request to its dispatcher and returns the response
    /// that was emitted.
    pub async fn handle(&self, request: InboundRequest) -> Result<OutboundResponse> {
        match request {
            InboundRequest::SignEvent(request) => {
                let event_id = request.event_id().to_string();
                let verdict = self.handle_sign_event(request).await?;
                Ok(OutboundResponse::sign_event(event_id, verdict))
            }
            InboundRequest::PayInvoice(request) => {
                let invoice = request.invoice().to_string();
                let outcome = self.handle_pay_invoice(request).await?;
                Ok(OutboundResponse::pay_invoice(invoice, outcome))
            }
        }
    }

    /// Subscribes the broker to `inbound`. Each request is dispatched in its
    /// own task, so slow handlers on one request do not hold up another.
    pub fn listen(&self, inbound: mpsc::Receiver<InboundRequest>) -> BrokerListener {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.clone().run(inbound, shutdown_rx));
        BrokerListener {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn run(
        self,
        mut inbound: mpsc::Receiver<InboundRequest>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Inbound subscription torn down");
                    break;
                }
                next = inbound.recv() => match next {
                    Some(request) => self.dispatch_detached(&mut in_flight, request),
                    None => {
                        debug!("Inbound channel closed");
                        break;
                    }
                },
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }

        // Requests the backend already queued are owed a verdict too.
        inbound.close();
        while let Some(request) = inbound.recv().await {
            self.dispatch_detached(&mut in_flight, request);
        }
        while in_flight.join_next().await.is_some() {}
    }

    fn dispatch_detached(&self, in_flight: &mut JoinSet<()>, request: InboundRequest) {
        let broker = self.clone();
        in_flight.spawn(async move {
            let key = request.correlation_key().to_string();
            if let Err(e) = broker.handle(request).await {
                warn!(correlation_key = %key, error = %e, "Failed to deliver verdict");
            }
        });
    }

    /// Runs one handler invocation in its own task so a panic stays contained,
    /// applying the configured timeout if there is one.
    async fn poll<T, F>(&self, invocation: F) -> HandlerResult<T>
    where
        T: Send + 'static,
        F: Future<Output = HandlerResult<T>> + Send + 'static,
    {
        let mut task = tokio::spawn(invocation);
        let joined = match self.config.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    // Wait for the handler to be dropped so its cleanup has run.
                    let _ = task.await;
                    return Err(HandlerError::TimedOut(limit));
                }
            },
            None => task.await,
        };

        match joined {
            Ok(opinion) => opinion,
            Err(e) if e.is_panic() => Err(HandlerError::Panicked),
            Err(_) => Err(HandlerError::Abandoned),
        }
    }
}

/// Handle on a broker's inbound subscription.
///
/// Tearing the subscription down stops intake of new requests; requests
/// already queued or in flight run to completion. Dropping the handle tears it down too.
pub struct BrokerListener {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl BrokerListener {
    /// Tears the subscription down and waits for queued and in-flight
    /// requests.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = (&mut self.task).await;
    }

    /// Waits until the inbound channel closes and every accepted request has
    /// been answered.
    pub async fn join(mut self) {
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
