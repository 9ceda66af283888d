use crate::domain::ports::ResponseEmitter;
use crate::domain::verdict::{OutboundResponse, PayInvoiceOutcome, SignEventVerdict};
use crate::error::{BrokerError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A response emitter that hands verdicts to a tokio channel.
///
/// Whoever owns the receiving end forwards them to the backend. If the
/// receiver is gone the send fails with a transport error and the verdict is
/// lost.
#[derive(Clone)]
pub struct ChannelEmitter {
    sender: mpsc::Sender<OutboundResponse>,
}

impl ChannelEmitter {
    /// Creates an emitter and the receiver its verdicts arrive on.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OutboundResponse>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    async fn emit(&self, response: OutboundResponse) -> Result<()> {
        self.sender.send(response).await.map_err(|e| {
            BrokerError::TransportError(format!(
                "response channel closed, dropped verdict for {}",
                e.0.correlation_key()
            ))
        })
    }
}

#[async_trait]
impl ResponseEmitter for ChannelEmitter {
    async fn respond_to_sign_event(&self, event_id: &str, verdict: SignEventVerdict) -> Result<()> {
        self.emit(OutboundResponse::sign_event(event_id, verdict))
            .await
    }

    async fn respond_to_pay_invoice(
        &self,
        invoice: &str,
        outcome: PayInvoiceOutcome,
    ) -> Result<()> {
        self.emit(OutboundResponse::pay_invoice(invoice, outcome))
            .await
    }
}
