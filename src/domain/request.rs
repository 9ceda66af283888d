use serde::{Deserialize, Serialize};

/// An event awaiting a signature.
///
/// The broker only looks at `id`; every other field is carried through to
/// handlers untouched.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct UnsignedEvent {
    pub id: String,
    pub pubkey: String,
    #[serde(default)]
    pub created_at: u64,
    pub kind: u32,
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SignEventRequest {
    pub event: UnsignedEvent,
    /// Public key of the account the event would be signed with.
    pub requester: String,
}

impl SignEventRequest {
    pub fn new(event: UnsignedEvent, requester: impl Into<String>) -> Self {
        Self {
            event,
            requester: requester.into(),
        }
    }

    /// Correlation key for the verdict.
    pub fn event_id(&self) -> &str {
        &self.event.id
    }
}

/// A request to pay a Lightning invoice. The invoice string is its own
/// correlation key.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PayInvoiceRequest {
    pub invoice: String,
}

impl PayInvoiceRequest {
    pub fn new(invoice: impl Into<String>) -> Self {
        Self {
            invoice: invoice.into(),
        }
    }

    pub fn invoice(&self) -> &str {
        &self.invoice
    }
}

/// A request as delivered by the backend.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundRequest {
    SignEvent(SignEventRequest),
    PayInvoice(PayInvoiceRequest),
}

impl InboundRequest {
    pub fn correlation_key(&self) -> &str {
        match self {
            InboundRequest::SignEvent(request) => request.event_id(),
            InboundRequest::PayInvoice(request) => request.invoice(),
        }
    }
}
