use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Final decision for a sign-event request.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SignEventVerdict {
    Approved,
    Denied,
}

impl SignEventVerdict {
    pub fn is_approved(self) -> bool {
        self == SignEventVerdict::Approved
    }
}

impl From<bool> for SignEventVerdict {
    fn from(approved: bool) -> Self {
        if approved {
            SignEventVerdict::Approved
        } else {
            SignEventVerdict::Denied
        }
    }
}

/// Outcome of a pay-invoice request.
///
/// `Failed` is an operational failure (no route, insufficient funds) and
/// `Denied` a policy refusal. Both project to `approved = false`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PayInvoiceOutcome {
    Paid,
    Failed,
    Denied,
}

impl PayInvoiceOutcome {
    pub fn is_approved(self) -> bool {
        self == PayInvoiceOutcome::Paid
    }
}

impl fmt::Display for PayInvoiceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayInvoiceOutcome::Paid => "paid",
            PayInvoiceOutcome::Failed => "failed",
            PayInvoiceOutcome::Denied => "denied",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown pay-invoice outcome: {0}")]
pub struct UnknownOutcome(pub String);

impl FromStr for PayInvoiceOutcome {
    type Err = UnknownOutcome;

    // UI surfaces report a refusal as "rejected".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PayInvoiceOutcome::Paid),
            "failed" => Ok(PayInvoiceOutcome::Failed),
            "denied" | "rejected" => Ok(PayInvoiceOutcome::Denied),
            other => Err(UnknownOutcome(other.to_string())),
        }
    }
}

/// A verdict on its way back to the backend.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundResponse {
    SignEvent {
        event_id: String,
        approved: bool,
    },
    PayInvoice {
        invoice: String,
        approved: bool,
        outcome: PayInvoiceOutcome,
    },
}

impl OutboundResponse {
    pub fn sign_event(event_id: impl Into<String>, verdict: SignEventVerdict) -> Self {
        OutboundResponse::SignEvent {
            event_id: event_id.into(),
            approved: verdict.is_approved(),
        }
    }

    pub fn pay_invoice(invoice: impl Into<String>, outcome: PayInvoiceOutcome) -> Self {
        OutboundResponse::PayInvoice {
            invoice: invoice.into(),
            approved: outcome.is_approved(),
            outcome,
        }
    }

    pub fn correlation_key(&self) -> &str {
        match self {
            OutboundResponse::SignEvent { event_id, .. } => event_id,
            OutboundResponse::PayInvoice { invoice, .. } => invoice,
        }
    }

    pub fn approved(&self) -> bool {
        match self {
            OutboundResponse::SignEvent { approved, .. }
            | OutboundResponse::PayInvoice { approved, .. } => *approved,
        }
    }
}
