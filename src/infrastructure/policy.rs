//! Static decision handlers for running the broker without a human in the loop.

use crate::domain::ports::{PayInvoiceHandler, SignEventHandler};
use crate::domain::request::{PayInvoiceRequest, SignEventRequest};
use crate::domain::verdict::PayInvoiceOutcome;
use crate::error::HandlerResult;
use async_trait::async_trait;
use std::collections::HashSet;

/// Gives the same answer to every sign-event request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSignPolicy {
    approve: bool,
}

impl FixedSignPolicy {
    pub fn approve_all() -> Self {
        Self { approve: true }
    }

    pub fn deny_all() -> Self {
        Self { approve: false }
    }
}

#[async_trait]
impl SignEventHandler for FixedSignPolicy {
    async fn decide(&self, _request: &SignEventRequest) -> HandlerResult<bool> {
        Ok(self.approve)
    }
}

/// Reports the same outcome for every invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPayPolicy {
    outcome: PayInvoiceOutcome,
}

impl FixedPayPolicy {
    pub fn new(outcome: PayInvoiceOutcome) -> Self {
        Self { outcome }
    }
}

#[async_trait]
impl PayInvoiceHandler for FixedPayPolicy {
    async fn decide(&self, _request: &PayInvoiceRequest) -> HandlerResult<PayInvoiceOutcome> {
        Ok(self.outcome)
    }
}

/// Approves signing only for requesters whose public key is on the list.
#[derive(Debug, Clone, Default)]
pub struct PubkeyAllowList {
    allowed: HashSet<String>,
}

impl PubkeyAllowList {
    pub fn new<I, S>(pubkeys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: pubkeys
                .into_iter()
                .map(|key| key.into().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn is_allowed(&self, pubkey: &str) -> bool {
        self.allowed.contains(&pubkey.to_ascii_lowercase())
    }
}

#[async_trait]
impl SignEventHandler for PubkeyAllowList {
    async fn decide(&self, request: &SignEventRequest) -> HandlerResult<bool> {
        Ok(self.is_allowed(&request.requester))
    }
}
