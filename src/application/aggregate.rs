//! Reduction of per-handler opinions into one verdict.
//!
//! Each tally is fed opinions in poll order. `observe` returns
//! `ControlFlow::Break` as soon as the verdict is decided, at which point the
//! dispatcher stops polling. If no handler decides, `finish` produces the
//! fallback verdict.

use crate::domain::verdict::{PayInvoiceOutcome, SignEventVerdict};
use crate::error::HandlerResult;
use std::ops::ControlFlow;

#[derive(Debug, Default)]
pub struct SignEventTally {
    polled: usize,
}

impl SignEventTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fault counts as a refusal.
    pub fn observe(&mut self, opinion: &HandlerResult<bool>) -> ControlFlow<SignEventVerdict> {
        self.polled += 1;
        match opinion {
            Ok(true) => ControlFlow::Break(SignEventVerdict::Approved),
            Ok(false) | Err(_) => ControlFlow::Continue(()),
        }
    }

    pub fn finish(self) -> SignEventVerdict {
        SignEventVerdict::Denied
    }

    pub fn polled(&self) -> usize {
        self.polled
    }
}

#[derive(Debug, Default)]
pub struct PayInvoiceTally {
    polled: usize,
    any_failed: bool,
}

impl PayInvoiceTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fault contributes no opinion.
    pub fn observe(
        &mut self,
        opinion: &HandlerResult<PayInvoiceOutcome>,
    ) -> ControlFlow<PayInvoiceOutcome> {
        self.polled += 1;
        match opinion {
            Ok(PayInvoiceOutcome::Paid) => ControlFlow::Break(PayInvoiceOutcome::Paid),
            Ok(PayInvoiceOutcome::Failed) => {
                self.any_failed = true;
                ControlFlow::Continue(())
            }
            Ok(PayInvoiceOutcome::Denied) | Err(_) => ControlFlow::Continue(()),
        }
    }

    pub fn finish(self) -> PayInvoiceOutcome {
        if self.any_failed {
            PayInvoiceOutcome::Failed
        } else {
            PayInvoiceOutcome::Denied
        }
    }

    pub fn polled(&self) -> usize {
        self.polled
    }
}
