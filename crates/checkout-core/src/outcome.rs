//! # Payment Outcomes
//!
//! `process_payment` resolves to a single tagged result. The success/error
//! callback pair only exists at the embedder boundary, through
//! [`PaymentCallbacks`] and [`PaymentOutcome::dispatch`].

use crate::error::{CheckoutError, CheckoutResult};
use crate::session::PaymentResult;
use tracing::{debug, info, warn};

/// Why an attempt returned without reaching a terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another attempt is still being processed
    InFlight,
    /// Client, surface or session not available yet (or torn down)
    NotReady,
}

/// Resolution of one `process_payment` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded(PaymentResult),
    Failed(CheckoutError),
    /// Silent early return; neither callback fires
    Skipped(SkipReason),
}

impl PaymentOutcome {
    /// True iff the success callback would fire
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Succeeded(_))
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentOutcome::Skipped(_))
    }

    /// `None` for skipped attempts
    pub fn into_result(self) -> Option<CheckoutResult<PaymentResult>> {
        match self {
            PaymentOutcome::Succeeded(result) => Some(Ok(result)),
            PaymentOutcome::Failed(err) => Some(Err(err)),
            PaymentOutcome::Skipped(_) => None,
        }
    }

    /// Invoke exactly one callback for terminal outcomes, none for skipped
    /// ones. Returns true iff the success callback was invoked.
    pub fn dispatch(&self, callbacks: &dyn PaymentCallbacks) -> bool {
        match self {
            PaymentOutcome::Succeeded(result) => {
                callbacks.on_payment_success(result);
                true
            }
            PaymentOutcome::Failed(err) => {
                callbacks.on_payment_error(err);
                false
            }
            PaymentOutcome::Skipped(reason) => {
                debug!(?reason, "payment attempt skipped");
                false
            }
        }
    }
}

/// Embedder-facing callback pair
pub trait PaymentCallbacks {
    fn on_payment_success(&self, details: &PaymentResult);
    fn on_payment_error(&self, error: &CheckoutError);
}

/// Forward an initialization failure once through the error callback
pub fn report_initialization(result: &CheckoutResult<()>, callbacks: &dyn PaymentCallbacks) {
    if let Err(err) = result {
        callbacks.on_payment_error(err);
    }
}

/// Callbacks that only log
pub struct LoggingCallbacks;

impl PaymentCallbacks for LoggingCallbacks {
    fn on_payment_success(&self, details: &PaymentResult) {
        info!(
            transaction_id = %details.transaction_id,
            amount = %details.amount,
            "payment succeeded"
        );
    }

    fn on_payment_error(&self, error: &CheckoutError) {
        warn!(%error, "payment failed");
    }
}
