//! # checkout-core
//!
//! Core types and orchestration for the storefront checkout.
//!
//! This crate provides:
//! - `Checkout`, the payment executor driving SDK load, session open and
//!   surface mount, and processing payments with reentrancy protection
//! - Capability traits (`SdkEnvironment`, `PaymentClient`, `SessionBackend`)
//!   the orchestrator depends on
//! - `PaymentSession` and its Free / SmallAmount / Normal classification
//! - `IntentProvider` for the server side of the session-open call
//! - `Tenant` and `TenantRegistry` for per-restaurant isolation
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{Checkout, CheckoutOptions, LoggingCallbacks};
//!
//! let options = CheckoutOptions::new("25.00", publishable_key)
//!     .with_tenant("4")
//!     .with_return_url(tenant.return_url());
//! let checkout = Checkout::new(options, environment, backend);
//!
//! let init = checkout.initialize().await;
//! checkout_core::report_initialization(&init, &LoggingCallbacks);
//!
//! // Later, when the customer submits
//! checkout.process_payment().await.dispatch(&LoggingCallbacks);
//! ```

pub mod checkout;
pub mod error;
pub mod event;
pub mod gateway;
pub mod money;
pub mod outcome;
pub mod provider;
pub mod session;
pub mod stage;
pub mod tenant;

#[cfg(test)]
mod fakes;

// Re-exports for convenience
pub use checkout::{
    Checkout, CheckoutOptions, CheckoutStatus, CheckoutView, SPECIAL_ORDER_DELAY,
    TEST_MODE_DELAY,
};
pub use error::{CheckoutError, CheckoutResult, GENERIC_FAILURE};
pub use event::{WebhookEvent, WebhookEventType};
pub use gateway::{
    Appearance, ConfirmOutcome, ConfirmParams, ElementOptions, GatewayError, IntentSummary,
    MountedElement, PaymentClient, PaymentSurface, RedirectPolicy, SdkEnvironment,
    SessionBackend, SurfaceOptions,
};
pub use money::{format_minor_units, parse_minor_units, Currency, Money};
pub use outcome::{
    report_initialization, LoggingCallbacks, PaymentCallbacks, PaymentOutcome, SkipReason,
};
pub use provider::{BoxedIntentProvider, CreatedIntent, IntentProvider, IntentRequest};
pub use session::{
    Classification, PaymentResult, PaymentSession, SessionRequest, SessionResponse,
};
pub use stage::Stage;
pub use tenant::{Tenant, TenantRegistry};
