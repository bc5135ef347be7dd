//! # checkout-stripe
//!
//! Stripe adapters for storefront-checkout.
//!
//! - **HttpSessionBackend** - browser side of the session-open call; POSTs
//!   `{amount, currency, restaurant_id}` to the storefront backend
//! - **StripeIntentService** - server side; creates PaymentIntents for normal
//!   orders (native targets only)
//! - **WebhookVerifier** - verifies `Stripe-Signature` and parses PaymentIntent
//!   and refund events
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_core::Checkout;
//! use checkout_stripe::{CheckoutConfig, HttpSessionBackend};
//!
//! let config = CheckoutConfig::from_env()?;
//! let backend = HttpSessionBackend::new(&config.api_base_url);
//! let checkout = Checkout::new(config.checkout_options("25.00"), environment, backend);
//! checkout.initialize().await?;
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use checkout_stripe::{dispatch_webhook_event, WebhookHandler, WebhookVerifier};
//!
//! struct Fulfilment;
//!
//! impl WebhookHandler for Fulfilment {
//!     fn on_payment_succeeded(&self, event: &WebhookEvent) -> CheckoutResult<()> {
//!         // Mark the order with this payment_id as paid
//!         Ok(())
//!     }
//! }
//!
//! let event = WebhookVerifier::new(&config.webhook_secret).verify(payload, signature)?;
//! dispatch_webhook_event(&Fulfilment, &event)?;
//! ```

pub mod backend;
pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod intents;
pub mod webhook;

// Re-exports
pub use backend::HttpSessionBackend;
pub use config::{CheckoutConfig, StripeConfig};
#[cfg(not(target_arch = "wasm32"))]
pub use intents::StripeIntentService;
pub use webhook::{
    dispatch_webhook_event, LoggingWebhookHandler, WebhookHandler, WebhookVerifier,
    REQUIRED_WEBHOOK_EVENTS,
};
