//! # checkout-api
//!
//! Backend half of the storefront checkout.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The session-open endpoint the browser checkout calls
//! - Webhook handlers for payment events
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/stripe/create_intent` | Open a payment session (free / small / normal) |
//! | GET | `/api/stripe/config` | Publishable key and test-mode flag |
//! | POST | `/webhook/stripe` | Stripe webhook |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
