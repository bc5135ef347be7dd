//! # Intent Provider Trait
//!
//! Server-side counterpart of the session-open call: the storefront backend
//! asks a card processor for a payment intent and hands its client secret
//! back to the browser.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    IntentProvider (trait)                   │
//! │  ├── create_intent()                                        │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                  ┌─────────┴─────────┐
//!                  │                   │
//!          ┌───────┴───────┐   ┌───────┴───────┐
//!          │ StripeIntent  │   │  test fakes   │
//!          │   Service     │   │               │
//!          └───────────────┘   └───────────────┘
//! ```

use crate::error::CheckoutResult;
use crate::money::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Parameters for creating a payment intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    pub amount: Money,
    /// Restaurant the order belongs to; recorded in intent metadata
    pub tenant_id: String,
    pub statement_descriptor_suffix: Option<String>,
    /// Repeated requests with the same key create one intent
    pub idempotency_key: String,
    pub metadata: BTreeMap<String, String>,
}

impl IntentRequest {
    pub fn new(
        amount: Money,
        tenant_id: impl Into<String>,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            tenant_id: tenant_id.into(),
            statement_descriptor_suffix: None,
            idempotency_key: idempotency_key.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_statement_descriptor(mut self, suffix: Option<String>) -> Self {
        self.statement_descriptor_suffix = suffix;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A payment intent as created by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIntent {
    pub id: String,
    pub client_secret: String,
    /// Provider status (e.g. `requires_payment_method`)
    pub status: String,
    /// Minor units
    pub amount: i64,
}

/// Creates payment intents with a card processor.
#[async_trait]
pub trait IntentProvider: Send + Sync {
    async fn create_intent(&self, request: &IntentRequest) -> CheckoutResult<CreatedIntent>;

    /// Provider name (for logging and error tagging)
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared intent provider (dynamic dispatch)
pub type BoxedIntentProvider = Arc<dyn IntentProvider>;
