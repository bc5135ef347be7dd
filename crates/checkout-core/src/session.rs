//! # Payment Session Types
//!
//! The backend-issued authorization context for one checkout attempt, the wire
//! shapes of the session-open call, and the result contract handed back to the
//! embedder.

use crate::error::{CheckoutError, CheckoutResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status string reported for every completed charge
pub const STATUS_SUCCEEDED: &str = "succeeded";

/// Nominal amount reported for small-amount orders
pub const SMALL_ORDER_AMOUNT: &str = "0.50";

/// Amount reported for free orders
pub const FREE_ORDER_AMOUNT: &str = "0";

/// How the backend classified an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Requires real card confirmation
    Normal,
    /// Zero amount, no card needed
    Free,
    /// Nominal amount processed without card details
    SmallAmount,
}

/// Request body for the backend session-open call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Decimal amount as entered by the storefront (e.g. "25.00")
    pub amount: String,
    /// Currency code (e.g. "USD")
    pub currency: String,
    /// Tenant isolating this storefront's orders
    pub restaurant_id: String,
}

impl SessionRequest {
    pub fn new(
        amount: impl Into<String>,
        currency: impl Into<String>,
        restaurant_id: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            currency: currency.into(),
            restaurant_id: restaurant_id.into(),
        }
    }
}

/// Response of the backend session-open call.
///
/// Every field except `success` is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_order: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_order: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SessionResponse {
    /// A normal order answered with a client secret
    pub fn with_secret(client_secret: impl Into<String>) -> Self {
        Self {
            success: true,
            client_secret: Some(client_secret.into()),
            ..Default::default()
        }
    }

    /// A free order answered with a backend order id
    pub fn free(order_id: impl Into<String>) -> Self {
        Self {
            success: true,
            free_order: Some(true),
            order_id: Some(order_id.into()),
            ..Default::default()
        }
    }

    /// A small order answered with a backend order id
    pub fn small(order_id: impl Into<String>) -> Self {
        Self {
            success: true,
            small_order: Some(true),
            order_id: Some(order_id.into()),
            ..Default::default()
        }
    }

    /// A failed response carrying error messages
    pub fn failure(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
            ..Default::default()
        }
    }

    /// Classify the response into a session.
    ///
    /// Checked in order: free marker, small marker, client secret, bare
    /// success (treated as small). Anything else is a validation failure.
    pub fn classify(self) -> CheckoutResult<PaymentSession> {
        if self.free_order.unwrap_or(false) {
            let order_id = self.order_id.unwrap_or_else(|| special_order_id("special"));
            return Ok(PaymentSession::free(order_id));
        }

        if self.small_order.unwrap_or(false) {
            let order_id = self.order_id.unwrap_or_else(|| special_order_id("special"));
            return Ok(PaymentSession::small_amount(order_id));
        }

        if let Some(secret) = self.client_secret.filter(|s| !s.is_empty()) {
            return Ok(PaymentSession::normal(secret));
        }

        if self.success {
            return Ok(PaymentSession::small_amount(special_order_id("special")));
        }

        Err(CheckoutError::Validation(
            "No client secret returned".to_string(),
        ))
    }
}

/// The session opened for one checkout attempt.
///
/// Exactly one of the client secret and the special order id is populated,
/// determined by the classification. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    classification: Classification,
    client_secret: Option<String>,
    special_order_id: Option<String>,
}

impl PaymentSession {
    pub fn normal(client_secret: impl Into<String>) -> Self {
        Self {
            classification: Classification::Normal,
            client_secret: Some(client_secret.into()),
            special_order_id: None,
        }
    }

    pub fn free(order_id: impl Into<String>) -> Self {
        Self {
            classification: Classification::Free,
            client_secret: None,
            special_order_id: Some(order_id.into()),
        }
    }

    pub fn small_amount(order_id: impl Into<String>) -> Self {
        Self {
            classification: Classification::SmallAmount,
            client_secret: None,
            special_order_id: Some(order_id.into()),
        }
    }

    /// Session synthesized locally when running in test mode
    pub fn test_mode() -> Self {
        Self::normal(format!("test_secret_{}", short_token(13)))
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn special_order_id(&self) -> Option<&str> {
        self.special_order_id.as_deref()
    }

    /// True for sessions that complete without a card confirmation
    pub fn is_special(&self) -> bool {
        !matches!(self.classification, Classification::Normal)
    }
}

/// Details delivered to the embedder when a payment completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    /// `succeeded` or a gateway-reported status
    pub status: String,

    /// Provider transaction id, or the special order id
    pub transaction_id: String,

    /// Kept for webhook lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    /// Decimal amount actually charged
    pub amount: String,
}

impl PaymentResult {
    /// A successful charge identified by one provider id
    pub fn succeeded(id: impl Into<String>, amount: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            status: STATUS_SUCCEEDED.to_string(),
            transaction_id: id.clone(),
            payment_id: Some(id.clone()),
            payment_intent_id: Some(id),
            amount: amount.into(),
        }
    }

    /// Simulated success for test mode
    pub fn simulated(amount: impl Into<String>) -> Self {
        Self::succeeded(format!("pi_test_{}", short_token(13)), amount)
    }
}

/// Random lowercase alphanumeric token of at most `len` characters
pub fn short_token(len: usize) -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(len);
    token
}

fn special_order_id(prefix: &str) -> String {
    format!("{}_{}", prefix, short_token(8))
}
