//! # Payment Events
//!
//! Provider-neutral shape of the asynchronous notifications a gateway sends
//! after a charge settles, fails or is refunded.

use crate::money::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type of payment event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// Charge confirmed
    PaymentSucceeded,
    /// Charge attempt failed (declined, authentication failed)
    PaymentFailed,
    /// Intent cancelled before completion
    PaymentCanceled,
    /// Refund issued against a charge
    RefundIssued,
    /// Unknown event (passthrough)
    Unknown(String),
}

impl WebhookEventType {
    /// Map a gateway event name (e.g. `payment_intent.succeeded`)
    pub fn from_event_name(name: &str) -> Self {
        match name {
            "payment_intent.succeeded" => WebhookEventType::PaymentSucceeded,
            "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
            "payment_intent.canceled" => WebhookEventType::PaymentCanceled,
            "charge.refunded" => WebhookEventType::RefundIssued,
            other => WebhookEventType::Unknown(other.to_string()),
        }
    }
}

/// A parsed payment event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from provider
    pub event_id: String,

    pub event_type: WebhookEventType,

    /// Provider name
    pub provider: String,

    /// Related payment intent ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    /// Restaurant the charge was opened for (from intent metadata)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,

    /// Amount in minor units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,

    /// Gateway's last error message for failed charges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,

    /// Raw event object (for debugging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,

    pub timestamp: DateTime<Utc>,
}
