//! # Stripe Webhook Handling
//!
//! Verifies `Stripe-Signature` headers and turns PaymentIntent and refund
//! notifications into [`WebhookEvent`]s. Orders are matched by the intent id
//! the browser reported as `payment_id`.

use chrono::{DateTime, Utc};
use checkout_core::{CheckoutError, CheckoutResult, Currency, WebhookEvent, WebhookEventType};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Maximum age of a signed payload, in seconds
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verifies and parses Stripe webhook payloads
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: SIGNATURE_TOLERANCE_SECS,
        }
    }

    /// Verify against the current time
    pub fn verify(&self, payload: &[u8], signature: &str) -> CheckoutResult<WebhookEvent> {
        self.verify_at(payload, signature, Utc::now().timestamp())
    }

    /// Verify the signature header against `now` (unix seconds) and parse the event.
    #[instrument(skip(self, payload, signature))]
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> CheckoutResult<WebhookEvent> {
        let sig_parts = parse_signature_header(signature)?;

        if (now - sig_parts.timestamp).abs() > self.tolerance_secs {
            return Err(CheckoutError::WebhookVerificationFailed(
                "Timestamp outside tolerance".to_string(),
            ));
        }

        let signed_payload = format!(
            "{}.{}",
            sig_parts.timestamp,
            String::from_utf8_lossy(payload)
        );
        let expected_sig = compute_hmac_sha256(&self.secret, &signed_payload)?;

        let valid = sig_parts
            .signatures
            .iter()
            .any(|sig| constant_time_compare(sig, &expected_sig));

        if !valid {
            return Err(CheckoutError::WebhookVerificationFailed(
                "Signature mismatch".to_string(),
            ));
        }

        parse_event(payload)
    }
}

/// Parse a (verified) Stripe event body
pub fn parse_event(payload: &[u8]) -> CheckoutResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        CheckoutError::WebhookParseError(format!("Failed to parse webhook: {}", e))
    })?;

    debug!("Verified Stripe webhook: type={}", event.event_type);

    let event_type = WebhookEventType::from_event_name(&event.event_type);
    let object = event.data.object;
    let str_field = |key: &str| object.get(key).and_then(|v| v.as_str()).map(String::from);

    // Refunds arrive as charge objects that point back at their intent
    let payment_intent_id = match event_type {
        WebhookEventType::RefundIssued => str_field("payment_intent"),
        _ => str_field("id"),
    };

    let amount = match event_type {
        WebhookEventType::RefundIssued => object.get("amount_refunded"),
        _ => object.get("amount"),
    }
    .and_then(|v| v.as_i64());

    let currency = str_field("currency").and_then(|c| c.parse::<Currency>().ok());

    let restaurant_id = object
        .get("metadata")
        .and_then(|m| m.get("restaurant_id"))
        .and_then(|v| v.as_str())
        .map(String::from);

    let failure_message = object
        .get("last_payment_error")
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(WebhookEvent {
        event_id: event.id,
        event_type,
        provider: "stripe".to_string(),
        payment_intent_id,
        restaurant_id,
        amount,
        currency,
        failure_message,
        raw_data: Some(serde_json::Value::Object(object)),
        timestamp: DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now),
    })
}

/// Webhook event handler trait
///
/// Implement this trait to react to payment notifications.
#[allow(unused_variables)]
pub trait WebhookHandler: Send + Sync {
    /// Called when a charge is confirmed
    fn on_payment_succeeded(&self, event: &WebhookEvent) -> CheckoutResult<()> {
        info!(
            "Payment succeeded: intent={:?}, restaurant={:?}",
            event.payment_intent_id, event.restaurant_id
        );
        Ok(())
    }

    /// Called when a charge attempt fails
    fn on_payment_failed(&self, event: &WebhookEvent) -> CheckoutResult<()> {
        warn!(
            "Payment failed: intent={:?}, reason={:?}",
            event.payment_intent_id, event.failure_message
        );
        Ok(())
    }

    fn on_payment_canceled(&self, event: &WebhookEvent) -> CheckoutResult<()> {
        info!("Payment canceled: {:?}", event.payment_intent_id);
        Ok(())
    }

    /// Called when a refund is issued
    fn on_refund_issued(&self, event: &WebhookEvent) -> CheckoutResult<()> {
        info!("Refund issued: {:?}", event.payment_intent_id);
        Ok(())
    }

    /// Called for unknown/unhandled events
    fn on_unknown_event(&self, event: &WebhookEvent) -> CheckoutResult<()> {
        debug!("Unhandled webhook event: {:?}", event.event_type);
        Ok(())
    }
}

/// Default webhook handler (just logs events)
pub struct LoggingWebhookHandler;

impl WebhookHandler for LoggingWebhookHandler {}

/// Dispatch a webhook event to the appropriate handler method
pub fn dispatch_webhook_event(
    handler: &dyn WebhookHandler,
    event: &WebhookEvent,
) -> CheckoutResult<()> {
    match &event.event_type {
        WebhookEventType::PaymentSucceeded => handler.on_payment_succeeded(event),
        WebhookEventType::PaymentFailed => handler.on_payment_failed(event),
        WebhookEventType::PaymentCanceled => handler.on_payment_canceled(event),
        WebhookEventType::RefundIssued => handler.on_refund_issued(event),
        WebhookEventType::Unknown(_) => handler.on_unknown_event(event),
    }
}

/// Events that should be enabled in the Stripe Dashboard
pub const REQUIRED_WEBHOOK_EVENTS: &[&str] = &[
    "payment_intent.succeeded",
    "payment_intent.payment_failed",
    "payment_intent.canceled",
    "charge.refunded",
];

// =============================================================================
// Stripe Event Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

// =============================================================================
// Signature Verification
// =============================================================================

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> CheckoutResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        CheckoutError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(CheckoutError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

/// Hex-encoded HMAC-SHA256 of `message`
pub fn compute_hmac_sha256(secret: &str, message: &str) -> CheckoutResult<String> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CheckoutError::Internal(format!("Invalid HMAC key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
