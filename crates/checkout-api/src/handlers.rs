//! # Request Handlers
//!
//! Axum request handlers for the checkout API.
//! The session-open endpoint classifies each order as free, small or normal
//! and only creates a PaymentIntent for normal orders.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use checkout_core::{CheckoutError, Currency, IntentRequest, Money, SessionRequest, SessionResponse};
use checkout_stripe::dispatch_webhook_event;
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

// =============================================================================
// Response Types
// =============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Public checkout settings for the storefront
#[derive(Debug, Serialize)]
pub struct CheckoutConfigResponse {
    pub publishable_key: String,
    pub test_mode: bool,
    pub currency: Currency,
    pub restaurant_id: String,
}

type SessionRejection = (StatusCode, Json<SessionResponse>);

fn status_for(err: &CheckoutError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Session-open failures keep the session shape so the browser can read `errors`
fn session_rejection(err: CheckoutError) -> SessionRejection {
    (status_for(&err), Json(SessionResponse::failure(vec![err.message()])))
}

fn error_to_response(err: CheckoutError) -> (StatusCode, Json<ErrorResponse>) {
    let response = ErrorResponse::new(err.to_string(), err.status_code());
    (status_for(&err), Json(response))
}

fn special_order_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Publishable key and mode for the storefront bundle
pub async fn checkout_config(State(state): State<AppState>) -> Json<CheckoutConfigResponse> {
    Json(CheckoutConfigResponse {
        publishable_key: state.checkout.publishable_key.clone(),
        test_mode: state.checkout.test_mode,
        currency: state.checkout.currency,
        restaurant_id: state.checkout.restaurant_id.clone(),
    })
}

/// Open a payment session for the browser
#[instrument(skip(state, headers, request), fields(restaurant_id = %request.restaurant_id))]
pub async fn create_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, SessionRejection> {
    let currency: Currency = request.currency.parse().map_err(session_rejection)?;
    let amount = Money::parse(&request.amount, currency).map_err(session_rejection)?;
    let tenant = state
        .resolve_tenant(&request.restaurant_id)
        .map_err(session_rejection)?;

    if amount.is_zero() {
        let order_id = special_order_id("free");
        info!(%order_id, "Free order, no payment required");
        return Ok(Json(SessionResponse::free(order_id)));
    }

    if state.is_small_order(&amount) {
        let order_id = special_order_id("small");
        info!(%order_id, amount = %amount.display(), "Small order, processed without card");
        return Ok(Json(SessionResponse::small(order_id)));
    }

    let idempotency_key = headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut intent_request = IntentRequest::new(amount, &request.restaurant_id, idempotency_key)
        .with_statement_descriptor(tenant.and_then(|t| t.statement_descriptor_suffix.clone()));
    if let Some(tenant) = tenant {
        for (key, value) in &tenant.metadata {
            intent_request = intent_request.with_metadata(key, value);
        }
    }

    info!(amount = %amount.display(), "Creating payment intent");

    let intent = state
        .intents
        .create_intent(&intent_request)
        .await
        .map_err(|e| {
            error!("Failed to create payment intent: {}", e);
            session_rejection(e)
        })?;

    info!(intent_id = %intent.id, "Created payment intent");

    Ok(Json(SessionResponse {
        success: true,
        client_secret: Some(intent.client_secret),
        status: Some(intent.status),
        ..Default::default()
    }))
}

/// Handle Stripe webhook
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing Stripe-Signature header", 400)),
            )
        })?;

    let event = state.webhooks.verify(&body, signature).map_err(|e| {
        error!("Webhook verification failed: {}", e);
        error_to_response(e)
    })?;

    info!(
        "Received webhook: type={:?}, id={}, restaurant={:?}",
        event.event_type, event.event_id, event.restaurant_id
    );

    dispatch_webhook_event(state.webhook_handler.as_ref(), &event).map_err(|e| {
        error!("Webhook handler error: {}", e);
        error_to_response(e)
    })?;

    Ok(StatusCode::OK)
}
