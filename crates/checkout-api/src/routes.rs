//! # Routes
//!
//! Axum router configuration for the checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - POST /api/stripe/create_intent - Open a payment session
/// - GET  /api/stripe/config - Publishable key and mode for the storefront
/// - POST /webhook/stripe - Stripe webhook handler
/// - GET  /health - Health check
pub fn create_router(state: AppState) -> Router {
    // Storefronts are served from each tenant's own origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/stripe/create_intent", post(handlers::create_intent))
        .route("/stripe/config", get(handlers::checkout_config));

    // Webhook routes (must accept raw body)
    let webhook_routes = Router::new().route("/stripe", post(handlers::stripe_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api", api_routes)
        .nest("/webhook", webhook_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use async_trait::async_trait;
    use axum::body::Bytes;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use checkout_core::{
        CheckoutError, CheckoutResult, CreatedIntent, IntentProvider, IntentRequest,
        SessionResponse, Tenant, TenantRegistry, WebhookEvent,
    };
    use checkout_stripe::webhook::compute_hmac_sha256;
    use checkout_stripe::{CheckoutConfig, WebhookHandler, WebhookVerifier};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const WEBHOOK_SECRET: &str = "whsec_test";

    #[derive(Default)]
    struct RecordingProvider {
        requests: Mutex<Vec<IntentRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl IntentProvider for RecordingProvider {
        async fn create_intent(&self, request: &IntentRequest) -> CheckoutResult<CreatedIntent> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(CheckoutError::ProviderError {
                    provider: "stripe".into(),
                    message: "Your account cannot currently make live charges.".into(),
                });
            }
            Ok(CreatedIntent {
                id: "pi_1".into(),
                client_secret: "pi_1_secret_abc".into(),
                status: "requires_payment_method".into(),
                amount: request.amount.minor,
            })
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    #[derive(Default)]
    struct CountingHandler {
        succeeded: AtomicUsize,
    }

    impl WebhookHandler for CountingHandler {
        fn on_payment_succeeded(&self, _event: &WebhookEvent) -> CheckoutResult<()> {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn server_with(provider: Arc<RecordingProvider>, tenants: TenantRegistry) -> TestServer {
        let state = AppState::with_provider(
            AppConfig::default(),
            CheckoutConfig::new("pk_test_123", "/api").with_test_mode(true),
            provider,
            WebhookVerifier::new(WEBHOOK_SECRET),
            tenants,
        );
        TestServer::new(create_router(state)).unwrap()
    }

    fn server() -> (TestServer, Arc<RecordingProvider>) {
        let provider = Arc::new(RecordingProvider::default());
        (server_with(provider.clone(), TenantRegistry::new()), provider)
    }

    fn session_body(amount: &str) -> Value {
        json!({ "amount": amount, "currency": "USD", "restaurant_id": "4" })
    }

    #[tokio::test]
    async fn test_health() {
        let (server, _) = server();
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_config_endpoint() {
        let (server, _) = server();
        let body: Value = server.get("/api/stripe/config").await.json();
        assert_eq!(body["publishable_key"], "pk_test_123");
        assert_eq!(body["test_mode"], true);
        assert_eq!(body["currency"], "usd");
        assert_eq!(body["restaurant_id"], "4");
    }

    #[tokio::test]
    async fn test_normal_order_creates_intent() {
        let (server, provider) = server();
        let response = server
            .post("/api/stripe/create_intent")
            .add_header(
                HeaderName::from_static("idempotency-key"),
                HeaderValue::from_static("cart_42"),
            )
            .json(&session_body("25.00"))
            .await;

        response.assert_status_ok();
        let body: SessionResponse = response.json();
        assert!(body.success);
        assert_eq!(body.client_secret.as_deref(), Some("pi_1_secret_abc"));
        assert_eq!(body.status.as_deref(), Some("requires_payment_method"));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount.minor, 2500);
        assert_eq!(requests[0].tenant_id, "4");
        assert_eq!(requests[0].idempotency_key, "cart_42");
    }

    #[tokio::test]
    async fn test_free_order() {
        let (server, provider) = server();
        let body: SessionResponse = server
            .post("/api/stripe/create_intent")
            .json(&session_body("0.00"))
            .await
            .json();

        assert_eq!(body.free_order, Some(true));
        assert!(body.order_id.unwrap().starts_with("free_"));
        assert!(body.client_secret.is_none());
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_small_order() {
        let (server, provider) = server();
        let body: SessionResponse = server
            .post("/api/stripe/create_intent")
            .json(&session_body("0.30"))
            .await
            .json();

        assert_eq!(body.small_order, Some(true));
        assert!(body.order_id.unwrap().starts_with("small_"));
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_amount() {
        let (server, _) = server();
        let response = server
            .post("/api/stripe/create_intent")
            .json(&session_body("twelve"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: SessionResponse = response.json();
        assert!(!body.success);
        assert_eq!(body.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tenant() {
        let provider = Arc::new(RecordingProvider::default());
        let tenants = TenantRegistry::new()
            .with_tenant(Tenant::new("4", "Corner Bistro", "https://bistro.test"));
        let server = server_with(provider.clone(), tenants);

        let response = server
            .post("/api/stripe/create_intent")
            .json(&json!({ "amount": "25.00", "currency": "USD", "restaurant_id": "9" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tenant_settings_reach_intent() {
        let provider = Arc::new(RecordingProvider::default());
        let tenants = TenantRegistry::new().with_tenant(
            Tenant::new("4", "Corner Bistro", "https://bistro.test")
                .with_statement_descriptor("BISTRO")
                .with_metadata("location", "downtown"),
        );
        let server = server_with(provider.clone(), tenants);

        server
            .post("/api/stripe/create_intent")
            .json(&session_body("25.00"))
            .await
            .assert_status_ok();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].statement_descriptor_suffix.as_deref(), Some("BISTRO"));
        assert_eq!(
            requests[0].metadata.get("location").map(String::as_str),
            Some("downtown")
        );
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let provider = Arc::new(RecordingProvider {
            fail: true,
            ..Default::default()
        });
        let server = server_with(provider, TenantRegistry::new());

        let response = server
            .post("/api/stripe/create_intent")
            .json(&session_body("25.00"))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: SessionResponse = response.json();
        assert_eq!(
            body.errors,
            vec!["Your account cannot currently make live charges.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_webhook_requires_valid_signature() {
        let handler = Arc::new(CountingHandler::default());
        let state = AppState::with_provider(
            AppConfig::default(),
            CheckoutConfig::new("pk_test_123", "/api"),
            Arc::new(RecordingProvider::default()),
            WebhookVerifier::new(WEBHOOK_SECRET),
            TenantRegistry::new(),
        )
        .with_webhook_handler(handler.clone());
        let server = TestServer::new(create_router(state)).unwrap();

        let payload = serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "created": chrono::Utc::now().timestamp(),
            "data": { "object": { "id": "pi_1", "amount": 2500, "currency": "usd" } }
        }))
        .unwrap();

        let missing = server
            .post("/webhook/stripe")
            .bytes(Bytes::from(payload.clone()))
            .await;
        missing.assert_status(StatusCode::BAD_REQUEST);

        let forged = server
            .post("/webhook/stripe")
            .add_header(
                HeaderName::from_static("stripe-signature"),
                HeaderValue::from_static("t=1,v1=deadbeef"),
            )
            .bytes(Bytes::from(payload.clone()))
            .await;
        forged.assert_status(StatusCode::UNAUTHORIZED);

        let timestamp = chrono::Utc::now().timestamp();
        let signed = format!("{}.{}", timestamp, String::from_utf8_lossy(&payload));
        let header = format!(
            "t={},v1={}",
            timestamp,
            compute_hmac_sha256(WEBHOOK_SECRET, &signed).unwrap()
        );
        let accepted = server
            .post("/webhook/stripe")
            .add_header(
                HeaderName::from_static("stripe-signature"),
                HeaderValue::from_str(&header).unwrap(),
            )
            .bytes(Bytes::from(payload))
            .await;
        accepted.assert_status_ok();
        assert_eq!(handler.succeeded.load(Ordering::SeqCst), 1);
    }
}
