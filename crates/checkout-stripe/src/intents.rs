//! # Stripe PaymentIntents
//!
//! Server-side creation of PaymentIntents for normal (card) orders. The
//! returned client secret is what the browser mounts the Payment Element with.

use crate::config::StripeConfig;
use async_trait::async_trait;
use checkout_core::{CheckoutError, CheckoutResult, CreatedIntent, IntentProvider, IntentRequest};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Stripe PaymentIntents API client
pub struct StripeIntentService {
    config: StripeConfig,
    client: Client,
}

impl StripeIntentService {
    pub fn new(config: StripeConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                CheckoutError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    fn form_params(request: &IntentRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("amount".to_string(), request.amount.minor.to_string()),
            (
                "currency".to_string(),
                request.amount.currency.as_str().to_string(),
            ),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
            (
                "metadata[restaurant_id]".to_string(),
                request.tenant_id.clone(),
            ),
        ];

        if let Some(ref suffix) = request.statement_descriptor_suffix {
            params.push(("statement_descriptor_suffix".to_string(), suffix.clone()));
        }

        for (key, value) in &request.metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        params
    }
}

#[async_trait]
impl IntentProvider for StripeIntentService {
    #[instrument(skip(self, request), fields(restaurant_id = %request.tenant_id, amount = request.amount.minor))]
    async fn create_intent(&self, request: &IntentRequest) -> CheckoutResult<CreatedIntent> {
        if request.amount.minor <= 0 {
            return Err(CheckoutError::InvalidAmount {
                message: "PaymentIntents require a positive amount".to_string(),
            });
        }

        let url = format!("{}/v1/payment_intents", self.config.api_base_url);
        debug!("Creating Stripe PaymentIntent");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&Self::form_params(request))
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(CheckoutError::ProviderError {
                    provider: self.provider_name().to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(CheckoutError::ProviderError {
                provider: self.provider_name().to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let intent: StripePaymentIntent = serde_json::from_str(&body).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            CheckoutError::ProviderError {
                provider: self.provider_name().to_string(),
                message: "PaymentIntent has no client secret".to_string(),
            }
        })?;

        info!(intent_id = %intent.id, status = %intent.status, "Created Stripe PaymentIntent");

        Ok(CreatedIntent {
            id: intent.id,
            client_secret,
            status: intent.status,
            amount: intent.amount,
        })
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    status: String,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_core::{Currency, Money};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> StripeIntentService {
        let config =
            StripeConfig::new("sk_test_abc", "whsec_test").with_api_base_url(server.uri());
        StripeIntentService::new(config).unwrap()
    }

    fn intent_request(minor: i64) -> IntentRequest {
        IntentRequest::new(Money::from_minor(minor, Currency::USD), "4", "idem_1")
            .with_statement_descriptor(Some("BISTRO".into()))
    }

    #[test]
    fn test_form_params() {
        let request = intent_request(2500).with_metadata("channel", "web");
        let params = StripeIntentService::form_params(&request);

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("amount"), Some("2500"));
        assert_eq!(get("currency"), Some("usd"));
        assert_eq!(get("automatic_payment_methods[enabled]"), Some("true"));
        assert_eq!(get("metadata[restaurant_id]"), Some("4"));
        assert_eq!(get("metadata[channel]"), Some("web"));
        assert_eq!(get("statement_descriptor_suffix"), Some("BISTRO"));
    }

    #[tokio::test]
    async fn test_create_intent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("Authorization", "Bearer sk_test_abc"))
            .and(header("Idempotency-Key", "idem_1"))
            .and(body_string_contains("amount=2500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_1",
                "object": "payment_intent",
                "client_secret": "pi_1_secret_abc",
                "status": "requires_payment_method",
                "amount": 2500
            })))
            .expect(1)
            .mount(&server)
            .await;

        let intent = service(&server)
            .create_intent(&intent_request(2500))
            .await
            .unwrap();

        assert_eq!(intent.id, "pi_1");
        assert_eq!(intent.client_secret, "pi_1_secret_abc");
        assert_eq!(intent.status, "requires_payment_method");
        assert_eq!(intent.amount, 2500);
    }

    #[tokio::test]
    async fn test_stripe_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Amount must be at least $0.50 usd", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let err = service(&server)
            .create_intent(&intent_request(2500))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CheckoutError::ProviderError {
                provider: "stripe".into(),
                message: "Amount must be at least $0.50 usd".into()
            }
        );
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected_locally() {
        let server = MockServer::start().await;
        let err = service(&server)
            .create_intent(&intent_request(0))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidAmount { .. }));
    }
}
