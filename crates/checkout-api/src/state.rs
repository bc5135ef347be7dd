//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the intent provider, webhook verification, tenants and configuration.

use checkout_core::{
    BoxedIntentProvider, CheckoutResult, Money, Tenant, TenantRegistry,
};
use checkout_stripe::{
    CheckoutConfig, LoggingWebhookHandler, StripeConfig, StripeIntentService, WebhookHandler,
    WebhookVerifier,
};
use std::sync::Arc;

/// Stripe's minimum charge, in minor units
pub const DEFAULT_SMALL_ORDER_THRESHOLD: i64 = 50;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Orders below this many minor units skip card processing
    pub small_order_threshold: i64,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            small_order_threshold: std::env::var("SMALL_ORDER_THRESHOLD_CENTS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(DEFAULT_SMALL_ORDER_THRESHOLD),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            small_order_threshold: DEFAULT_SMALL_ORDER_THRESHOLD,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Creates PaymentIntents for normal orders
    pub intents: BoxedIntentProvider,
    /// Verifies `Stripe-Signature` headers
    pub webhooks: WebhookVerifier,
    /// Receives verified payment events
    pub webhook_handler: Arc<dyn WebhookHandler>,
    /// Restaurant tenants; empty means any restaurant id is accepted
    pub tenants: Arc<TenantRegistry>,
    /// Browser-side settings served to the storefront
    pub checkout: CheckoutConfig,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create the production state from environment variables and config files
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let stripe = StripeConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
        let webhooks = WebhookVerifier::new(&stripe.webhook_secret);
        let intents = StripeIntentService::new(stripe)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        let checkout = CheckoutConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Invalid checkout configuration: {}", e))?;

        let tenants = load_tenant_registry()?;

        Ok(Self::with_provider(
            config,
            checkout,
            Arc::new(intents),
            webhooks,
            tenants,
        ))
    }

    /// Assemble state from explicit parts (tests, embedding)
    pub fn with_provider(
        config: AppConfig,
        checkout: CheckoutConfig,
        intents: BoxedIntentProvider,
        webhooks: WebhookVerifier,
        tenants: TenantRegistry,
    ) -> Self {
        Self {
            intents,
            webhooks,
            webhook_handler: Arc::new(LoggingWebhookHandler),
            tenants: Arc::new(tenants),
            checkout,
            config,
        }
    }

    /// Builder: replace the webhook handler
    pub fn with_webhook_handler(mut self, handler: Arc<dyn WebhookHandler>) -> Self {
        self.webhook_handler = handler;
        self
    }

    /// Resolve the tenant for a session request.
    ///
    /// `Ok(None)` when no tenants are configured.
    pub fn resolve_tenant(&self, restaurant_id: &str) -> CheckoutResult<Option<&Tenant>> {
        if self.tenants.is_empty() {
            return Ok(None);
        }
        self.tenants.require(restaurant_id).map(Some)
    }

    /// Whether `amount` skips card processing without being free
    pub fn is_small_order(&self, amount: &Money) -> bool {
        amount.minor > 0 && amount.minor < self.config.small_order_threshold
    }
}

/// Load tenants from config/tenants.toml
fn load_tenant_registry() -> anyhow::Result<TenantRegistry> {
    let config_paths = [
        "config/tenants.toml",
        "../config/tenants.toml",
        "../../config/tenants.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let registry = TenantRegistry::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} tenants from {}", registry.len(), path);
            return Ok(registry);
        }
    }

    tracing::warn!("No tenant configuration found, accepting any restaurant id");
    Ok(TenantRegistry::new())
}
