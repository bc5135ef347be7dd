//! # Stripe Configuration
//!
//! Configuration for both halves of the Stripe integration.
//! All values are loaded from environment variables (and `.env` if present).

use checkout_core::tenant::DEFAULT_TENANT_ID;
use checkout_core::{CheckoutError, CheckoutOptions, CheckoutResult, Currency};
use std::env;

/// Stripe REST API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Pinned Stripe API version
pub const STRIPE_API_VERSION: &str = "2024-12-18.acacia";

/// Storefront backend base URL when none is configured
pub const DEFAULT_CHECKOUT_API_URL: &str = "/api";

/// Browser-side checkout configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Publishable key (pk_test_... or pk_live_...). May be empty; the SDK
    /// loader reports that as a configuration error at initialization.
    pub publishable_key: String,

    /// Simulate payments without Stripe.js or the backend
    pub test_mode: bool,

    /// Base URL of the storefront backend (session-open endpoint lives below it)
    pub api_base_url: String,

    /// Restaurant id used when the storefront has not selected one
    pub restaurant_id: String,

    pub currency: Currency,
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Env vars (all optional):
    /// - `STRIPE_PUBLISHABLE_KEY`
    /// - `STRIPE_TEST_MODE`
    /// - `CHECKOUT_API_URL`
    /// - `RESTAURANT_ID`
    /// - `CHECKOUT_CURRENCY`
    pub fn from_env() -> CheckoutResult<Self> {
        dotenvy::dotenv().ok();

        let publishable_key = env::var("STRIPE_PUBLISHABLE_KEY").unwrap_or_default();
        let test_mode = env::var("STRIPE_TEST_MODE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        if !publishable_key.is_empty()
            && !publishable_key.starts_with("pk_test_")
            && !publishable_key.starts_with("pk_live_")
        {
            return Err(CheckoutError::Configuration(
                "STRIPE_PUBLISHABLE_KEY must start with pk_test_ or pk_live_".to_string(),
            ));
        }

        let currency = match env::var("CHECKOUT_CURRENCY") {
            Ok(code) => code.parse()?,
            Err(_) => Currency::USD,
        };

        Ok(Self {
            publishable_key,
            test_mode,
            api_base_url: env::var("CHECKOUT_API_URL")
                .unwrap_or_else(|_| DEFAULT_CHECKOUT_API_URL.to_string()),
            restaurant_id: env::var("RESTAURANT_ID")
                .unwrap_or_else(|_| DEFAULT_TENANT_ID.to_string()),
            currency,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(publishable_key: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            publishable_key: publishable_key.into(),
            test_mode: false,
            api_base_url: api_base_url.into(),
            restaurant_id: DEFAULT_TENANT_ID.to_string(),
            currency: Currency::USD,
        }
    }

    /// Builder: enable or disable test mode
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Builder: set the default restaurant
    pub fn with_restaurant(mut self, restaurant_id: impl Into<String>) -> Self {
        self.restaurant_id = restaurant_id.into();
        self
    }

    /// Check if using a test publishable key
    pub fn is_test_key(&self) -> bool {
        self.publishable_key.starts_with("pk_test_")
    }

    /// Options for one checkout of `amount`
    pub fn checkout_options(&self, amount: impl Into<String>) -> CheckoutOptions {
        CheckoutOptions::new(amount, self.publishable_key.clone())
            .with_currency(self.currency)
            .with_test_mode(self.test_mode)
            .with_tenant(self.restaurant_id.clone())
    }
}

/// Server-side Stripe API configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: String,

    /// Webhook signing secret (whsec_...)
    pub webhook_secret: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_SECRET_KEY`
    /// - `STRIPE_WEBHOOK_SECRET`
    pub fn from_env() -> CheckoutResult<Self> {
        dotenvy::dotenv().ok();

        let secret_key = env::var("STRIPE_SECRET_KEY").map_err(|_| {
            CheckoutError::Configuration("STRIPE_SECRET_KEY not set".to_string())
        })?;

        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").map_err(|_| {
            CheckoutError::Configuration("STRIPE_WEBHOOK_SECRET not set".to_string())
        })?;

        if !secret_key.starts_with("sk_test_") && !secret_key.starts_with("sk_live_") {
            return Err(CheckoutError::Configuration(
                "STRIPE_SECRET_KEY must start with sk_test_ or sk_live_".to_string(),
            ));
        }

        if !webhook_secret.starts_with("whsec_") {
            return Err(CheckoutError::Configuration(
                "STRIPE_WEBHOOK_SECRET must start with whsec_".to_string(),
            ));
        }

        Ok(Self::new(secret_key, webhook_secret))
    }

    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: STRIPE_API_VERSION.to_string(),
        }
    }

    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_")
    }

    pub fn is_live_mode(&self) -> bool {
        self.secret_key.starts_with("sk_live_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
