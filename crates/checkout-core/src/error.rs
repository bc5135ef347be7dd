//! # Checkout Error Types
//!
//! Typed error handling for the storefront checkout.
//! Every fallible operation returns `Result<T, CheckoutError>`.

use thiserror::Error;

/// Fallback message when the gateway or a thrown failure carries no text.
pub const GENERIC_FAILURE: &str = "Payment failed";

/// Core error type for all checkout operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Missing or malformed configuration (publishable key, secrets)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// SDK script fetch failure or backend transport/HTTP failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Backend answered without a usable secret or special-order marker
    #[error("Validation error: {0}")]
    Validation(String),

    /// Gateway rejected the submission (card declined, invalid details)
    #[error("Payment declined: {reason}")]
    PaymentDeclined { reason: String },

    /// Gateway reported a non-terminal or unrecognized status
    #[error("Payment status: {status}")]
    UnknownStatus { status: String },

    /// Unexpected failure raised while confirming
    #[error("Payment failed: {0}")]
    Unexpected(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Amount could not be parsed or is out of range
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    /// Tenant (restaurant) unknown or inactive
    #[error("Tenant not found: {tenant_id}")]
    TenantNotFound { tenant_id: String },

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// The bare message handed to the embedder's failure callback.
    ///
    /// `Display` prefixes the category for logs; this does not, so a gateway
    /// decline of `card_declined` surfaces as exactly `card_declined`.
    pub fn message(&self) -> String {
        match self {
            CheckoutError::Configuration(msg)
            | CheckoutError::NetworkError(msg)
            | CheckoutError::Validation(msg)
            | CheckoutError::Unexpected(msg)
            | CheckoutError::InvalidRequest(msg)
            | CheckoutError::WebhookVerificationFailed(msg)
            | CheckoutError::WebhookParseError(msg)
            | CheckoutError::Serialization(msg)
            | CheckoutError::Internal(msg) => msg.clone(),
            CheckoutError::PaymentDeclined { reason } => reason.clone(),
            CheckoutError::InvalidAmount { message } => message.clone(),
            CheckoutError::ProviderError { message, .. } => message.clone(),
            CheckoutError::UnknownStatus { .. } | CheckoutError::TenantNotFound { .. } => {
                self.to_string()
            }
        }
    }

    /// Returns true if the user (or embedder) may retry the attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::NetworkError(_)
                | CheckoutError::PaymentDeclined { .. }
                | CheckoutError::ProviderError { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Configuration(_) => 500,
            CheckoutError::NetworkError(_) => 503,
            CheckoutError::Validation(_) => 422,
            CheckoutError::PaymentDeclined { .. } => 402,
            CheckoutError::UnknownStatus { .. } => 402,
            CheckoutError::Unexpected(_) => 500,
            CheckoutError::InvalidRequest(_) => 400,
            CheckoutError::InvalidAmount { .. } => 400,
            CheckoutError::TenantNotFound { .. } => 404,
            CheckoutError::ProviderError { .. } => 502,
            CheckoutError::WebhookVerificationFailed(_) => 401,
            CheckoutError::WebhookParseError(_) => 400,
            CheckoutError::Serialization(_) => 500,
            CheckoutError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutError::Serialization(err.to_string())
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;
