//! # HTTP Session Backend
//!
//! Opens payment sessions by POSTing `{amount, currency, restaurant_id}` to the
//! storefront backend's `/stripe/create_intent` endpoint.

use async_trait::async_trait;
use checkout_core::{
    CheckoutError, CheckoutResult, SessionBackend, SessionRequest, SessionResponse,
};
use reqwest::Client;
use tracing::{debug, error, instrument};

/// Path of the session-open endpoint below the API base URL
pub const CREATE_INTENT_PATH: &str = "/stripe/create_intent";

/// Session backend speaking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpSessionBackend {
    client: Client,
    base_url: String,
}

impl HttpSessionBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Use a preconfigured HTTP client (timeouts, proxies)
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, CREATE_INTENT_PATH)
    }
}

#[async_trait(?Send)]
impl SessionBackend for HttpSessionBackend {
    #[instrument(skip(self, request), fields(restaurant_id = %request.restaurant_id))]
    async fn open_session(&self, request: &SessionRequest) -> CheckoutResult<SessionResponse> {
        let url = self.endpoint();
        debug!(%url, "opening payment session");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!(%status, "session backend rejected request");

            // Rejections keep the session shape; surface its messages
            if let Ok(rejected) = serde_json::from_str::<SessionResponse>(&body) {
                if !rejected.errors.is_empty() {
                    return Err(CheckoutError::NetworkError(rejected.errors.join("; ")));
                }
            }

            return Err(CheckoutError::NetworkError(format!("HTTP {}", status)));
        }

        serde_json::from_str(&body).map_err(|e| {
            CheckoutError::NetworkError(format!("Failed to parse session response: {}", e))
        })
    }
}
