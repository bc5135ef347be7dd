//! # Embed Options
//!
//! The plain-object options a storefront page passes to `new StripeCheckout(...)`
//! and the view state handed back to it.

use checkout_core::tenant::{return_url_for, CONFIRMATION_PATH, DEFAULT_TENANT_ID};
use checkout_core::{CheckoutOptions, CheckoutView, Currency};
use checkout_stripe::config::DEFAULT_CHECKOUT_API_URL;
use serde::{Deserialize, Serialize};

/// Order total as the page supplies it: `"25.00"` or `25`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(f64),
}

impl AmountInput {
    pub fn to_decimal_string(&self) -> String {
        match self {
            AmountInput::Text(text) => text.trim().to_string(),
            AmountInput::Number(value) => value.to_string(),
        }
    }
}

/// Constructor options of the `StripeCheckout` JS class
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedOptions {
    pub amount: AmountInput,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub publishable_key: String,
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default)]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub anchor: Option<String>,
}

impl EmbedOptions {
    /// Executor options; the return URL is absolute when the page origin is known.
    pub fn checkout_options(&self, origin: Option<&str>) -> CheckoutOptions {
        let mut options =
            CheckoutOptions::new(self.amount.to_decimal_string(), self.publishable_key.trim())
                .with_test_mode(self.test_mode)
                .with_tenant(
                    self.restaurant_id
                        .as_deref()
                        .unwrap_or(DEFAULT_TENANT_ID),
                );

        match self.currency.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => match code.parse::<Currency>() {
                Ok(currency) => options = options.with_currency(currency),
                Err(_) => options = options.with_currency_code(code),
            },
            _ => {}
        }
        if let Some(anchor) = &self.anchor {
            options = options.with_anchor(anchor);
        }
        if let Some(origin) = origin {
            options = options.with_return_url(return_url_for(origin, CONFIRMATION_PATH));
        }
        options
    }

    /// Base URL of the storefront backend, made absolute against the page origin
    pub fn api_base_url(&self, origin: Option<&str>) -> String {
        let base = self
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_CHECKOUT_API_URL);
        match origin {
            Some(origin) if base.starts_with('/') => return_url_for(origin, base),
            _ => base.to_string(),
        }
    }
}

/// What the page should render, as returned by `view()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&CheckoutView> for ViewState {
    fn from(view: &CheckoutView) -> Self {
        let (kind, message) = match view {
            CheckoutView::Loading => ("loading", None),
            CheckoutView::Error(message) => ("error", Some(message.clone())),
            CheckoutView::FreeOrder => ("freeOrder", None),
            CheckoutView::SmallOrder => ("smallOrder", None),
            CheckoutView::TestMode => ("testMode", None),
            CheckoutView::PreparingSurface => ("preparingSurface", None),
            CheckoutView::CardEntry => ("cardEntry", None),
        };
        Self { kind, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> EmbedOptions {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_minimal_options() {
        let embed = parse(json!({ "amount": "25.00", "publishableKey": "pk_test_abc" }));
        let options = embed.checkout_options(None);

        assert_eq!(options.amount, "25.00");
        assert_eq!(options.publishable_key, "pk_test_abc");
        assert_eq!(options.currency, "USD");
        assert_eq!(options.tenant_id, "4");
        assert_eq!(options.return_url, CONFIRMATION_PATH);
        assert!(!options.test_mode);
    }

    #[test]
    fn test_full_options() {
        let embed = parse(json!({
            "amount": 12.5,
            "currency": "eur",
            "publishableKey": " pk_live_xyz ",
            "testMode": true,
            "restaurantId": "7",
            "anchor": "#card"
        }));
        let options = embed.checkout_options(Some("https://noodles.test/"));

        assert_eq!(options.amount, "12.5");
        assert_eq!(options.currency, "EUR");
        assert_eq!(options.publishable_key, "pk_live_xyz");
        assert_eq!(options.tenant_id, "7");
        assert_eq!(options.anchor, "#card");
        assert_eq!(options.return_url, "https://noodles.test/order-confirmation");
        assert!(options.test_mode);
    }

    #[test]
    fn test_missing_key_is_deferred() {
        let embed = parse(json!({ "amount": "9.99" }));
        assert!(embed.checkout_options(None).publishable_key.is_empty());
    }

    #[test]
    fn test_unlisted_currency_passes_through() {
        let embed = parse(json!({ "amount": "9.99", "currency": " nzd " }));
        assert_eq!(embed.checkout_options(None).currency, "nzd");

        let embed = parse(json!({ "amount": "9.99", "currency": "" }));
        assert_eq!(embed.checkout_options(None).currency, "USD");
    }

    #[test]
    fn test_api_base_url() {
        let embed = parse(json!({ "amount": "1.00" }));
        assert_eq!(embed.api_base_url(None), "/api");
        assert_eq!(
            embed.api_base_url(Some("https://bistro.test")),
            "https://bistro.test/api"
        );

        let embed = parse(json!({ "amount": "1.00", "apiBaseUrl": "https://api.test/v2" }));
        assert_eq!(
            embed.api_base_url(Some("https://bistro.test")),
            "https://api.test/v2"
        );
    }

    #[test]
    fn test_view_state() {
        let state = ViewState::from(&CheckoutView::Error("card_declined".into()));
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({ "kind": "error", "message": "card_declined" })
        );
        assert_eq!(
            serde_json::to_value(ViewState::from(&CheckoutView::FreeOrder)).unwrap(),
            json!({ "kind": "freeOrder" })
        );
    }
}
