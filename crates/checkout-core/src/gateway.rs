//! # Gateway Capabilities
//!
//! Narrow interfaces the checkout orchestrator depends on, so the card
//! processor, the page environment and the backend can each be swapped for a
//! fake in tests or for a different provider at runtime.
//!
//! ```text
//! ┌───────────────────────┐   loads    ┌────────────────────┐
//! │ SdkEnvironment        │──────────▶│ PaymentClient      │
//! │  ├── existing_client()│            │  ├── create_surface│
//! │  ├── load_client()    │            │  └── confirm()     │
//! │  ├── cancel_pending() │            └─────────┬──────────┘
//! │  └── sleep()          │                      │ builds
//! └───────────────────────┘            ┌─────────▼──────────┐   mounts   ┌───────────────┐
//!                                      │ PaymentSurface     │──────────▶│ MountedElement│
//! ┌───────────────────────┐            └────────────────────┘            └───────────────┘
//! │ SessionBackend        │
//! │  └── open_session()   │
//! └───────────────────────┘
//! ```
//!
//! The model is single-threaded and cooperative, so none of these traits
//! require `Send`.

use crate::error::CheckoutResult;
use crate::session::{SessionRequest, SessionResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default DOM anchor the card surface mounts into
pub const DEFAULT_ANCHOR: &str = "#payment-element";

/// Payment methods offered by the card surface: card plus digital wallets
pub const DEFAULT_PAYMENT_METHOD_TYPES: &[&str] = &["card", "apple_pay", "google_pay", "cashapp"];

/// Acquires the card processor's client library for the hosting page.
#[async_trait(?Send)]
pub trait SdkEnvironment {
    type Client: PaymentClient;

    /// A client already present in the host (e.g. injected globally).
    fn existing_client(&self, publishable_key: &str) -> Option<Self::Client>;

    /// Fetch the library and construct a client. Called at most once per instance.
    async fn load_client(&self, publishable_key: &str) -> CheckoutResult<Self::Client>;

    /// Release a load that has not completed yet (e.g. remove the script tag).
    fn cancel_pending_load(&self);

    /// Cooperative delay used by simulated completions.
    async fn sleep(&self, duration: Duration);
}

/// An initialized card-processor client.
#[async_trait(?Send)]
pub trait PaymentClient {
    type Surface: PaymentSurface;

    /// Construct the card-entry surface bound to a session secret.
    fn create_surface(&self, options: &SurfaceOptions) -> CheckoutResult<Self::Surface>;

    /// Create the payment method from the surface and confirm the charge.
    async fn confirm(
        &self,
        surface: &Self::Surface,
        params: &ConfirmParams,
    ) -> CheckoutResult<ConfirmOutcome>;
}

/// A constructed (not yet mounted) card-entry surface.
pub trait PaymentSurface {
    type Element: MountedElement;

    /// Mount the payment element into exactly one anchor.
    fn mount(&self, anchor: &str, options: &ElementOptions) -> CheckoutResult<Self::Element>;
}

/// A payment element attached to the page.
pub trait MountedElement {
    fn unmount(&mut self) -> CheckoutResult<()>;
}

/// Opens payment sessions with the storefront backend.
#[async_trait(?Send)]
pub trait SessionBackend {
    async fn open_session(&self, request: &SessionRequest) -> CheckoutResult<SessionResponse>;
}

pub type ClientOf<E> = <E as SdkEnvironment>::Client;
pub type SurfaceOf<E> = <ClientOf<E> as PaymentClient>::Surface;
pub type ElementOf<E> = <SurfaceOf<E> as PaymentSurface>::Element;

// =============================================================================
// Surface options
// =============================================================================

/// Visual theme of the card surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub theme: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            theme: "stripe".to_string(),
            variables: BTreeMap::from([("colorPrimary".to_string(), "#E87230".to_string())]),
        }
    }
}

/// When the payment method is created relative to confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodCreation {
    /// Created and confirmed together at submission
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingAddressCollection {
    Never,
    Auto,
}

/// Options for constructing the card surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceOptions {
    pub client_secret: String,
    pub appearance: Appearance,
    pub payment_method_creation: PaymentMethodCreation,
    pub billing_address_collection: BillingAddressCollection,
}

impl SurfaceOptions {
    pub fn new(client_secret: impl Into<String>, appearance: Appearance) -> Self {
        Self {
            client_secret: client_secret.into(),
            appearance,
            payment_method_creation: PaymentMethodCreation::Manual,
            billing_address_collection: BillingAddressCollection::Never,
        }
    }
}

/// Blank billing details prefilled into the element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BillingDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultValues {
    pub billing_details: BillingDetails,
}

/// Options for the mounted payment element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementOptions {
    /// Allow-list of payment method types
    pub payment_method_types: Vec<String>,
    #[serde(rename = "defaultValues")]
    pub default_values: DefaultValues,
}

impl Default for ElementOptions {
    fn default() -> Self {
        Self {
            payment_method_types: DEFAULT_PAYMENT_METHOD_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_values: DefaultValues::default(),
        }
    }
}

// =============================================================================
// Confirmation
// =============================================================================

/// Redirect behaviour requested from the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectPolicy {
    /// Only redirect when the payment method requires it (e.g. 3DS)
    IfRequired,
    Always,
}

/// Parameters for the confirmation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmParams {
    pub return_url: String,
    pub redirect: RedirectPolicy,
}

impl ConfirmParams {
    pub fn new(return_url: impl Into<String>) -> Self {
        Self {
            return_url: return_url.into(),
            redirect: RedirectPolicy::IfRequired,
        }
    }
}

/// Error reported by the gateway for a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GatewayError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

/// Summary of the charge the gateway reports back
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IntentSummary {
    pub id: String,
    pub status: String,
    /// Minor currency units
    pub amount: i64,
}

/// What a confirmation call resolved with
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfirmOutcome {
    #[serde(default)]
    pub error: Option<GatewayError>,
    #[serde(default, rename = "paymentIntent")]
    pub payment_intent: Option<IntentSummary>,
}

impl ConfirmOutcome {
    pub fn declined(message: impl Into<String>) -> Self {
        Self {
            error: Some(GatewayError {
                message: Some(message.into()),
                ..Default::default()
            }),
            payment_intent: None,
        }
    }

    pub fn intent(id: impl Into<String>, status: impl Into<String>, amount: i64) -> Self {
        Self {
            error: None,
            payment_intent: Some(IntentSummary {
                id: id.into(),
                status: status.into(),
                amount,
            }),
        }
    }
}
