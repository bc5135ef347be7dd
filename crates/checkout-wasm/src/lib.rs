//! # checkout-wasm
//!
//! Browser embedding of the storefront checkout.
//!
//! This crate provides:
//! - Stripe.js bindings and the DOM script loader
//! - `StripeCheckout`, the imperative handle a storefront page drives
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { StripeCheckout } from 'checkout-wasm';
//!
//! await init();
//!
//! const checkout = new StripeCheckout({
//!   amount: '25.00',
//!   publishableKey: 'pk_test_...',
//!   restaurantId: '4',
//!   onPaymentSuccess: (details) => showReceipt(details),
//!   onPaymentError: (error) => showError(error.message),
//! });
//!
//! await checkout.initialize();
//! payButton.onclick = () => checkout.processPayment();
//! window.addEventListener('pagehide', () => checkout.destroy());
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

pub mod bindings;
pub mod embed;
pub mod environment;

use checkout_core::{
    report_initialization, Checkout, CheckoutError, CheckoutStatus, PaymentCallbacks,
    PaymentResult,
};
use checkout_stripe::HttpSessionBackend;
use embed::{EmbedOptions, ViewState};
use environment::{page_origin, to_js, DomEnvironment};
use js_sys::{Function, Promise, Reflect};
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

pub use environment::{StripeJsClient, StripeJsElement, StripeJsSurface, STRIPE_JS_URL};

type BrowserCheckout = Checkout<DomEnvironment, HttpSessionBackend>;

fn to_js_error(err: &CheckoutError) -> JsValue {
    js_sys::Error::new(&err.message()).into()
}

fn callback(options: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(options, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}

/// The page's `onPaymentSuccess` / `onPaymentError` pair
struct JsCallbacks {
    on_success: Option<Function>,
    on_error: Option<Function>,
}

impl JsCallbacks {
    fn invoke(function: &Option<Function>, argument: &JsValue) {
        let Some(function) = function else {
            return;
        };
        if let Err(thrown) = function.call1(&JsValue::NULL, argument) {
            warn!("checkout callback threw");
            web_sys::console::error_1(&thrown);
        }
    }
}

impl PaymentCallbacks for JsCallbacks {
    fn on_payment_success(&self, details: &PaymentResult) {
        match to_js(details) {
            Ok(details) => Self::invoke(&self.on_success, &details),
            Err(err) => warn!(%err, "could not hand payment details to the page"),
        }
    }

    fn on_payment_error(&self, error: &CheckoutError) {
        Self::invoke(&self.on_error, &to_js_error(error));
    }
}

/// Checkout handle for one order on one page.
#[wasm_bindgen]
pub struct StripeCheckout {
    inner: Rc<BrowserCheckout>,
    callbacks: Rc<JsCallbacks>,
}

#[wasm_bindgen]
impl StripeCheckout {
    /// `options`: `{amount, currency?, publishableKey, testMode?, restaurantId?,
    /// apiBaseUrl?, anchor?, onPaymentSuccess?, onPaymentError?}`
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<StripeCheckout, JsValue> {
        let embed: EmbedOptions = serde_wasm_bindgen::from_value(options.clone())
            .map_err(|e| {
                JsValue::from(js_sys::Error::new(&format!("Invalid checkout options: {}", e)))
            })?;

        let origin = page_origin();
        let checkout_options = embed.checkout_options(origin.as_deref());
        let backend = HttpSessionBackend::new(embed.api_base_url(origin.as_deref()));

        Ok(Self {
            inner: Rc::new(Checkout::new(
                checkout_options,
                DomEnvironment::new(),
                backend,
            )),
            callbacks: Rc::new(JsCallbacks {
                on_success: callback(&options, "onPaymentSuccess"),
                on_error: callback(&options, "onPaymentError"),
            }),
        })
    }

    /// Load Stripe.js, open the session and mount the card surface.
    ///
    /// Resolves to `true` once ready; a failure is reported once through
    /// `onPaymentError` and resolves to `false`.
    pub fn initialize(&self) -> Promise {
        let inner = self.inner.clone();
        let callbacks = self.callbacks.clone();
        future_to_promise(async move {
            let result = inner.initialize().await;
            report_initialization(&result, callbacks.as_ref());
            Ok(JsValue::from_bool(result.is_ok()))
        })
    }

    /// Resolves to `true` iff `onPaymentSuccess` fired for this attempt.
    #[wasm_bindgen(js_name = processPayment)]
    pub fn process_payment(&self) -> Promise {
        let inner = self.inner.clone();
        let callbacks = self.callbacks.clone();
        future_to_promise(async move {
            let outcome = inner.process_payment().await;
            Ok(JsValue::from_bool(outcome.dispatch(callbacks.as_ref())))
        })
    }

    /// `{kind, message?}` describing what the page should render
    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_js(&ViewState::from(&self.inner.view())).map_err(|e| to_js_error(&e))
    }

    #[wasm_bindgen(getter, js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    #[wasm_bindgen(getter, js_name = isProcessing)]
    pub fn is_processing(&self) -> bool {
        self.inner.is_processing()
    }

    #[wasm_bindgen(getter)]
    pub fn status(&self) -> String {
        match self.inner.status() {
            CheckoutStatus::Idle => "idle",
            CheckoutStatus::Initializing => "initializing",
            CheckoutStatus::Ready(_) => "ready",
            CheckoutStatus::Processing => "processing",
            CheckoutStatus::Succeeded => "succeeded",
            CheckoutStatus::Failed => "failed",
        }
        .to_string()
    }

    /// Unmount the card surface and abandon any pending script load.
    pub fn destroy(&self) {
        self.inner.teardown();
    }
}
