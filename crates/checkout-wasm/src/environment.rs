//! # DOM Environment
//!
//! Browser implementations of the checkout capability traits: the Stripe.js
//! script loader, the Stripe client, the Elements group and the mounted
//! payment element.

use crate::bindings::{js_error_message, new_stripe, JsElements, JsPaymentElement, JsStripe};
use async_trait::async_trait;
use checkout_core::{
    CheckoutError, CheckoutResult, ConfirmOutcome, ConfirmParams, ElementOptions, MountedElement,
    PaymentClient, PaymentSurface, SdkEnvironment, SurfaceOptions, GENERIC_FAILURE,
};
use js_sys::{Function, Object, Promise, Reflect};
use serde::Serialize;
use std::cell::RefCell;
use std::time::Duration;
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlScriptElement;

/// Where Stripe.js v3 is served from
pub const STRIPE_JS_URL: &str = "https://js.stripe.com/v3/";

const LOAD_FAILED: &str = "Failed to load Stripe.js";

/// Serialize into plain JS objects (maps become objects, not `Map`s)
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> CheckoutResult<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| CheckoutError::Serialization(e.to_string()))
}

fn set(target: &Object, key: &str, value: &JsValue) -> CheckoutResult<()> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| CheckoutError::Internal(js_error_message(&e)))
}

/// `window.location.origin` of the hosting page
pub fn page_origin() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}

struct PendingScript {
    script: HtmlScriptElement,
    reject: Function,
}

/// Loads Stripe.js into the current document.
#[derive(Default)]
pub struct DomEnvironment {
    pending: RefCell<Option<PendingScript>>,
}

impl DomEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an injected script tag has neither loaded nor failed
    pub fn has_pending_load(&self) -> bool {
        self.pending.borrow().is_some()
    }

    fn inject_script(&self) -> CheckoutResult<Promise> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| CheckoutError::Configuration("No document available".to_string()))?;
        let head = document
            .head()
            .ok_or_else(|| CheckoutError::Configuration("Document has no <head>".to_string()))?;

        let script: HtmlScriptElement = document
            .create_element("script")
            .map_err(|e| CheckoutError::Internal(js_error_message(&e)))?
            .dyn_into()
            .map_err(|_| CheckoutError::Internal("created element is not a <script>".to_string()))?;
        script.set_src(STRIPE_JS_URL);
        script.set_async(true);

        let mut reject_slot = None;
        let loaded = Promise::new(&mut |resolve, reject| {
            script.set_onload(Some(&resolve));
            script.set_onerror(Some(&reject));
            reject_slot = Some(reject);
        });
        let reject = reject_slot
            .ok_or_else(|| CheckoutError::Internal("promise executor did not run".to_string()))?;

        head.append_child(&script)
            .map_err(|e| CheckoutError::Internal(js_error_message(&e)))?;
        *self.pending.borrow_mut() = Some(PendingScript { script, reject });
        Ok(loaded)
    }
}

#[async_trait(?Send)]
impl SdkEnvironment for DomEnvironment {
    type Client = StripeJsClient;

    fn existing_client(&self, publishable_key: &str) -> Option<StripeJsClient> {
        let window = web_sys::window()?;
        let constructor = Reflect::get(&window, &JsValue::from_str("Stripe")).ok()?;
        if !constructor.is_function() {
            return None;
        }
        new_stripe(publishable_key).ok().map(StripeJsClient::new)
    }

    async fn load_client(&self, publishable_key: &str) -> CheckoutResult<StripeJsClient> {
        let loaded = self.inject_script()?;
        debug!(src = STRIPE_JS_URL, "injected Stripe.js");

        let result = JsFuture::from(loaded).await;
        if let Some(pending) = self.pending.borrow_mut().take() {
            pending.script.set_onload(None);
            pending.script.set_onerror(None);
        }
        result.map_err(|_| CheckoutError::NetworkError(LOAD_FAILED.to_string()))?;

        new_stripe(publishable_key)
            .map(StripeJsClient::new)
            .map_err(|e| CheckoutError::Configuration(js_error_message(&e)))
    }

    fn cancel_pending_load(&self) {
        let Some(pending) = self.pending.borrow_mut().take() else {
            return;
        };
        pending.script.remove();
        if pending.reject.call0(&JsValue::NULL).is_err() {
            warn!("could not settle cancelled Stripe.js load");
        }
        debug!("removed pending Stripe.js script");
    }

    async fn sleep(&self, duration: Duration) {
        let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
        let timer = Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().is_some_and(|window| {
                window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                    .is_ok()
            });
            if !scheduled {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = JsFuture::from(timer).await;
    }
}

/// A `Stripe(publishableKey)` instance
pub struct StripeJsClient {
    stripe: JsStripe,
}

impl StripeJsClient {
    pub fn new(stripe: JsStripe) -> Self {
        Self { stripe }
    }
}

#[async_trait(?Send)]
impl PaymentClient for StripeJsClient {
    type Surface = StripeJsSurface;

    fn create_surface(&self, options: &SurfaceOptions) -> CheckoutResult<StripeJsSurface> {
        let options = to_js(options)?;
        self.stripe
            .elements(&options)
            .map(|elements| StripeJsSurface { elements })
            .map_err(|e| CheckoutError::Configuration(js_error_message(&e)))
    }

    async fn confirm(
        &self,
        surface: &StripeJsSurface,
        params: &ConfirmParams,
    ) -> CheckoutResult<ConfirmOutcome> {
        let request = Object::new();
        set(&request, "elements", &surface.elements)?;
        set(
            &request,
            "confirmParams",
            &to_js(&serde_json::json!({ "return_url": params.return_url }))?,
        )?;
        set(&request, "redirect", &to_js(&params.redirect)?)?;

        let promise = self
            .stripe
            .confirm_payment(&request)
            .map_err(|e| CheckoutError::Unexpected(js_error_message(&e)))?;
        let resolved = JsFuture::from(promise)
            .await
            .map_err(|e| CheckoutError::Unexpected(js_error_message(&e)))?;

        serde_wasm_bindgen::from_value(resolved).map_err(|e| {
            warn!(error = %e, "unreadable confirmPayment result");
            CheckoutError::Unexpected(GENERIC_FAILURE.to_string())
        })
    }
}

/// A `stripe.elements(...)` group bound to one client secret
pub struct StripeJsSurface {
    elements: JsElements,
}

impl PaymentSurface for StripeJsSurface {
    type Element = StripeJsElement;

    fn mount(&self, anchor: &str, options: &ElementOptions) -> CheckoutResult<StripeJsElement> {
        let options = to_js(options)?;
        let element = self
            .elements
            .create_element("payment", &options)
            .map_err(|e| CheckoutError::Configuration(js_error_message(&e)))?;
        element
            .mount(anchor)
            .map_err(|e| CheckoutError::Configuration(js_error_message(&e)))?;
        Ok(StripeJsElement { element })
    }
}

/// The payment element attached to the page
pub struct StripeJsElement {
    element: JsPaymentElement,
}

impl MountedElement for StripeJsElement {
    fn unmount(&mut self) -> CheckoutResult<()> {
        self.element
            .unmount()
            .map_err(|e| CheckoutError::Internal(js_error_message(&e)))
    }
}
