//! # Stripe.js Bindings
//!
//! Raw wasm-bindgen handles for the parts of Stripe.js v3 the checkout uses.
//! Every call that can throw is imported with `catch`.

use js_sys::Promise;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// `Stripe(publishableKey)` instance
    #[derive(Debug, Clone)]
    pub type JsStripe;

    /// `stripe.elements(...)` group
    #[derive(Debug, Clone)]
    pub type JsElements;

    /// `elements.create("payment", ...)` component
    #[derive(Debug, Clone)]
    pub type JsPaymentElement;

    #[wasm_bindgen(catch, js_name = Stripe)]
    pub fn new_stripe(publishable_key: &str) -> Result<JsStripe, JsValue>;

    #[wasm_bindgen(method, catch)]
    pub fn elements(this: &JsStripe, options: &JsValue) -> Result<JsElements, JsValue>;

    #[wasm_bindgen(method, catch, js_name = create)]
    pub fn create_element(
        this: &JsElements,
        element_type: &str,
        options: &JsValue,
    ) -> Result<JsPaymentElement, JsValue>;

    #[wasm_bindgen(method, catch)]
    pub fn mount(this: &JsPaymentElement, selector: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    pub fn unmount(this: &JsPaymentElement) -> Result<(), JsValue>;

    /// `stripe.confirmPayment({ elements, confirmParams, redirect })`
    #[wasm_bindgen(method, catch, js_name = confirmPayment)]
    pub fn confirm_payment(this: &JsStripe, options: &JsValue) -> Result<Promise, JsValue>;
}

/// Best-effort message out of a thrown value or rejected promise
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_default()
}
