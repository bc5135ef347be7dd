//! Browser tests, run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use checkout_core::SdkEnvironment;
use checkout_wasm::environment::{page_origin, DomEnvironment};
use checkout_wasm::StripeCheckout;
use js_sys::{Function, Object, Reflect};
use std::time::Duration;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn options(pairs: &[(&str, JsValue)]) -> JsValue {
    let object = Object::new();
    for (key, value) in pairs {
        Reflect::set(&object, &JsValue::from_str(key), value).unwrap();
    }
    object.into()
}

fn script_count() -> u32 {
    web_sys::window()
        .unwrap()
        .document()
        .unwrap()
        .query_selector_all("script[src='https://js.stripe.com/v3/']")
        .unwrap()
        .length()
}

#[wasm_bindgen_test]
fn test_page_origin() {
    assert!(page_origin().unwrap().starts_with("http"));
}

#[wasm_bindgen_test]
fn test_no_existing_client_without_stripe_global() {
    let env = DomEnvironment::new();
    assert!(env.existing_client("pk_test_abc").is_none());
}

#[wasm_bindgen_test]
async fn test_sleep_resolves() {
    DomEnvironment::new().sleep(Duration::from_millis(5)).await;
}

#[wasm_bindgen_test]
async fn test_destroy_removes_pending_script() {
    let before = script_count();
    let checkout = StripeCheckout::new(options(&[
        ("amount", JsValue::from_str("25.00")),
        ("publishableKey", JsValue::from_str("pk_test_abc")),
    ]))
    .unwrap();

    let init = checkout.initialize();
    DomEnvironment::new().sleep(Duration::ZERO).await;
    assert_eq!(script_count(), before + 1);

    checkout.destroy();
    assert_eq!(script_count(), before);

    JsFuture::from(init).await.unwrap();
    assert!(!checkout.is_ready());
}

#[wasm_bindgen_test]
async fn test_test_mode_checkout() {
    let checkout = StripeCheckout::new(options(&[
        ("amount", JsValue::from_str("25.00")),
        ("testMode", JsValue::TRUE),
    ]))
    .unwrap();

    let ready = JsFuture::from(checkout.initialize()).await.unwrap();
    assert_eq!(ready, JsValue::TRUE);
    assert!(checkout.is_ready());

    let view = checkout.view().unwrap();
    assert_eq!(
        Reflect::get(&view, &JsValue::from_str("kind")).unwrap(),
        JsValue::from_str("testMode")
    );

    let paid = JsFuture::from(checkout.process_payment()).await.unwrap();
    assert_eq!(paid, JsValue::TRUE);
    assert_eq!(checkout.status(), "succeeded");

    checkout.destroy();
    let skipped = JsFuture::from(checkout.process_payment()).await.unwrap();
    assert_eq!(skipped, JsValue::FALSE);
}

#[wasm_bindgen_test]
async fn test_error_callback_receives_error_object() {
    let received = Function::new_with_args("error", "globalThis.checkoutError = error;");
    let checkout = StripeCheckout::new(options(&[
        ("amount", JsValue::from_str("25.00")),
        ("publishableKey", JsValue::from_str("")),
        ("onPaymentError", received.into()),
    ]))
    .unwrap();

    let ready = JsFuture::from(checkout.initialize()).await.unwrap();
    assert_eq!(ready, JsValue::FALSE);

    let error = Reflect::get(&js_sys::global(), &JsValue::from_str("checkoutError")).unwrap();
    assert!(error.is_instance_of::<js_sys::Error>());
    assert_eq!(
        Reflect::get(&error, &JsValue::from_str("message")).unwrap(),
        JsValue::from_str("Stripe publishable key is missing")
    );
}

#[wasm_bindgen_test]
fn test_invalid_options() {
    assert!(StripeCheckout::new(JsValue::from_str("not an object")).is_err());
}
