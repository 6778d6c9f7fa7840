//! WASM bindings for mask-core.
//!
//! The browser-side adapters (custom element, React, Vue, WeChat components)
//! all need the same two things: pull the display segment out of a token, and
//! occasionally render a `{{ }}` template against page data. This crate
//! exposes those as `#[wasm_bindgen]` functions so every adapter links one
//! implementation.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p mask-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/mask_wasm.wasm
//! ```

mod number;

use mask_core::{Context, MaskToken, SensitiveKind, TemplateEngine};
use wasm_bindgen::prelude::*;

pub use number::js_number_to_string;

/// Display segment of any JS value. Never throws.
///
/// Strings are unmasked. Numbers, booleans, `null` and `undefined` become
/// their JS string form; objects and arrays their compact JSON. Values JSON
/// cannot represent (symbols, functions, bigints) yield `""`.
#[wasm_bindgen(js_name = parseMaskData)]
pub fn parse_mask_data(value: JsValue) -> String {
    if let Some(s) = value.as_string() {
        return mask_core::extract_str(&s).to_string();
    }
    if let Some(f) = value.as_f64() {
        return js_number_to_string(f);
    }
    if let Some(b) = value.as_bool() {
        return b.to_string();
    }
    if value.is_null() {
        return "null".to_string();
    }
    if value.is_undefined() {
        return "undefined".to_string();
    }
    js_sys::JSON::stringify(&value)
        .ok()
        .and_then(|json| json.as_string())
        .unwrap_or_default()
}

/// Display segment of a string token, or the string itself.
#[wasm_bindgen]
pub fn extract(value: &str) -> String {
    mask_core::extract_str(value).to_string()
}

/// Render `{{ }}` placeholders in `template` against a JSON context object.
///
/// Throws a JS error if `context_json` is not a JSON object.
#[wasm_bindgen]
pub fn render(template: &str, context_json: &str) -> Result<String, JsValue> {
    let context = Context::from_json(context_json).map_err(to_js_error)?;
    Ok(TemplateEngine::new(context).render(template))
}

/// Apply a desensitize rule (`mobile`, `email`, `bank_card`, ...) to `source`.
#[wasm_bindgen]
pub fn desensitize(kind: &str, source: &str) -> Result<String, JsValue> {
    let kind: SensitiveKind = kind.parse().map_err(to_js_error)?;
    mask_core::desensitize(kind, source).map_err(to_js_error)
}

/// Assemble a token from already-encoded segments.
#[wasm_bindgen]
pub fn compose(
    algorithm: &str,
    nonce: &str,
    encrypt: &str,
    mac: &str,
    display: &str,
) -> Result<String, JsValue> {
    MaskToken::compose(algorithm, nonce, encrypt, mac, display).map_err(to_js_error)
}

fn to_js_error(e: mask_core::MaskError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
