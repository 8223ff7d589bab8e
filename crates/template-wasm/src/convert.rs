//! Conversions across the JS boundary.

use serde::de::DeserializeOwned;
use serde::Serialize;
use template_core::TemplateError;
use wasm_bindgen::prelude::*;

/// Surface a core error to JS as a string.
pub fn to_js_error(error: TemplateError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Convert a serializable value to a JS object.
pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
}

/// Read a JS object into a Rust value.
pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| to_js_error(TemplateError::Validation(e.to_string())))
}

/// Copy a slice into a fixed-width array, naming the field on mismatch.
pub fn fixed<const N: usize>(bytes: &[u8], field: &str) -> Result<[u8; N], TemplateError> {
    bytes.try_into().map_err(|_| {
        TemplateError::Validation(format!("{} must be {} bytes, got {}", field, N, bytes.len()))
    })
}
