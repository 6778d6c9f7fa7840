//! Canonical string form of context values.
//!
//! Context values travel through the filter chain as `serde_json::Value` and
//! are only flattened to text at the edges: when the mask parser receives a
//! non-string, and when a resolved placeholder is written back into the tree.

use serde_json::Value;

/// Render a value the way it is substituted into text or attribute content.
///
/// - strings are returned verbatim (no quotes)
/// - numbers use JSON number formatting (`3`, `1.5`, `-0.25`)
/// - booleans become `true` / `false`
/// - `null` becomes `null`
/// - arrays and objects are serialized as compact JSON
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use mask_core::to_display_string;
///
/// assert_eq!(to_display_string(&json!("Bob")), "Bob");
/// assert_eq!(to_display_string(&json!(42)), "42");
/// assert_eq!(to_display_string(&json!({"a": 1})), r#"{"a":1}"#);
/// ```
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
