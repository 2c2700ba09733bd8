//! Success classification for broker responses.

use serde_json::Value;

/// Decide whether a broker response reports a successful order.
///
/// A JSON object is a failure when any of these hold:
/// - `success` is literally `false`
/// - it has an `error` or `errors` key (whatever the value)
/// - `status` is the string `"error"`
/// - `status_code` is a number >= 400, or is present but not a number
///
/// Anything else, including non-object bodies, counts as success.
pub fn is_successful(response: &Value) -> bool {
    let Some(obj) = response.as_object() else {
        return true;
    };

    if obj.get("success") == Some(&Value::Bool(false)) {
        return false;
    }
    if obj.contains_key("error") || obj.contains_key("errors") {
        return false;
    }
    if obj.get("status").and_then(Value::as_str) == Some("error") {
        return false;
    }

    match obj.get("status_code") {
        None => true,
        Some(code) => code.as_f64().is_some_and(|c| c < 400.0),
    }
}
