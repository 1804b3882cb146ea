//! Pre-send cleanup of partial-update payloads.
//!
//! A field the caller left empty must never be sent as "clear this value":
//! nulls and blank strings are dropped from the top-level object before a
//! PATCH goes out. This is not validation and never fails.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Drop top-level fields that are `null` or whitespace-only strings.
/// Non-object values are returned unchanged. Idempotent.
pub fn sanitize_patch_body(body: Value) -> Value {
    match body {
        Value::Object(mut fields) => {
            fields.retain(|_, value| match value {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            });
            Value::Object(fields)
        }
        other => other,
    }
}

/// Serialize `input` and sanitize the result.
pub fn sanitized<T: Serialize + ?Sized>(input: &T) -> Result<Value, ApiError> {
    let value = serde_json::to_value(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok(sanitize_patch_body(value))
}
