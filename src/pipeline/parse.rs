//! Response parsing: model text → [`FieldRecord`].
//!
//! Models often wrap JSON in a ```` ```json ```` fence even when told not to.
//! When the marker is present, only the fenced payload is parsed; otherwise
//! the whole response is. Values are taken exactly as the model wrote them:
//! `"5 Nos"` in a Quantity field stays `"5 Nos"`.

use crate::error::DocumentError;
use crate::schema::FieldRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Opening marker of a JSON fence.
const JSON_FENCE_MARKER: &str = "```json";

/// The marker, optional trailing blanks, a line break, then everything up to
/// the next fence or the end of the text.
static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)(?:```|\z)").unwrap());

/// The response contains a JSON fence marker that does not open a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("malformed ```json fence: marker is not followed by a line break")]
pub struct MalformedFence;

/// Return the JSON payload of a response.
///
/// * No ```` ```json ```` marker: the text itself.
/// * Marker followed by a line break: the text between it and the next
///   ```` ``` ```` (or the end of the text if the fence is never closed).
/// * Marker without a line break: [`MalformedFence`].
pub fn strip_json_fence(raw: &str) -> Result<&str, MalformedFence> {
    if !raw.contains(JSON_FENCE_MARKER) {
        return Ok(raw);
    }
    RE_JSON_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(MalformedFence)
}

/// Parse a model response into a field record.
///
/// Fails with [`DocumentError::Parse`] carrying the full original response
/// when the fence is malformed, the payload is not JSON, or the JSON is not
/// an object.
pub fn parse_field_record(name: &str, raw: &str) -> Result<FieldRecord, DocumentError> {
    let parse_error = |detail: String| DocumentError::Parse {
        name: name.to_string(),
        detail,
        raw: raw.to_string(),
    };

    let payload = strip_json_fence(raw).map_err(|e| parse_error(e.to_string()))?;

    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => Ok(FieldRecord::new(map)),
        Ok(other) => Err(parse_error(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(parse_error(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
