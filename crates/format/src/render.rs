use serde::Serialize;
use serde_json::{Map, Value};

/// Longest result text shown in full. Longer text is cut for display only.
pub const MAX_DISPLAY_LENGTH: usize = 50_000;

const INDENT: &[u8] = b"    ";

/// Return a copy of `value` whose object keys are sorted at every depth.
///
/// `serde_json::Map` is already ordered when the `preserve_order` feature is
/// off, but another crate in the build graph may switch it on.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, child) in entries {
                sorted.insert(key.clone(), canonicalize(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonical pretty print: sorted keys, four-space indent, non-ASCII kept
/// as-is.
pub fn pretty(value: &Value) -> String {
    let canonical = canonicalize(value);
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    // Serializing a `Value` into a Vec cannot fail.
    if canonical.serialize(&mut ser).is_err() {
        return canonical.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Build the single-key `{"error": message}` object.
pub fn error_envelope(message: impl Into<String>) -> Value {
    let mut map = Map::new();
    map.insert("error".to_string(), Value::String(message.into()));
    Value::Object(map)
}

/// Pretty-printed error envelope.
pub fn error_json(message: impl Into<String>) -> String {
    pretty(&error_envelope(message))
}

/// Heuristic used before persisting a result: anything whose serialization
/// mentions "error" is treated as a failure.
pub fn looks_like_error(serialized: &str) -> bool {
    serialized.to_lowercase().contains("error")
}

/// Cut `text` to at most `max` characters, appending a notice when cut.
///
/// Counts `char`s so multi-byte text is never split inside a code point.
pub fn truncate_for_display(text: &str, max: usize) -> String {
    let total = text.chars().count();
    if total <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str(&format!(
        "\n...(truncated, {} characters in full result)",
        total
    ));
    out
}
