use serde_json::{Map, Value};

use crate::error::FormatError;
use crate::render::pretty;

/// Typographic or full-width punctuation that commonly sneaks into params
/// typed with a CJK input method, mapped to its ASCII counterpart.
///
/// This is a blunt text substitution: a string value that legitimately
/// contains one of these characters is rewritten as well.
const SUBSTITUTIONS: &[(char, char)] = &[
    ('\'', '"'),
    ('：', ':'),
    ('“', '"'),
    ('”', '"'),
    ('，', ','),
    ('【', '['),
    ('】', ']'),
];

/// Strictly parse request params. The text must hold a JSON object.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, FormatError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(FormatError::NotAnObject {
            found: kind_name(&other),
        }),
    }
}

/// Best-effort cleanup of hand-typed JSON.
///
/// Valid JSON comes back canonically pretty-printed. Otherwise the fixed
/// punctuation substitutions are applied and the text is parsed again; if it
/// still does not parse, the input is returned untouched.
pub fn repair(text: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return pretty(&value);
    }
    let substituted: String = text
        .chars()
        .map(|c| {
            SUBSTITUTIONS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect();
    match serde_json::from_str::<Value>(&substituted) {
        Ok(value) => pretty(&value),
        Err(_) => text.to_string(),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
