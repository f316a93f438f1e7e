use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::warn;

/// Greedy on purpose: spans from the first `{` to the last `}` in the text.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("Invalid regex"));

/// Best-effort decoding of a model reply.
///
/// The whole text is parsed first. If that fails, the brace-delimited span
/// found by [`JSON_OBJECT`] is parsed instead. Anything else yields `default`
/// untouched, so callers always get a value back.
///
/// When the reply holds several objects the span covers all of them and the
/// parse fails, which also lands on `default`.
pub fn extract_json(text: &str, default: Value) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return default;
    }

    if let Ok(parsed) = serde_json::from_str::<Value>(text) {
        return parsed;
    }

    let Some(candidate) = JSON_OBJECT.find(text) else {
        return default;
    };

    match serde_json::from_str::<Value>(candidate.as_str()) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Could not parse JSON object embedded in model output");
            default
        }
    }
}

// Field readers for decoded replies. Each one looks at a single key, so a
// mistyped field only loses itself.

/// `true`/`false`, also when the model quotes them.
pub(crate) fn bool_field(reply: &Value, key: &str) -> Option<bool> {
    match reply.get(key)? {
        Value::Bool(flag) => Some(*flag),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Non-blank strings only.
pub(crate) fn str_field<'a>(reply: &'a Value, key: &str) -> Option<&'a str> {
    reply
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Numbers, or strings holding one.
pub(crate) fn f64_field(reply: &Value, key: &str) -> Option<f64> {
    match reply.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
