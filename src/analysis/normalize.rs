use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::dto::FoodItem;

pub const EMPTY_REPLY_JSON: &str = r#"{"foods": [], "totalCalories": 0}"#;

/// Per-item ceiling; keeps the summed total finite.
pub const MAX_ITEM_CALORIES: f64 = 100_000.0;

lazy_static! {
    static ref LINE_NOISE_RE: Regex = Regex::new(r"[\r\n\t]").unwrap();
    static ref JSON_SPAN_RE: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Strips line noise and cuts the reply down to its outermost `{...}` span.
/// Replies without one collapse to [`EMPTY_REPLY_JSON`].
pub fn extract_json_span(raw: &str) -> String {
    let cleaned = LINE_NOISE_RE.replace_all(raw, "");
    match JSON_SPAN_RE.find(cleaned.trim()) {
        Some(m) => m.as_str().to_string(),
        None => EMPTY_REPLY_JSON.to_string(),
    }
}

/// Turns a raw model reply into minimal food items. Never fails.
pub fn normalize_reply(raw: &str) -> Vec<FoodItem> {
    let span = extract_json_span(raw);
    let parsed: Value = match serde_json::from_str(&span) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "model reply is not valid json; using empty result");
            return Vec::new();
        }
    };
    coerce_foods(&parsed)
}

/// Applies the minimal schema to an arbitrary JSON value. `totalCalories`
/// and any extra per-item fields are ignored.
pub fn coerce_foods(parsed: &Value) -> Vec<FoodItem> {
    let Some(entries) = parsed.get("foods").and_then(Value::as_array) else {
        debug!("reply has no foods array");
        return Vec::new();
    };
    entries
        .iter()
        .map(|entry| {
            FoodItem::minimal(
                coerce_name(entry.get("name")),
                coerce_calories(entry.get("calories")),
            )
        })
        .collect()
}

/// Falsy values (`0`, `false`, `""`, null) give an empty name.
fn coerce_name(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()) => {
            n.to_string()
        }
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

fn coerce_calories(v: Option<&Value>) -> f64 {
    let n = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|c| c.is_finite())
        .map(|c| c.clamp(-MAX_ITEM_CALORIES, MAX_ITEM_CALORIES))
        .unwrap_or(0.0)
}
