use serde_json::Value;

use crate::types::Feature;

/// Keys tried, in order, when looking for a human-readable feature name.
const NAME_KEYS: [&str; 8] = ["name", "title", "label", "item_name", "sitename", "site_name", "precinct", "description"];

/// Case-insensitive attribute lookup over a list of candidate keys.
pub(crate) fn prop<'a>(feature: &'a Feature, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        if let Some(value) = feature.properties.get(*key) {
            if !value.is_null() { return Some(value) }
        }
        let found = feature.properties.iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(key) && !v.is_null())
            .map(|(_, v)| v);
        if found.is_some() { return found }
    }
    None
}

/// String attribute; numbers are rendered so class codes like `2` and `"2"` compare equal.
pub(crate) fn prop_str(feature: &Feature, keys: &[&str]) -> Option<String> {
    match prop(feature, keys)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric attribute; numeric strings are parsed.
pub(crate) fn prop_f64(feature: &Feature, keys: &[&str]) -> Option<f64> {
    let value = match prop(feature, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

/// Boolean attribute; accepts `true`, `"true"`, `"yes"`, `1`.
pub(crate) fn prop_bool(feature: &Feature, keys: &[&str]) -> bool {
    match prop(feature, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

/// Best-effort display name of a feature.
pub(crate) fn feature_name(feature: &Feature) -> Option<String> {
    prop_str(feature, &NAME_KEYS).or_else(|| feature.id.clone())
}

/// Spreadsheet-style letters for part labels: 0 -> A, 25 -> Z, 26 -> AA.
pub(crate) fn part_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 { break }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}
