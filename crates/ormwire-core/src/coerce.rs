//! Lenient scalar coercion over raw configuration values
//!
//! Values reach the resolver from YAML/JSON files and from environment
//! overrides. The latter are always strings, so every numeric or boolean
//! reader here accepts the string form as well.

use serde_json::{Map, Value};

/// Look up the first present, non-null field among `keys`
///
/// Exact matches are tried first, then a case-insensitive match; keys that
/// arrive through environment overrides are lowercased.
pub fn lookup<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = value.as_object()?;

    for key in keys {
        if let Some(found) = map.get(*key).filter(|v| !v.is_null()) {
            return Some(found);
        }
    }

    for key in keys {
        let found = map
            .iter()
            .find(|(candidate, v)| candidate.eq_ignore_ascii_case(key) && !v.is_null())
            .map(|(_, v)| v);
        if found.is_some() {
            return found;
        }
    }

    None
}

/// Render a scalar as a string; arrays, objects and nulls yield `None`
pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a non-negative integer from a number or numeric string
pub fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a float from a number or numeric string
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a boolean from a bool, `0`/`1`, or a common textual form
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read a list of strings
///
/// Accepts an array of scalars, a single scalar (one-element list), or an
/// object keyed by indices (`{"0": "a", "1": "b"}`), which is how indexed
/// environment overrides come through. Order is preserved.
pub fn as_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items.iter().map(as_string).collect(),
        Value::Object(map) => indexed_entries(map)?
            .into_iter()
            .map(as_string)
            .collect(),
        other => as_string(other).map(|s| vec![s]),
    }
}

/// Read a `name -> scalar` table as string pairs, keeping source order
pub fn as_string_table(value: &Value) -> Option<Vec<(String, String)>> {
    let map = value.as_object()?;
    map.iter()
        .map(|(k, v)| as_string(v).map(|s| (k.clone(), s)))
        .collect()
}

fn indexed_entries(map: &Map<String, Value>) -> Option<Vec<&Value>> {
    let mut entries = map
        .iter()
        .map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
        .collect::<Option<Vec<_>>>()?;
    entries.sort_by_key(|(i, _)| *i);
    Some(entries.into_iter().map(|(_, v)| v).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_prefers_exact_then_case_insensitive() {
        let block = json!({ "dbindex": 2, "host": "h" });

        assert_eq!(lookup(&block, &["dbIndex"]), Some(&json!(2)));
        assert_eq!(lookup(&block, &["host"]), Some(&json!("h")));
        assert!(lookup(&block, &["port"]).is_none());
    }

    #[test]
    fn test_lookup_skips_nulls() {
        let block = json!({ "user": null, "username": "root" });
        assert_eq!(lookup(&block, &["user", "username"]), Some(&json!("root")));
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(as_u64(&json!("3306")), Some(3306));
        assert_eq!(as_u64(&json!(3306)), Some(3306));
        assert_eq!(as_u64(&json!(5.0)), Some(5));
        assert_eq!(as_u64(&json!("abc")), None);
        assert_eq!(as_f64(&json!("2.5")), Some(2.5));
    }

    #[test]
    fn test_bool_forms() {
        assert_eq!(as_bool(&json!(true)), Some(true));
        assert_eq!(as_bool(&json!("on")), Some(true));
        assert_eq!(as_bool(&json!(0)), Some(false));
        assert_eq!(as_bool(&json!("nope")), None);
    }

    #[test]
    fn test_string_list_shapes() {
        assert_eq!(
            as_string_list(&json!(["a", "b"])),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(as_string_list(&json!("a")), Some(vec!["a".to_string()]));
        assert_eq!(
            as_string_list(&json!({ "1": "second", "0": "first" })),
            Some(vec!["first".to_string(), "second".to_string()])
        );
        assert_eq!(as_string_list(&json!({ "x": "y" })), None);
    }
}
