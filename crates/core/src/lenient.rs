//! Forgiving serde field deserializers for model-authored JSON.
//!
//! Models routinely emit `"0.9"` for `0.9`, `"true"` for `true`, or `null`
//! for an empty string. These helpers accept the common variants and fall
//! back to the field's default instead of failing the whole record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string, number or bool; anything else becomes `""`.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Like [`string`] but `null`/blank become `None`.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = string(deserializer)?;
    let trimmed = s.trim();
    Ok(if trimmed.is_empty() { None } else { Some(trimmed.to_string()) })
}

/// Accept a number or numeric string; anything else becomes `0`.
pub fn u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|v| v.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Accept a number or numeric string; anything else becomes `None`.
pub fn opt_f32<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accept a bool, `"true"`/`"false"` or 0/1; anything else becomes `false`.
pub fn bool_or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

/// Accept an array of scalars or a single string; non-scalar items are dropped.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let scalar = |v: Value| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar).collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "string")]
        text: String,
        #[serde(default, deserialize_with = "u32_or_zero")]
        step: u32,
        #[serde(default, deserialize_with = "opt_f32")]
        score: Option<f32>,
        #[serde(default, deserialize_with = "bool_or_false")]
        flag: bool,
        #[serde(default, deserialize_with = "string_list")]
        items: Vec<String>,
    }

    #[test]
    fn accepts_stringly_typed_values() {
        let p: Probe = serde_json::from_str(
            r#"{"text": 42, "step": "2", "score": "0.75", "flag": "true", "items": "one"}"#,
        )
        .unwrap();
        assert_eq!(p.text, "42");
        assert_eq!(p.step, 2);
        assert_eq!(p.score, Some(0.75));
        assert!(p.flag);
        assert_eq!(p.items, vec!["one".to_string()]);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let p: Probe = serde_json::from_str(
            r#"{"text": null, "step": -3, "score": {}, "flag": [], "items": [{"a":1}, "kept"]}"#,
        )
        .unwrap();
        assert_eq!(p.text, "");
        assert_eq!(p.step, 0);
        assert_eq!(p.score, None);
        assert!(!p.flag);
        assert_eq!(p.items, vec!["kept".to_string()]);
    }
}
