//! Lenient JSON helpers for documents written by older app versions.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Render a loose JSON scalar the way a cell displays it.
///
/// `null` becomes the empty string, numbers and booleans their textual form;
/// arrays and objects are not valid cell values and are dropped to empty.
#[must_use]
pub fn value_to_cell_string(value: &Value) -> String {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}

/// Deserialize a `cells` object whose values may be strings, numbers or null.
pub fn deserialize_cells<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, value_to_cell_string(&v)))
        .collect())
}

/// Deserialize a list of strings, skipping null and non-string entries.
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter(|v| !v.is_null())
        .map(value_to_cell_string)
        .collect())
}

/// Deserialize a value that may be `null`, falling back to `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
