//! Serde-backed text codec for closed enums stored as TEXT columns.

use daystack_core::Result;

/// Serialize an enum to its serde string form, without the quotes.
pub(crate) fn enum_to_db<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

/// Deserialize an enum from its serde string form.
pub(crate) fn enum_from_db<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    Ok(serde_json::from_str(&format!("\"{}\"", value))?)
}
