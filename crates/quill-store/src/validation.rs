//! Field validators and JSON input helpers shared by the models.

use std::sync::LazyLock;

use chrono::{NaiveDateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

/// Timestamp format used for every stored date.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

/// The current time in [`TIMESTAMP_FORMAT`].
pub fn now() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Checks a name is between `min` and `max` characters.
pub fn name(value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if value.trim().is_empty() || len < min || len > max {
        return Err(StoreError::validation(format!(
            "Name must be between {min} and {max} characters."
        )));
    }
    Ok(())
}

/// Checks a value is not empty, failing with `message`.
pub fn non_empty(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(message));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<()> {
    if !EMAIL.is_match(value) {
        return Err(StoreError::validation("Invalid email format."));
    }
    Ok(())
}

/// Checks a timestamp is exactly in [`TIMESTAMP_FORMAT`].
///
/// Values that parse but print differently (missing zero padding, for
/// instance) are rejected.
pub fn timestamp(value: &str) -> Result<()> {
    let round_trips = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .is_ok_and(|parsed| parsed.format(TIMESTAMP_FORMAT).to_string() == value);

    if !round_trips {
        return Err(StoreError::validation(
            "Invalid date format. Expected 'Y-m-d H:i:s'.",
        ));
    }
    Ok(())
}

/// Rejects keys of `body` that are not in `allowed`.
pub fn known_fields(body: &Map<String, Value>, allowed: &[&str]) -> Result<()> {
    match body.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(StoreError::UnknownField(key.clone())),
        None => Ok(()),
    }
}

/// Reads an optional string field.
pub fn text(body: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(StoreError::validation(format!("'{key}' must be a string."))),
    }
}

/// Reads an optional integer field.
pub fn integer(body: &Map<String, Value>, key: &str) -> Result<Option<i64>> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| StoreError::validation(format!("'{key}' must be an integer."))),
    }
}

/// Reads an optional list of positive ids.
pub fn id_list(body: &Map<String, Value>, key: &str) -> Result<Option<Vec<i64>>> {
    let invalid = || StoreError::validation(format!("'{key}' must be a list of ids."));

    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_i64().filter(|id| *id > 0).ok_or_else(invalid))
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(invalid()),
    }
}

/// Reads a JSON array that may arrive either as an array or as JSON text.
///
/// Returns the array re-encoded as compact JSON text.
pub fn json_array(body: &Map<String, Value>, key: &str, message: &str) -> Result<Option<String>> {
    let value = match body.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) => {
            serde_json::from_str::<Value>(text).map_err(|_| StoreError::validation(message))?
        }
        Some(value) => value.clone(),
    };

    if !value.is_array() {
        return Err(StoreError::validation(message));
    }
    Ok(Some(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_name_bounds() {
        assert!(name("ab", 2, 50).is_ok());
        assert!(name("a", 2, 50).is_err());
        assert!(name("  ", 2, 50).is_err());
        assert!(name(&"x".repeat(51), 2, 50).is_err());
        assert_eq!(
            name("", 2, 100).unwrap_err().to_string(),
            "Name must be between 2 and 100 characters."
        );
    }

    #[test]
    fn test_email() {
        assert!(email("user@example.com").is_ok());
        assert!(email("first.last+tag@sub.example.org").is_ok());
        assert!(email("invalid").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("user@example").is_err());
    }

    #[test]
    fn test_timestamp_must_round_trip() {
        assert!(timestamp("2024-03-01 09:05:00").is_ok());
        assert!(timestamp(&now()).is_ok());
        assert!(timestamp("2024-3-1 9:05:00").is_err());
        assert!(timestamp("2024-03-01T09:05:00").is_err());
        assert!(timestamp("2024-02-30 00:00:00").is_err());
    }

    #[test]
    fn test_known_fields() {
        let body = object(json!({"name": "x", "colour": "red"}));
        let err = known_fields(&body, &["name"]).unwrap_err();
        assert_eq!(err.to_string(), "Property 'colour' does not exist");
        assert!(known_fields(&body, &["name", "colour"]).is_ok());
    }

    #[test]
    fn test_typed_readers() {
        let body = object(json!({"s": "v", "n": 3, "ids": [1, 2], "bad": [0], "nul": null}));
        assert_eq!(text(&body, "s").unwrap(), Some("v".to_string()));
        assert!(text(&body, "n").is_err());
        assert_eq!(text(&body, "nul").unwrap(), None);
        assert_eq!(integer(&body, "n").unwrap(), Some(3));
        assert!(integer(&body, "s").is_err());
        assert_eq!(id_list(&body, "ids").unwrap(), Some(vec![1, 2]));
        assert!(id_list(&body, "bad").is_err());
        assert_eq!(id_list(&body, "missing").unwrap(), None);
    }

    #[test]
    fn test_json_array_accepts_text_or_array() {
        let body = object(json!({"a": ["x"], "t": "[\"y\"]", "o": {"k": 1}, "junk": "[oops"}));
        let msg = "Invalid JSON format for variables.";
        assert_eq!(json_array(&body, "a", msg).unwrap(), Some(r#"["x"]"#.to_string()));
        assert_eq!(json_array(&body, "t", msg).unwrap(), Some(r#"["y"]"#.to_string()));
        assert!(json_array(&body, "o", msg).is_err());
        assert_eq!(json_array(&body, "junk", msg).unwrap_err().to_string(), msg);
    }
}
