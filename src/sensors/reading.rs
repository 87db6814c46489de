// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Reading - the JSON mapping that travels through every hop

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SensorKind;

/// Fields every generated reading carries
pub const REQUIRED_FIELDS: [&str; 4] = ["timestamp", "line_id", "sensor_id", "type"];

/// One sensor observation.
///
/// Stages never need the full schema of a reading, only a handful of fields,
/// so the reading is kept as a JSON object. Unknown fields survive
/// every hop untouched, so an alert carries the whole reading without the
/// rule engine knowing each sensor's layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reading(Map<String, Value>);

impl Reading {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Accept any JSON value that is a non-empty object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) if !map.is_empty() => Some(Self(map)),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Numeric field, `None` when absent or not a number
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn sensor_id(&self) -> Option<&str> {
        self.str_field("sensor_id")
    }

    pub fn line_id(&self) -> Option<&str> {
        self.str_field("line_id")
    }

    /// Declared sensor kind, `None` for a missing or unknown `type`
    pub fn kind(&self) -> Option<SensorKind> {
        self.str_field("type").and_then(|t| t.parse().ok())
    }

    /// Names of required fields that are missing or not strings
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| self.str_field(field).is_none())
            .collect()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Serialized JSON length in bytes
    pub fn encoded_len(&self) -> usize {
        serde_json::to_vec(&self.0).map(|v| v.len()).unwrap_or(0)
    }
}

impl From<Map<String, Value>> for Reading {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Reading> for Value {
    fn from(reading: Reading) -> Self {
        Value::Object(reading.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Reading::from_value(json!([1, 2])).is_none());
        assert!(Reading::from_value(json!({})).is_none());
        assert!(Reading::from_value(json!("x")).is_none());
        assert!(Reading::from_value(json!({"type": "quality"})).is_some());
    }

    #[test]
    fn test_missing_required() {
        let reading = Reading::from_value(json!({
            "type": "quality",
            "sensor_id": "abc123",
            "line_id": 7,
        }))
        .unwrap();

        assert_eq!(reading.missing_required(), vec!["timestamp", "line_id"]);
        assert_eq!(reading.kind(), Some(SensorKind::Quality));
    }

    #[test]
    fn test_number_accepts_integers() {
        let reading = Reading::from_value(json!({"defect_count": 4, "x": 8.5})).unwrap();
        assert_eq!(reading.number("defect_count"), Some(4.0));
        assert_eq!(reading.number("x"), Some(8.5));
        assert_eq!(reading.number("motor_temp"), None);
    }
}
