// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Production line files
//!
//! ```json
//! { "line_id": "L1",
//!   "sensors": [ { "type": "vibration", "interval": 0.5, "payload": "small", "qos": 1 } ] }
//! ```
//!
//! Broken sensor entries are skipped with a warning; the rest of the line
//! still runs.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::sensors::{SensorKind, SizeClass};

/// One validated sensor entry
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSpec {
    pub kind: SensorKind,
    pub interval: Duration,
    pub size_class: SizeClass,
    pub qos: u8,
}

/// Parsed line file
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub line_id: String,
    pub sensors: Vec<SensorSpec>,
}

#[derive(Deserialize)]
struct RawLine {
    line_id: String,
    #[serde(default)]
    sensors: Value,
}

impl LineSpec {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Configuration file not found: {:?}", path))?;
        let line = Self::from_json(&content)
            .with_context(|| format!("Error decoding JSON from {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(line)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawLine = serde_json::from_str(content)?;

        let entries = match raw.sensors {
            Value::Array(entries) => entries,
            _ => {
                warn!("Invalid or missing 'sensors' array in configuration.");
                Vec::new()
            }
        };

        let sensors = entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match parse_sensor(entry) {
                Ok(spec) => Some(spec),
                Err(reason) => {
                    warn!("Sensor config at index {} skipped: {}", index, reason);
                    None
                }
            })
            .collect();

        Ok(Self {
            line_id: raw.line_id,
            sensors,
        })
    }
}

fn parse_sensor(entry: &Value) -> Result<SensorSpec, String> {
    let kind = entry
        .get("type")
        .and_then(Value::as_str)
        .ok_or("missing 'type'")?;
    let kind: SensorKind = kind
        .parse()
        .map_err(|_| format!("unknown sensor type '{}'", kind))?;

    let interval = entry
        .get("interval")
        .ok_or("missing key 'interval'")?
        .as_f64()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .ok_or("'interval' must be a non-negative number of seconds")?;

    let payload = entry
        .get("payload")
        .ok_or("missing key 'payload'")?
        .as_str()
        .ok_or("'payload' must be a string")?;
    let size_class: SizeClass = payload
        .parse()
        .map_err(|_| format!("unknown payload size '{}'", payload))?;

    let qos = entry
        .get("qos")
        .ok_or("missing key 'qos'")?
        .as_u64()
        .filter(|qos| *qos <= 2)
        .ok_or("'qos' must be 0, 1 or 2")?;

    Ok(SensorSpec {
        kind,
        interval: Duration::from_secs_f64(interval),
        size_class,
        qos: qos as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let line = LineSpec::from_json(
            r#"{
                "line_id": "L1",
                "sensors": [
                    {"type": "vibration", "interval": 0.5, "payload": "small", "qos": 1},
                    {"type": "security", "interval": 2, "payload": "medium", "qos": 0}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(line.line_id, "L1");
        assert_eq!(line.sensors.len(), 2);
        assert_eq!(line.sensors[0].kind, SensorKind::Vibration);
        assert_eq!(line.sensors[0].interval, Duration::from_millis(500));
        assert_eq!(line.sensors[1].size_class, SizeClass::Medium);
    }

    #[test]
    fn test_bad_entries_skipped() {
        let line = LineSpec::from_json(
            r#"{
                "line_id": "L2",
                "sensors": [
                    {"interval": 1, "payload": "small", "qos": 0},
                    {"type": "pressure", "interval": 1, "payload": "small", "qos": 0},
                    {"type": "quality", "payload": "small", "qos": 0},
                    {"type": "quality", "interval": "fast", "payload": "small", "qos": 0},
                    {"type": "quality", "interval": 1, "payload": "huge", "qos": 0},
                    {"type": "quality", "interval": 1, "payload": "small", "qos": 7},
                    {"type": "temperature", "interval": 1, "payload": "large", "qos": 2}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(line.sensors.len(), 1);
        assert_eq!(line.sensors[0].kind, SensorKind::Temperature);
    }

    #[test]
    fn test_missing_sensors_array() {
        let line = LineSpec::from_json(r#"{"line_id": "L3", "sensors": {}}"#).unwrap();
        assert!(line.sensors.is_empty());
        assert!(LineSpec::from_json(r#"{"sensors": []}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line1.json");
        std::fs::write(
            &path,
            r#"{"line_id": "L1", "sensors": [{"type": "quality", "interval": 1, "payload": "small", "qos": 0}]}"#,
        )
        .unwrap();

        assert_eq!(LineSpec::from_file(&path).unwrap().sensors.len(), 1);
        assert!(LineSpec::from_file(&dir.path().join("missing.json")).is_err());
    }
}
