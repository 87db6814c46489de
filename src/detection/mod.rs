// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Detection module - threshold rules and alert records

mod rules;

pub use rules::FaultRuleEngine;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sensors::Reading;

/// Fault classification attached to an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    #[serde(rename = "High Vibration")]
    HighVibration,
    #[serde(rename = "Quality Alert")]
    QualityAlert,
    #[serde(rename = "High Temperature")]
    HighTemperature,
    #[serde(rename = "Security Breach")]
    SecurityBreach,
    #[serde(rename = "Security System Error")]
    SecuritySystemError,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::HighVibration => "High Vibration",
            AlertType::QualityAlert => "Quality Alert",
            AlertType::HighTemperature => "High Temperature",
            AlertType::SecurityBreach => "Security Breach",
            AlertType::SecuritySystemError => "Security System Error",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single threshold check
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub alert_type: AlertType,
    pub message: String,
}

impl Finding {
    pub fn new(alert_type: AlertType, message: String) -> Self {
        Self { alert_type, message }
    }
}

/// Rule thresholds; all comparisons are strict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Vibration velocity on the x axis, mm/s
    pub vibration_x: f64,
    /// Defects per inspected item
    pub defect_count: f64,
    /// Motor temperature, °C
    pub motor_temp: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            vibration_x: 8.0,
            defect_count: 3.0,
            motor_temp: 85.0,
        }
    }
}

/// A reading augmented with its fault classification.
///
/// Serializes flat: every original reading field plus `alert_type` and
/// `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: AlertType,
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    reading: Reading,
}

impl Alert {
    pub fn new(reading: Reading, finding: Finding) -> Self {
        // Stale classification from an upstream hop must not shadow ours
        let mut fields = reading.into_fields();
        fields.remove("alert_type");
        fields.remove("message");

        Self {
            alert_type: finding.alert_type,
            message: finding.message,
            reading: Reading::from(fields),
        }
    }

    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    pub fn sensor_id(&self) -> Option<&str> {
        self.reading.sensor_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alert_serializes_flat() {
        let reading = Reading::from_value(json!({
            "type": "quality", "defect_count": 5, "sensor_id": "abc123", "line_id": "L1"
        }))
        .unwrap();
        let alert = Alert::new(
            reading,
            Finding::new(AlertType::QualityAlert, "five defects".into()),
        );

        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["alert_type"], "Quality Alert");
        assert_eq!(value["message"], "five defects");
        assert_eq!(value["defect_count"], 5);
        assert_eq!(value["sensor_id"], "abc123");
    }

    #[test]
    fn test_alert_parses_back() {
        let body = json!({
            "alert_type": "Security Breach",
            "message": "Access issue detected on s1! Status: 401",
            "sensor_id": "s1",
            "status_code": 401
        });

        let alert: Alert = serde_json::from_value(body).unwrap();
        assert_eq!(alert.alert_type, AlertType::SecurityBreach);
        assert_eq!(alert.sensor_id(), Some("s1"));
        assert_eq!(alert.reading().number("status_code"), Some(401.0));
        assert!(!alert.reading().contains("alert_type"));
    }

    #[test]
    fn test_unknown_alert_type_rejected() {
        let body = json!({"alert_type": "Meteor Strike", "sensor_id": "s1"});
        assert!(serde_json::from_value::<Alert>(body).is_err());
    }
}
