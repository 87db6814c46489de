// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Fault rule engine

use tracing::debug;

use super::{Alert, Thresholds};
use crate::sensors::{Reading, SensorKind};

/// Evaluates clear-text readings against per-kind thresholds.
///
/// Rules are mutually exclusive: a reading carrying `status_code` is judged
/// by the security rules only, everything else by the rule of its declared
/// `type`. Unknown types never alert.
#[derive(Debug, Clone, Default)]
pub struct FaultRuleEngine {
    thresholds: Thresholds,
}

impl FaultRuleEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Zero or one alert for the reading
    pub fn evaluate(&self, reading: &Reading) -> Option<Alert> {
        let kind = if reading.contains("status_code") {
            SensorKind::Security
        } else {
            reading.kind()?
        };

        let finding = kind.profile().check(reading, &self.thresholds)?;
        debug!(
            sensor_id = reading.sensor_id().unwrap_or("N/A"),
            alert_type = %finding.alert_type,
            "Rule matched"
        );
        Some(Alert::new(reading.clone(), finding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::AlertType;
    use serde_json::json;

    fn reading(value: serde_json::Value) -> Reading {
        Reading::from_value(value).unwrap()
    }

    fn alert_type(value: serde_json::Value) -> Option<AlertType> {
        FaultRuleEngine::default()
            .evaluate(&reading(value))
            .map(|alert| alert.alert_type)
    }

    #[test]
    fn test_vibration_boundary() {
        assert_eq!(alert_type(json!({"type": "vibration", "x": 8.0})), None);
        assert_eq!(
            alert_type(json!({"type": "vibration", "x": 8.01})),
            Some(AlertType::HighVibration)
        );
    }

    #[test]
    fn test_quality_boundary() {
        assert_eq!(alert_type(json!({"type": "quality", "defect_count": 3})), None);
        assert_eq!(
            alert_type(json!({"type": "quality", "defect_count": 4})),
            Some(AlertType::QualityAlert)
        );
    }

    #[test]
    fn test_temperature_boundary() {
        assert_eq!(alert_type(json!({"type": "temperature", "motor_temp": 85.0})), None);
        assert_eq!(
            alert_type(json!({"type": "temperature", "motor_temp": 85.01})),
            Some(AlertType::HighTemperature)
        );
    }

    #[test]
    fn test_missing_metric_never_alerts() {
        assert_eq!(alert_type(json!({"type": "vibration"})), None);
        assert_eq!(alert_type(json!({"type": "quality", "defect_count": "many"})), None);
        assert_eq!(alert_type(json!({"type": "temperature", "x": 99.0})), None);
    }

    #[test]
    fn test_metric_of_other_kind_ignored() {
        assert_eq!(alert_type(json!({"type": "quality", "x": 50.0})), None);
        assert_eq!(alert_type(json!({"type": "pressure", "x": 50.0})), None);
        assert_eq!(alert_type(json!({"x": 50.0})), None);
    }

    #[test]
    fn test_security_codes() {
        assert_eq!(alert_type(json!({"status_code": 401})), Some(AlertType::SecurityBreach));
        assert_eq!(alert_type(json!({"status_code": 403})), Some(AlertType::SecurityBreach));
        assert_eq!(
            alert_type(json!({"status_code": 500})),
            Some(AlertType::SecuritySystemError)
        );
        assert_eq!(alert_type(json!({"status_code": 200})), None);
        assert_eq!(alert_type(json!({"status_code": 404})), None);
    }

    #[test]
    fn test_security_codes_as_floats() {
        assert_eq!(
            alert_type(json!({"status_code": 401.0, "sensor_id": "s1"})),
            Some(AlertType::SecurityBreach)
        );
        assert_eq!(alert_type(json!({"status_code": 403.0})), Some(AlertType::SecurityBreach));
        assert_eq!(
            alert_type(json!({"status_code": 500.0})),
            Some(AlertType::SecuritySystemError)
        );
        assert_eq!(alert_type(json!({"status_code": 401.5})), None);

        let alert = FaultRuleEngine::default()
            .evaluate(&reading(json!({"status_code": 401.0, "sensor_id": "s1"})))
            .unwrap();
        assert_eq!(alert.message, "Access issue detected on s1! Status: 401");
    }

    #[test]
    fn test_security_precedence() {
        // Would be a vibration alert without the status code
        assert_eq!(
            alert_type(json!({"type": "vibration", "x": 12.0, "status_code": 200})),
            None
        );
        assert_eq!(
            alert_type(json!({"type": "quality", "defect_count": 5, "status_code": 403})),
            Some(AlertType::SecurityBreach)
        );
    }

    #[test]
    fn test_alert_keeps_reading_fields() {
        let alert = FaultRuleEngine::default()
            .evaluate(&reading(json!({
                "type": "vibration", "x": 9.0, "line_id": "L2", "sensor_id": "deadbeef",
                "padding": "000"
            })))
            .unwrap();

        assert_eq!(alert.sensor_id(), Some("deadbeef"));
        assert_eq!(alert.reading().str_field("padding"), Some("000"));
        assert_eq!(alert.message, "High vibration on L2/deadbeef! Value: 9.00 mm/s");
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = FaultRuleEngine::new(Thresholds {
            vibration_x: 12.0,
            ..Thresholds::default()
        });
        assert!(engine.evaluate(&reading(json!({"type": "vibration", "x": 10.0}))).is_none());
        assert!(engine.evaluate(&reading(json!({"type": "vibration", "x": 12.5}))).is_some());
    }
}
