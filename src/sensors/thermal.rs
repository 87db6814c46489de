// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Thermal sensors - motor, bearing and coolant temperature

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde_json::{json, Map, Value};

use super::{Reading, SensorKind, SensorProfile};
use crate::detection::{AlertType, Finding, Thresholds};

const TREND_POINTS: usize = 50;

/// Drive temperature probe cluster
pub struct TemperatureProfile;

impl SensorProfile for TemperatureProfile {
    fn kind(&self) -> SensorKind {
        SensorKind::Temperature
    }

    fn generate(&self, rng: &mut dyn RngCore, target_size: usize) -> Map<String, Value> {
        let trend: Vec<f64> = (0..TREND_POINTS).map(|_| rng.gen::<f64>()).collect();
        let stability = ["stable", "fluctuating"].choose(rng).copied().unwrap_or("stable");

        let mut fields = Map::new();
        fields.insert("motor_temp".into(), json!(rng.gen_range(30.0..90.0)));
        fields.insert("bearing_temp".into(), json!(rng.gen_range(25.0..70.0)));
        fields.insert("coolant_temp".into(), json!(rng.gen_range(15.0..45.0)));
        fields.insert("unit".into(), json!("°C"));
        fields.insert("trend".into(), json!(trend));
        fields.insert(
            "metadata".into(),
            json!({ "stability": stability, "size": target_size }),
        );
        fields
    }

    fn check(&self, reading: &Reading, thresholds: &Thresholds) -> Option<Finding> {
        let motor_temp = reading.number("motor_temp").unwrap_or(0.0);
        if motor_temp <= thresholds.motor_temp {
            return None;
        }

        Some(Finding::new(
            AlertType::HighTemperature,
            format!(
                "High temperature on {}/{}! Value: {:.1}°C",
                reading.line_id().unwrap_or("N/A"),
                reading.sensor_id().unwrap_or("N/A"),
                motor_temp
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_generated_ranges() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let fields = TemperatureProfile.generate(&mut rng, 2048);
            let motor = fields["motor_temp"].as_f64().unwrap();
            let coolant = fields["coolant_temp"].as_f64().unwrap();
            assert!((30.0..90.0).contains(&motor));
            assert!((15.0..45.0).contains(&coolant));
            assert_eq!(fields["trend"].as_array().unwrap().len(), TREND_POINTS);
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let at = Reading::from_value(json!({"type": "temperature", "motor_temp": 85.0})).unwrap();
        let above = Reading::from_value(json!({"type": "temperature", "motor_temp": 85.1})).unwrap();

        assert!(TemperatureProfile.check(&at, &Thresholds::default()).is_none());
        let finding = TemperatureProfile.check(&above, &Thresholds::default()).unwrap();
        assert_eq!(finding.alert_type, AlertType::HighTemperature);
        assert!(finding.message.ends_with("Value: 85.1°C"));
    }
}
