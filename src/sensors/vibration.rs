// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Vibration sensors - triaxial velocity with spectral snapshot

use rand::{Rng, RngCore};
use serde_json::{json, Map, Value};

use super::{Reading, SensorKind, SensorProfile};
use crate::detection::{AlertType, Finding, Thresholds};

/// Number of FFT bins carried per reading
const FFT_BINS: usize = 100;

/// Motor housing vibration sensor (velocity in mm/s)
pub struct VibrationProfile;

impl SensorProfile for VibrationProfile {
    fn kind(&self) -> SensorKind {
        SensorKind::Vibration
    }

    fn generate(&self, rng: &mut dyn RngCore, target_size: usize) -> Map<String, Value> {
        let fft: Vec<f64> = (0..FFT_BINS).map(|_| rng.gen::<f64>()).collect();

        let mut fields = Map::new();
        fields.insert("x".into(), json!(rng.gen_range(2.0..15.0)));
        fields.insert("y".into(), json!(rng.gen_range(2.0..15.0)));
        fields.insert("z".into(), json!(rng.gen_range(2.0..15.0)));
        fields.insert("unit".into(), json!("mm/s"));
        fields.insert("fft".into(), json!(fft));
        fields.insert(
            "metadata".into(),
            json!({ "analysis": "spectral", "samples": target_size / 1000 }),
        );
        fields
    }

    fn check(&self, reading: &Reading, thresholds: &Thresholds) -> Option<Finding> {
        let x = reading.number("x").unwrap_or(0.0);
        if x <= thresholds.vibration_x {
            return None;
        }

        Some(Finding::new(
            AlertType::HighVibration,
            format!(
                "High vibration on {}/{}! Value: {:.2} mm/s",
                reading.line_id().unwrap_or("N/A"),
                reading.sensor_id().unwrap_or("N/A"),
                x
            ),
        ))
    }
}
