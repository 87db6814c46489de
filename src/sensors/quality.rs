// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Visual quality inspection station

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use super::{Reading, SensorKind, SensorProfile};
use crate::detection::{AlertType, Finding, Thresholds};

const DEFECT_TYPES: [&str; 3] = ["scratch", "dent", "misalignment"];

const OPERATORS: [&str; 8] = [
    "Ada Moreau",
    "Bruno Keller",
    "Chiara Bianchi",
    "Dmitri Volkov",
    "Elena Ruiz",
    "Farid Haddad",
    "Greta Lindqvist",
    "Hiro Tanaka",
];

/// Camera-based defect counter
pub struct QualityProfile;

impl QualityProfile {
    /// `BATCH-####-???` with random digits and uppercase letters
    fn batch_id(rng: &mut dyn RngCore) -> String {
        let digits: String = (0..4)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        let letters: String = (0..3)
            .map(|_| char::from(b'A' + rng.gen_range(0..26u8)))
            .collect();
        format!("BATCH-{}-{}", digits, letters)
    }

    fn image_hash(rng: &mut dyn RngCore) -> String {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        hex::encode(Sha256::digest(seed))
    }
}

impl SensorProfile for QualityProfile {
    fn kind(&self) -> SensorKind {
        SensorKind::Quality
    }

    fn generate(&self, rng: &mut dyn RngCore, target_size: usize) -> Map<String, Value> {
        let defect_count = rng.gen_range(0..=5u32);
        let type_count = rng.gen_range(0..=2usize);
        let defect_types: Vec<&str> = DEFECT_TYPES
            .choose_multiple(rng, type_count)
            .copied()
            .collect();
        let coordinates: Vec<[u32; 2]> = (0..3)
            .map(|_| [rng.gen_range(0..=1000), rng.gen_range(0..=1000)])
            .collect();
        let operator = OPERATORS.choose(rng).copied().unwrap_or("unassigned");

        let mut fields = Map::new();
        fields.insert("defect_count".into(), json!(defect_count));
        fields.insert("defect_types".into(), json!(defect_types));
        fields.insert(
            "image_meta".into(),
            json!({
                "hash": Self::image_hash(rng),
                "size_kb": target_size / 1024,
                "defect_coordinates": coordinates,
            }),
        );
        fields.insert("operator".into(), json!(operator));
        fields.insert("batch_id".into(), json!(Self::batch_id(rng)));
        fields
    }

    fn check(&self, reading: &Reading, thresholds: &Thresholds) -> Option<Finding> {
        let defects = reading.number("defect_count").unwrap_or(0.0);
        if defects <= thresholds.defect_count {
            return None;
        }

        let shown = reading
            .get("defect_count")
            .map(Value::to_string)
            .unwrap_or_else(|| "0".to_string());
        Some(Finding::new(
            AlertType::QualityAlert,
            format!(
                "Quality alert on {}/{}! {} defects detected.",
                reading.line_id().unwrap_or("N/A"),
                reading.sensor_id().unwrap_or("N/A"),
                shown
            ),
        ))
    }
}
