// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Sensor simulator - synthetic readings padded to a size class

use chrono::{SecondsFormat, Utc};
use rand::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::{Reading, SensorKind, SizeClass};

/// Simulates one sensor installed on a production line
pub struct SensorSimulator {
    id: String,
    line_id: String,
    kind: SensorKind,
    size_class: SizeClass,
    sequence: u64,
    rng: StdRng,
}

impl SensorSimulator {
    pub fn new(line_id: &str, kind: SensorKind, size_class: SizeClass) -> Self {
        Self {
            id: new_sensor_id(),
            line_id: line_id.to_string(),
            kind,
            size_class,
            sequence: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic simulator for tests
    pub fn with_seed(line_id: &str, kind: SensorKind, size_class: SizeClass, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(line_id, kind, size_class)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn line_id(&self) -> &str {
        &self.line_id
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn size_class(&self) -> SizeClass {
        self.size_class
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Produce the next reading
    pub fn read(&mut self) -> Reading {
        self.sequence += 1;
        let target = self.rng.gen_range(self.size_class.bounds());
        compose(&mut self.rng, &self.line_id, &self.id, self.kind, target)
    }
}

/// One-shot generation with a throwaway sensor identity
pub fn generate(kind: SensorKind, size_class: SizeClass) -> Reading {
    let mut rng = StdRng::from_entropy();
    let target = rng.gen_range(size_class.bounds());
    compose(&mut rng, "line-0", &new_sensor_id(), kind, target)
}

/// Eight-character sensor identifier
pub fn new_sensor_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn compose(
    rng: &mut StdRng,
    line_id: &str,
    sensor_id: &str,
    kind: SensorKind,
    target_size: usize,
) -> Reading {
    let mut reading = Reading::new();
    reading.insert(
        "timestamp",
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    );
    reading.insert("line_id", line_id);
    reading.insert("sensor_id", sensor_id);
    reading.insert("type", kind.as_str());

    for (key, value) in kind.profile().generate(rng, target_size) {
        reading.insert(&key, value);
    }

    pad_to(reading, target_size)
}

/// Fill `padding` so the encoded reading is exactly `target_size` bytes, or
/// leave it empty when the intrinsic fields already reach the target
pub fn pad_to(mut reading: Reading, target_size: usize) -> Reading {
    reading.insert("padding", Value::String(String::new()));
    let missing = target_size.saturating_sub(reading.encoded_len());
    if missing > 0 {
        reading.insert("padding", "0".repeat(missing));
    }
    reading
}
