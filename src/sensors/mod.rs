// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Sensor module - reading model, per-kind profiles and simulation

mod traits;
mod reading;
mod vibration;
mod thermal;
mod quality;
mod security;
mod simulator;

pub use traits::{SensorKind, SensorProfile, SizeClass, UnknownVariant};
pub use reading::{Reading, REQUIRED_FIELDS};
pub use vibration::VibrationProfile;
pub use thermal::TemperatureProfile;
pub use quality::QualityProfile;
pub use security::SecurityProfile;
pub use simulator::{generate, new_sensor_id, pad_to, SensorSimulator};
