// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Sensor traits and common types

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::reading::Reading;
use super::{QualityProfile, SecurityProfile, TemperatureProfile, VibrationProfile};
use crate::detection::{Finding, Thresholds};

/// Sensor kinds a production line can host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Vibration,
    Temperature,
    Quality,
    Security,
}

static VIBRATION: VibrationProfile = VibrationProfile;
static TEMPERATURE: TemperatureProfile = TemperatureProfile;
static QUALITY: QualityProfile = QualityProfile;
static SECURITY: SecurityProfile = SecurityProfile;

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Vibration,
        SensorKind::Temperature,
        SensorKind::Quality,
        SensorKind::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Vibration => "vibration",
            SensorKind::Temperature => "temperature",
            SensorKind::Quality => "quality",
            SensorKind::Security => "security",
        }
    }

    /// Generation and threshold behaviour for this kind
    pub fn profile(&self) -> &'static dyn SensorProfile {
        match self {
            SensorKind::Vibration => &VIBRATION,
            SensorKind::Temperature => &TEMPERATURE,
            SensorKind::Quality => &QUALITY,
            SensorKind::Security => &SECURITY,
        }
    }

    /// Security readings take the encrypted path
    pub fn is_secure(&self) -> bool {
        matches!(self, SensorKind::Security)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vibration" => Ok(SensorKind::Vibration),
            "temperature" => Ok(SensorKind::Temperature),
            "quality" => Ok(SensorKind::Quality),
            "security" => Ok(SensorKind::Security),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Target serialized size band for generated readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    /// Byte range `[lower, next class lower)`
    pub fn bounds(&self) -> Range<usize> {
        match self {
            SizeClass::Small => 1024..10_240,
            SizeClass::Medium => 10_240..102_400,
            SizeClass::Large => 102_400..1_048_576,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        }
    }
}

impl FromStr for SizeClass {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(SizeClass::Small),
            "medium" => Ok(SizeClass::Medium),
            "large" => Ok(SizeClass::Large),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Unrecognised sensor kind or size class name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant '{0}'")]
pub struct UnknownVariant(pub String);

/// Per-kind behaviour shared by the generator and the rule engine
pub trait SensorProfile: Send + Sync {
    /// Kind this profile describes
    fn kind(&self) -> SensorKind;

    /// Kind-specific fields of a fresh reading; `target_size` is the byte
    /// size the final reading will be padded to
    fn generate(&self, rng: &mut dyn RngCore, target_size: usize) -> Map<String, Value>;

    /// Threshold check; at most one finding per reading
    fn check(&self, reading: &Reading, thresholds: &Thresholds) -> Option<Finding>;
}
