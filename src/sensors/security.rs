// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Access-control sensors - door controllers and badge readers

use std::net::Ipv4Addr;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{Reading, SensorKind, SensorProfile};
use crate::detection::{AlertType, Finding, Thresholds};

/// Weighted status distribution: 3/6 success, 1/6 each for the failures
const STATUS_CODES: [u16; 6] = [200, 200, 200, 401, 403, 500];

const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/118.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0 Safari/537.36",
    "BadgeReader/2.4 (embedded; armv7l)",
    "curl/8.4.0",
    "python-requests/2.31.0",
];

/// Security event source
pub struct SecurityProfile;

impl SecurityProfile {
    fn source_ip(rng: &mut dyn RngCore) -> String {
        Ipv4Addr::new(
            rng.gen_range(1..=223),
            rng.gen(),
            rng.gen(),
            rng.gen_range(1..=254),
        )
        .to_string()
    }
}

impl SensorProfile for SecurityProfile {
    fn kind(&self) -> SensorKind {
        SensorKind::Security
    }

    fn generate(&self, rng: &mut dyn RngCore, _target_size: usize) -> Map<String, Value> {
        let status_code = STATUS_CODES.choose(rng).copied().unwrap_or(200);
        let (access_attempts, criticality) = if status_code == 200 {
            (rng.gen_range(0..=5u32), "Low")
        } else {
            let level = if rng.gen_bool(0.5) { "Medium" } else { "High" };
            (rng.gen_range(1..=10u32), level)
        };
        let user_agent = USER_AGENTS.choose(rng).copied().unwrap_or("unknown");

        let mut fields = Map::new();
        fields.insert("event_id".into(), json!(Uuid::new_v4().to_string()));
        fields.insert("status_code".into(), json!(status_code));
        fields.insert(
            "description".into(),
            json!(format!("Security check event. Status: {}", status_code)),
        );
        fields.insert("access_attempts".into(), json!(access_attempts));
        fields.insert("source_ip".into(), json!(Self::source_ip(rng)));
        fields.insert("user_agent".into(), json!(user_agent));
        fields.insert("criticality".into(), json!(criticality));
        fields
    }

    /// Status-code rule set: `criticality` is informational only
    fn check(&self, reading: &Reading, _thresholds: &Thresholds) -> Option<Finding> {
        // 401.0 is still 401
        let status = reading
            .number("status_code")
            .filter(|code| code.fract() == 0.0)? as i64;
        let sensor_id = reading.sensor_id().unwrap_or("N/A");

        match status {
            401 | 403 => Some(Finding::new(
                AlertType::SecurityBreach,
                format!("Access issue detected on {}! Status: {}", sensor_id, status),
            )),
            500 => Some(Finding::new(
                AlertType::SecuritySystemError,
                format!(
                    "Internal error reported by security sensor {}! Status: {}",
                    sensor_id, status
                ),
            )),
            _ => None,
        }
    }
}
