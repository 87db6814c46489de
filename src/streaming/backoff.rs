// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Reconnect backoff policies

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Delay before reconnect attempt `attempt` (0-based)
pub trait BackoffPolicy: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

/// Same delay for every attempt
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff(pub Duration);

impl Default for FixedBackoff {
    fn default() -> Self {
        Self(Duration::from_secs(10))
    }
}

impl BackoffPolicy for FixedBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Doubling delay capped at `max`, scaled by a random factor in
/// `[1 - jitter, 1 + jitter]`
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
    pub jitter: f64,
}

impl ExponentialBackoff {
    fn nominal(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base.saturating_mul(factor).min(self.max)
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let nominal = self.nominal(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return nominal;
        }

        let scale = rand::thread_rng().gen_range(1.0 - jitter..=1.0 + jitter);
        nominal.mul_f64(scale)
    }
}

/// Serialized form of a backoff policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackoffConfig {
    Fixed {
        delay_secs: u64,
    },
    Exponential {
        base_ms: u64,
        max_ms: u64,
        #[serde(default)]
        jitter: f64,
    },
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig::Fixed { delay_secs: 10 }
    }
}

impl BackoffConfig {
    pub fn build(&self) -> Arc<dyn BackoffPolicy> {
        match *self {
            BackoffConfig::Fixed { delay_secs } => {
                Arc::new(FixedBackoff(Duration::from_secs(delay_secs)))
            }
            BackoffConfig::Exponential { base_ms, max_ms, jitter } => Arc::new(ExponentialBackoff {
                base: Duration::from_millis(base_ms),
                max: Duration::from_millis(max_ms),
                jitter,
            }),
        }
    }
}
