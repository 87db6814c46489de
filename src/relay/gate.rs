// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Packet-loss gate

use parking_lot::Mutex;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Poisson};

use crate::config::ConfigError;

/// Simulated lossy link.
///
/// Every message costs one Poisson(λ) sample; a non-zero sample drops it, so
/// the drop probability is `1 - e^(-λ)`. λ = 0 never drops.
pub struct PacketLossGate {
    lambda: f64,
    distribution: Option<Poisson<f64>>,
    rng: Mutex<StdRng>,
}

impl PacketLossGate {
    pub fn new(lambda: f64) -> Result<Self, ConfigError> {
        Self::build(lambda, StdRng::from_entropy())
    }

    /// Deterministic gate for tests and reproducible runs
    pub fn with_seed(lambda: f64, seed: u64) -> Result<Self, ConfigError> {
        Self::build(lambda, StdRng::seed_from_u64(seed))
    }

    /// Gate that admits everything
    pub fn disabled() -> Self {
        Self {
            lambda: 0.0,
            distribution: None,
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }

    fn build(lambda: f64, rng: StdRng) -> Result<Self, ConfigError> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(ConfigError::InvalidLambda(lambda));
        }

        let distribution = if lambda == 0.0 {
            None
        } else {
            Some(Poisson::new(lambda).map_err(|_| ConfigError::InvalidLambda(lambda))?)
        };

        Ok(Self {
            lambda,
            distribution,
            rng: Mutex::new(rng),
        })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Expected fraction of dropped messages
    pub fn drop_probability(&self) -> f64 {
        1.0 - (-self.lambda).exp()
    }

    /// `true` when the message may continue
    pub fn admit(&self) -> bool {
        let Some(distribution) = &self.distribution else {
            return true;
        };

        let sample: f64 = distribution.sample(&mut *self.rng.lock());
        sample <= 0.0
    }
}

impl std::fmt::Debug for PacketLossGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketLossGate")
            .field("lambda", &self.lambda)
            .finish()
    }
}
