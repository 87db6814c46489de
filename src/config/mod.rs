// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::detection::Thresholds;
use crate::producer::ProducerConfig;
use crate::security::{CipherConfig, EnvelopeCodec, KeyError, SharedKey};
use crate::twin::TwinConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("poisson lambda must be finite and >= 0, got {0}")]
    InvalidLambda(f64),

    #[error("invalid bind address '{0}'")]
    InvalidBind(String),

    #[error("{field} must be an http(s) URL, got '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("a cipher key is required (set [cipher] key or LINEWATCH_KEY)")]
    MissingKey,

    #[error("invalid cipher key: {0}")]
    Key(#[from] KeyError),
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener for stage services
    pub server: ServerConfig,

    /// Logging and memory probe
    pub telemetry: TelemetryConfig,

    /// Packet-loss gate
    pub gate: GateConfig,

    /// Downstream hops
    pub routes: RoutesConfig,

    /// Relay forwarding
    pub forward: ForwardConfig,

    /// Envelope cipher
    pub cipher: CipherConfig,

    /// Rule thresholds
    pub detection: Thresholds,

    /// Digital twin storage
    pub twin: TwinConfig,

    /// Production line
    pub producer: ProducerConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("linewatch"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Check every value a stage or producer will rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lambda = self.gate.lambda;
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(ConfigError::InvalidLambda(lambda));
        }

        self.server.addr()?;

        for (field, value) in [
            ("routes.decrypter_url", &self.routes.decrypter_url),
            ("routes.fault_detector_url", &self.routes.fault_detector_url),
            ("routes.digital_twin_url", &self.routes.digital_twin_url),
            ("routes.encrypter_forward_url", &self.routes.encrypter_forward_url),
            ("producer.standard_target", &self.producer.standard_target),
            ("producer.secure_target", &self.producer.secure_target),
        ] {
            check_url(field, value)?;
        }

        if self.forward.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("forward.timeout_secs"));
        }
        if self.producer.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("producer.timeout_secs"));
        }
        if self.twin.append_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("twin.append_timeout_secs"));
        }

        if let Some(key) = &self.cipher.key {
            SharedKey::parse(key)?;
        }
        Ok(())
    }

    /// Envelope codec for stages that cannot run without a key
    pub fn codec(&self) -> Result<EnvelopeCodec, ConfigError> {
        if self.cipher.key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::MissingKey);
        }
        Ok(self.cipher.codec()?)
    }

    /// Envelope codec when a key is configured
    pub fn optional_codec(&self) -> Result<Option<EnvelopeCodec>, ConfigError> {
        match self.codec() {
            Ok(codec) => Ok(Some(codec)),
            Err(ConfigError::MissingKey) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.bind.clone()))
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Log level when neither `--debug` nor `RUST_LOG` is given
    pub level: String,

    /// Log the resident memory delta of every request
    pub log_memory: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_memory: true,
        }
    }
}

/// Gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Poisson rate; 0.1 drops roughly 9.5% of messages
    pub lambda: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { lambda: 0.1 }
    }
}

/// Downstream service URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    pub decrypter_url: String,
    pub fault_detector_url: String,
    pub digital_twin_url: String,
    /// Where the encrypter sends envelopes
    pub encrypter_forward_url: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            decrypter_url: "http://decrypter:5000/decrypt".to_string(),
            fault_detector_url: "http://fault-detector:5000/data".to_string(),
            digital_twin_url: "http://digital-twin:5000/update".to_string(),
            encrypter_forward_url: "http://dropper:5000/data".to_string(),
        }
    }
}

/// Relay forwarding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    pub timeout_secs: u64,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

impl ForwardConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
