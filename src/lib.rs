// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! LineWatch - Industrial IoT Telemetry Pipeline Simulator
//!
//! Synthetic production lines push sensor readings through a chain of small
//! relay services, each applying one narrow rule before handing off:
//! - Sensor payload generation (vibration, temperature, quality, security)
//! - Poisson packet loss in front of the router
//! - AES-256-GCM / ChaCha20-Poly1305 envelopes for security readings
//! - Threshold fault detection
//! - Append-only digital twin state per sensor
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  standard   ┌─────────┐  plain   ┌────────────────┐     ┌──────────────┐
//! │ Producer │────────────▶│ Dropper │─────────▶│ Fault Detector │────▶│ Digital Twin │
//! └──────────┘             └─────────┘          └────────────────┘     └──────────────┘
//!      │ security            ▲     │ envelope           ▲
//!      ▼                     │     ▼                    │
//! ┌───────────┐  envelope    │  ┌───────────┐  reading  │
//! │ Encrypter │──────────────┘  │ Decrypter │───────────┘
//! └───────────┘                 └───────────┘
//! ```

pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod producer;
pub mod relay;
pub mod security;
pub mod sensors;
pub mod server;
pub mod stages;
pub mod streaming;
pub mod twin;

// Re-exports for convenience
pub use config::{Config, ConfigError};
pub use core::Telemetry;
pub use detection::{Alert, AlertType, FaultRuleEngine, Thresholds};
pub use error::StageError;
pub use pipeline::Pipeline;
pub use producer::{LineSpec, ProductionLine, Transport};
pub use relay::{PacketLossGate, Route, Router};
pub use security::{Envelope, EnvelopeCodec, SharedKey};
pub use sensors::{generate, Reading, SensorKind, SizeClass};
pub use stages::{Ack, Stage, StageKind};
pub use twin::TwinStore;

/// LineWatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// LineWatch name
pub const NAME: &str = "LineWatch";
