// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Producer module - simulated production lines

mod line;

pub use line::{LineSpec, SensorSpec};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::sensors::SensorSimulator;
use crate::streaming::{Forwarder, HttpForwarder, MqttConfig};

#[cfg(feature = "mqtt")]
use crate::streaming::{qos_level, MqttForwarder, MqttLink};

/// How readings leave the producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Http,
    Mqtt,
}

/// Producer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Receives vibration, temperature and quality readings
    pub standard_target: String,
    /// Receives security readings
    pub secure_target: String,
    pub timeout_secs: u64,
    /// Pause after each full round of sensors
    pub tick_ms: u64,
    pub transport: TransportKind,
    pub mqtt: MqttConfig,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            standard_target: "http://dropper:5000/data".to_string(),
            secure_target: "http://encrypter:5000/encrypt".to_string(),
            timeout_secs: 10,
            tick_ms: 100,
            transport: TransportKind::Http,
            mqtt: MqttConfig::default(),
        }
    }
}

impl ProducerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Destination of a line's readings
pub enum Transport {
    /// Security readings to `secure`, everything else to `standard`
    Direct {
        standard: Arc<dyn Forwarder>,
        secure: Arc<dyn Forwarder>,
    },
    #[cfg(feature = "mqtt")]
    Mqtt(Arc<MqttLink>),
}

impl Transport {
    /// HTTP targets sharing one connection pool
    pub fn http(config: &ProducerConfig) -> Self {
        let client = reqwest::Client::new();
        let timeout = Duration::from_secs(config.timeout_secs);
        Transport::Direct {
            standard: Arc::new(HttpForwarder::with_client(
                client.clone(),
                config.standard_target.clone(),
                timeout,
            )),
            secure: Arc::new(HttpForwarder::with_client(
                client,
                config.secure_target.clone(),
                timeout,
            )),
        }
    }

    #[cfg_attr(not(feature = "mqtt"), allow(unused_variables))]
    fn forwarder_for(&self, sensor: &SensorSimulator, spec: &SensorSpec) -> Arc<dyn Forwarder> {
        match self {
            Transport::Direct { standard, secure } => {
                if spec.kind.is_secure() {
                    secure.clone()
                } else {
                    standard.clone()
                }
            }
            #[cfg(feature = "mqtt")]
            Transport::Mqtt(link) => {
                let topic = if spec.kind.is_secure() {
                    MqttForwarder::secure_topic(sensor.line_id())
                } else {
                    MqttForwarder::standard_topic(sensor.line_id(), sensor.id())
                };
                Arc::new(MqttForwarder::new(link.clone(), topic, qos_level(spec.qos)))
            }
        }
    }
}

/// Totals for one producer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub rounds: u64,
    pub sent: u64,
    pub failed: u64,
}

struct Installed {
    simulator: SensorSimulator,
    spec: SensorSpec,
    forwarder: Arc<dyn Forwarder>,
}

/// A line of sensors firing round-robin.
///
/// Sensors never fire concurrently: each send is followed by that sensor's
/// interval, and each full round by the tick. A slow downstream therefore
/// stretches the period of every sensor on the line.
pub struct ProductionLine {
    line_id: String,
    sensors: Vec<Installed>,
    tick: Duration,
}

impl ProductionLine {
    pub fn new(spec: LineSpec, transport: &Transport, tick: Duration) -> Self {
        let sensors = spec
            .sensors
            .into_iter()
            .map(|sensor_spec| {
                let simulator =
                    SensorSimulator::new(&spec.line_id, sensor_spec.kind, sensor_spec.size_class);
                let forwarder = transport.forwarder_for(&simulator, &sensor_spec);
                info!(
                    "Initialized {} sensor (ID: {}) -> {}",
                    sensor_spec.kind,
                    simulator.id(),
                    forwarder.target()
                );
                Installed {
                    simulator,
                    spec: sensor_spec,
                    forwarder,
                }
            })
            .collect();

        Self {
            line_id: spec.line_id,
            sensors,
            tick,
        }
    }

    pub fn line_id(&self) -> &str {
        &self.line_id
    }

    pub fn sensor_ids(&self) -> Vec<&str> {
        self.sensors.iter().map(|s| s.simulator.id()).collect()
    }

    /// Loop until `shutdown` fires or `max_rounds` rounds have run
    pub async fn run(
        &mut self,
        max_rounds: Option<u64>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        if self.sensors.is_empty() {
            warn!("No sensors initialized, nothing to publish.");
            return summary;
        }

        info!("Line {} started with {} sensors", self.line_id, self.sensors.len());

        'rounds: while max_rounds.map_or(true, |max| summary.rounds < max) {
            for installed in &mut self.sensors {
                let reading = installed.simulator.read();
                let size_kb = reading.encoded_len() / 1024;
                let sensor_id = installed.simulator.id().to_string();
                let prefix = if installed.spec.kind.is_secure() { "[SECURE] " } else { "" };

                match installed.forwarder.send(&Value::from(reading)).await {
                    Ok(()) => {
                        summary.sent += 1;
                        info!(
                            "{}Published {}KB to {} (Sensor: {})",
                            prefix,
                            size_kb,
                            installed.forwarder.target(),
                            sensor_id
                        );
                    }
                    Err(e) => {
                        summary.failed += 1;
                        error!("{}Send failed for sensor {}: {}", prefix, sensor_id, e);
                    }
                }

                if pause(installed.spec.interval, &mut shutdown).await {
                    break 'rounds;
                }
            }

            summary.rounds += 1;
            if pause(self.tick, &mut shutdown).await {
                break;
            }
        }

        info!(
            "Line {} stopped after {} rounds ({} sent, {} failed)",
            self.line_id, summary.rounds, summary.sent, summary.failed
        );
        summary
    }
}

/// Sleep unless shutdown arrives first; `true` means stop
async fn pause(duration: Duration, shutdown: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = shutdown.recv() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}
