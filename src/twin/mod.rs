// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Digital twin state - append-only per-sensor alert logs
//!
//! Every alert becomes one line in `<state_dir>/<sensor_id>.state`:
//!
//! ```text
//! [2026-03-02 14:07:11] - Quality Alert: {"alert_type":"Quality Alert",...}
//! ```
//!
//! Files are created on the first alert for a sensor and only ever appended.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::detection::Alert;

/// Log name used when an alert carries no usable `sensor_id`
pub const UNKNOWN_SENSOR: &str = "unknown_sensor";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("could not append state for '{sensor_id}': {source}")]
    Io {
        sensor_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("append for '{sensor_id}' exceeded {timeout:?}")]
    Timeout { sensor_id: String, timeout: Duration },

    #[error("alert could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Twin storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinConfig {
    pub state_dir: PathBuf,
    pub append_timeout_secs: u64,
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("./twin_state"),
            append_timeout_secs: 5,
        }
    }
}

/// File name stem for a sensor: `[A-Za-z0-9_-]` only
pub fn sanitize_sensor_id(raw: Option<&str>) -> String {
    let cleaned: String = raw
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        UNKNOWN_SENSOR.to_string()
    } else {
        cleaned
    }
}

/// One Twin State Record, newline included
pub fn format_record(alert: &Alert, at: DateTime<Utc>) -> Result<String, PersistenceError> {
    let json = serde_json::to_string(alert)?;
    Ok(format!(
        "[{}] - {}: {}\n",
        at.format(TIMESTAMP_FORMAT),
        alert.alert_type,
        json
    ))
}

/// Append-only alert logs, one per sensor.
///
/// Appends to the same sensor are serialized by a per-sensor async lock and
/// each record is a single write, so concurrent records never interleave.
pub struct TwinStore {
    state_dir: PathBuf,
    append_timeout: Duration,
    locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TwinStore {
    pub fn new(state_dir: impl Into<PathBuf>, append_timeout: Duration) -> Self {
        Self {
            state_dir: state_dir.into(),
            append_timeout,
            locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &TwinConfig) -> Self {
        Self::new(
            config.state_dir.clone(),
            Duration::from_secs(config.append_timeout_secs),
        )
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn path_for(&self, sensor_id: &str) -> PathBuf {
        self.state_dir.join(format!("{}.state", sensor_id))
    }

    fn lock_for(&self, sensor_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(sensor_id.to_string())
            .or_default()
            .clone()
    }

    /// Forget the sensor's lock once no other append holds or awaits it
    fn release(&self, sensor_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock();
        // the map's copy plus ours
        if Arc::strong_count(&lock) == 2 {
            locks.remove(sensor_id);
        }
    }

    /// Append one record for the alert's sensor; returns the log path.
    ///
    /// The timeout covers waiting for the sensor's lock as well as the write.
    pub async fn record(&self, alert: &Alert) -> Result<PathBuf, PersistenceError> {
        let sensor_id = sanitize_sensor_id(alert.sensor_id());
        let line = format_record(alert, Utc::now())?;
        let path = self.path_for(&sensor_id);

        let lock = self.lock_for(&sensor_id);
        let appended = tokio::time::timeout(self.append_timeout, async {
            let _guard = lock.lock().await;
            self.append(&path, line.as_bytes()).await
        })
        .await;
        self.release(&sensor_id, lock);

        match appended {
            Ok(Ok(())) => {
                info!(sensor_id = %sensor_id, "State persisted to {:?}", path);
                Ok(path)
            }
            Ok(Err(source)) => Err(PersistenceError::Io { sensor_id, source }),
            Err(_) => Err(PersistenceError::Timeout {
                sensor_id,
                timeout: self.append_timeout,
            }),
        }
    }

    async fn append(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.state_dir).await?;
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        debug!("Appended {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }

    /// All records for a sensor, oldest first; empty when none exist
    pub async fn history(&self, sensor_id: &str) -> Result<Vec<String>, PersistenceError> {
        let sensor_id = sanitize_sensor_id(Some(sensor_id));
        match tokio::fs::read_to_string(self.path_for(&sensor_id)).await {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(PersistenceError::Io { sensor_id, source }),
        }
    }
}
