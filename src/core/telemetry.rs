// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/linewatch

//! Per-stage telemetry context

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::{Pid, System};
use tracing::{debug, info};

/// Monotonic counters for one stage
#[derive(Debug, Default)]
pub struct StageMetrics {
    received: AtomicU64,
    forwarded: AtomicU64,
    dropped: AtomicU64,
    alerts: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`StageMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub received: u64,
    pub forwarded: u64,
    pub dropped: u64,
    pub alerts: u64,
    /// Client errors (4xx)
    pub rejected: u64,
    /// Forward and persistence failures (5xx)
    pub failed: u64,
}

impl StageMetrics {
    pub fn received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn alert(&self) {
        self.alerts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            alerts: self.alerts.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Resident memory of the current process
pub struct MemoryProbe {
    system: Mutex<System>,
    pid: Pid,
}

impl MemoryProbe {
    pub fn new() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        Some(Self {
            system: Mutex::new(System::new()),
            pid,
        })
    }

    /// Resident set size in KB
    pub fn resident_kb(&self) -> Option<f64> {
        let mut system = self.system.lock();
        system.refresh_process(self.pid);
        system
            .process(self.pid)
            .map(|process| process.memory() as f64 / 1024.0)
    }
}

/// Explicit observability context handed to every stage
pub struct Telemetry {
    stage: String,
    metrics: StageMetrics,
    memory: Option<MemoryProbe>,
    started: Instant,
}

/// Stats payload served on `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StageStats {
    pub stage: String,
    pub uptime_seconds: u64,
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
}

impl Telemetry {
    pub fn new(stage: &str, log_memory: bool) -> Arc<Self> {
        let memory = if log_memory { MemoryProbe::new() } else { None };
        Arc::new(Self {
            stage: stage.to_string(),
            metrics: StageMetrics::default(),
            memory,
            started: Instant::now(),
        })
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn metrics(&self) -> &StageMetrics {
        &self.metrics
    }

    pub fn stats(&self) -> StageStats {
        StageStats {
            stage: self.stage.clone(),
            uptime_seconds: self.started.elapsed().as_secs(),
            counters: self.metrics.snapshot(),
        }
    }

    /// Mark the start of a request; pass the result to [`Telemetry::finish`]
    pub fn begin(&self) -> Option<f64> {
        self.metrics.received();
        self.memory.as_ref().and_then(MemoryProbe::resident_kb)
    }

    pub fn finish(&self, before_kb: Option<f64>) {
        let after_kb = self.memory.as_ref().and_then(MemoryProbe::resident_kb);
        match (before_kb, after_kb) {
            (Some(before), Some(after)) => {
                info!("Request finished. RAM usage: {:.4} KB", after - before)
            }
            _ => debug!("Request finished"),
        }
    }
}
