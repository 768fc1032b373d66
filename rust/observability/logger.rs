//! Build Logger
//!
//! Structured record of one dashboard build: one entry per step (ingestion and
//! each report), attached to the report bundle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// One step of a build
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepLogEntry {
    pub timestamp: DateTime<Utc>,
    pub step: String,
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub elapsed_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
}

/// In-memory build log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildLog {
    entries: Vec<StepLogEntry>,
}

impl BuildLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished step with its output shape.
    pub fn log_success(&mut self, step: &str, shape: (usize, usize), started: Instant) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(step, rows = shape.0, columns = shape.1, elapsed_ms, "step finished");
        self.entries.push(StepLogEntry {
            timestamp: Utc::now(),
            step: step.to_string(),
            rows: Some(shape.0),
            columns: Some(shape.1),
            elapsed_ms,
            success: true,
            error_message: None,
        });
    }

    /// Record a failed step. The error itself is still returned to the caller.
    pub fn log_failure(&mut self, step: &str, error: &str, started: Instant) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(step, elapsed_ms, error, "step failed");
        self.entries.push(StepLogEntry {
            timestamp: Utc::now(),
            step: step.to_string(),
            rows: None,
            columns: None,
            elapsed_ms,
            success: false,
            error_message: Some(error.to_string()),
        });
    }

    pub fn entries(&self) -> &[StepLogEntry] {
        &self.entries
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.entries.iter().map(|e| e.elapsed_ms).sum()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| !e.success).count()
    }
}
