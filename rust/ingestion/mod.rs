//! Ingestion Module - turns a flat file into a `Table`
//!
//! Each file format is an `IngestionStrategy`. The `IngestionContext` holds
//! the active strategy and can have it swapped between runs.

pub mod csv_ingestion;
pub mod json_ingestion;
pub mod xml_ingestion;

pub use csv_ingestion::CsvIngestion;
pub use json_ingestion::JsonIngestion;
pub use xml_ingestion::XmlIngestion;

use crate::error::{DashboardError, Result};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Ingestion Strategy Trait
///
/// Implementations:
/// - CsvIngestion: comma-separated text with a header row
/// - JsonIngestion: a single JSON document
/// - XmlIngestion: two-level markup (best effort)
pub trait IngestionStrategy: Send + Sync {
    /// Read the file at `path` into a table
    fn ingest_data(&self, path: &Path) -> Result<Table>;

    /// Short strategy name (e.g., "csv")
    fn name(&self) -> &str;
}

/// Format selector for the ingestion boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionFormat {
    Csv,
    Json,
    Xml,
}

impl IngestionFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" => Ok(IngestionFormat::Csv),
            "json" => Ok(IngestionFormat::Json),
            "xml" => Ok(IngestionFormat::Xml),
            _ => Err(DashboardError::UnknownFormat(format!(
                "cannot infer format from '{}'",
                path.display()
            ))),
        }
    }

    pub fn strategy(&self) -> Box<dyn IngestionStrategy> {
        match self {
            IngestionFormat::Csv => Box::new(CsvIngestion),
            IngestionFormat::Json => Box::new(JsonIngestion),
            IngestionFormat::Xml => Box::new(XmlIngestion),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionFormat::Csv => "csv",
            IngestionFormat::Json => "json",
            IngestionFormat::Xml => "xml",
        }
    }
}

impl FromStr for IngestionFormat {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(IngestionFormat::Csv),
            "json" => Ok(IngestionFormat::Json),
            "xml" => Ok(IngestionFormat::Xml),
            other => Err(DashboardError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for IngestionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds the active ingestion strategy.
pub struct IngestionContext {
    strategy: Box<dyn IngestionStrategy>,
}

impl IngestionContext {
    pub fn new(strategy: Box<dyn IngestionStrategy>) -> Self {
        Self { strategy }
    }

    pub fn for_format(format: IngestionFormat) -> Self {
        Self::new(format.strategy())
    }

    pub fn set_strategy(&mut self, strategy: Box<dyn IngestionStrategy>) {
        debug!("Ingestion strategy {} -> {}", self.strategy.name(), strategy.name());
        self.strategy = strategy;
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Delegate to the active strategy; the table is returned unchanged.
    pub fn ingest(&self, path: &Path) -> Result<Table> {
        info!("Ingesting {} with {} strategy", path.display(), self.strategy.name());
        let table = self.strategy.ingest_data(path)?;
        info!(
            "Ingested {} rows x {} columns from {}",
            table.height(),
            table.width(),
            path.display()
        );
        Ok(table)
    }
}

/// Read a whole source file, mapping a missing path to `NotFound` and
/// non-UTF-8 content to a `Parse` error for `format`.
pub(crate) fn read_source(path: &Path, format: &str) -> Result<String> {
    if !path.exists() {
        return Err(DashboardError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DashboardError::NotFound(path.to_path_buf()),
        _ => DashboardError::Io(e),
    })?;
    String::from_utf8(bytes).map_err(|e| {
        DashboardError::parse(
            format,
            format!(
                "{} is not valid UTF-8 (byte {})",
                path.display(),
                e.utf8_error().valid_up_to()
            ),
        )
    })
}
