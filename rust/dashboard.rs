//! Dashboard assembly
//!
//! `DashboardBuilder` ingests the source once and runs the selected reports
//! through a single `ProcessingContext`. The resulting `Dashboard` can be
//! flattened into a serializable `ReportBundle` for the CLI and the server.

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::ingestion::{IngestionContext, IngestionFormat};
use crate::observability::BuildLog;
use crate::processing::{ChartKind, ProcessingContext, Report};
use crate::table::{ColumnData, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

const INGEST_STEP: &str = "ingest";

pub struct DashboardBuilder {
    input: PathBuf,
    format: Option<IngestionFormat>,
    reports: Vec<Report>,
}

impl DashboardBuilder {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            format: None,
            reports: Report::all(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            input: config.input.clone(),
            format: config.format,
            reports: config.reports.clone(),
        }
    }

    pub fn format(mut self, format: IngestionFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn reports(mut self, reports: Vec<Report>) -> Self {
        self.reports = reports;
        self
    }

    /// Ingest, then build every selected report in order.
    ///
    /// The first failing step aborts the build and its error is returned as is.
    pub fn build(&self) -> Result<Dashboard> {
        let format = match self.format {
            Some(format) => format,
            None => IngestionFormat::from_path(&self.input)?,
        };
        let mut log = BuildLog::new();

        let started = Instant::now();
        let raw = match IngestionContext::for_format(format).ingest(&self.input) {
            Ok(table) => table,
            Err(e) => {
                log.log_failure(INGEST_STEP, &e.to_string(), started);
                return Err(e);
            }
        };
        log.log_success(INGEST_STEP, raw.shape(), started);

        let mut reports = Vec::with_capacity(self.reports.len());
        if let Some(first) = self.reports.first() {
            let mut context = ProcessingContext::new(first.strategy());
            for (i, report) in self.reports.iter().enumerate() {
                if i > 0 {
                    context.set_strategy(report.strategy());
                }
                let started = Instant::now();
                match context.process(&raw) {
                    Ok(table) => {
                        log.log_success(report.id(), table.shape(), started);
                        reports.push((*report, table));
                    }
                    Err(e) => {
                        log.log_failure(report.id(), &e.to_string(), started);
                        return Err(e);
                    }
                }
            }
        }

        info!(
            "Built {} reports from {} in {} ms",
            reports.len(),
            self.input.display(),
            log.total_elapsed_ms()
        );

        Ok(Dashboard {
            source: self.input.clone(),
            format,
            raw,
            reports,
            log,
        })
    }
}

/// Raw table plus the derived report tables, in report order.
#[derive(Debug, Clone)]
pub struct Dashboard {
    source: PathBuf,
    format: IngestionFormat,
    raw: Table,
    reports: Vec<(Report, Table)>,
    log: BuildLog,
}

impl Dashboard {
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn format(&self) -> IngestionFormat {
        self.format
    }

    pub fn raw(&self) -> &Table {
        &self.raw
    }

    pub fn reports(&self) -> &[(Report, Table)] {
        &self.reports
    }

    pub fn report(&self, report: Report) -> Option<&Table> {
        self.reports
            .iter()
            .find(|(r, _)| *r == report)
            .map(|(_, table)| table)
    }

    pub fn log(&self) -> &BuildLog {
        &self.log
    }

    /// The raw table restricted to the columns ticked in the grid.
    pub fn visible_table(&self, columns: &[String]) -> Table {
        self.raw.select_visible(columns)
    }

    pub fn bundle(&self) -> Result<ReportBundle> {
        let reports = self
            .reports
            .iter()
            .map(|(report, table)| ReportPayload::new(*report, table))
            .collect::<Result<Vec<_>>>()?;

        Ok(ReportBundle {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            source: self.source.display().to_string(),
            format: self.format,
            raw: RawTable::new(&self.raw)?,
            reports,
            build_log: self.log.clone(),
        })
    }
}

/// Everything the presentation layer needs, ready for JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBundle {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub format: IngestionFormat,
    pub raw: RawTable,
    pub reports: Vec<ReportPayload>,
    pub build_log: BuildLog,
}

impl ReportBundle {
    pub fn report(&self, id: &str) -> Option<&ReportPayload> {
        self.reports.iter().find(|r| r.id == id)
    }
}

/// The raw table as grid rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<Value>,
}

impl RawTable {
    pub fn new(table: &Table) -> Result<Self> {
        Ok(Self {
            columns: table.column_names(),
            records: table.to_records()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportPayload {
    pub id: String,
    pub title: String,
    pub chart: ChartKind,
    pub columns: Vec<String>,
    pub values: Vec<ColumnData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub index: Option<Vec<String>>,
}

impl ReportPayload {
    pub fn new(report: Report, table: &Table) -> Result<Self> {
        Ok(Self {
            id: report.id().to_string(),
            title: report.title().to_string(),
            chart: report.chart(),
            columns: table.column_names(),
            values: table.to_columns()?,
            index: table.index().map(|labels| labels.to_vec()),
        })
    }
}
