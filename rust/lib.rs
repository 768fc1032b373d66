//! Sales dashboard core
//!
//! Ingests a sales dataset (CSV, JSON or XML) into a [`table::Table`], derives
//! the dashboard's report tables from it and bundles everything for display.

pub mod coercion;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod ingestion;
pub mod observability;
pub mod processing;
pub mod table;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardBuilder, ReportBundle, ReportPayload};
pub use error::{DashboardError, Result};
pub use ingestion::{IngestionContext, IngestionFormat, IngestionStrategy};
pub use processing::{ChartKind, ProcessingContext, ProcessingStrategy, Report};
pub use table::{ColumnData, Table};
