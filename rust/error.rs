use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Input not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("{format} parse error: {message}")]
    Parse { format: String, message: String },

    #[error("Missing column '{column}'{}; available columns: {}",
        .suggestion.as_ref().map(|s| format!(" (did you mean '{}'?)", s)).unwrap_or_default(),
        .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },

    // Currency coercion maps failures to missing values instead of raising this.
    #[error("Coercion error: {0}")]
    Coercion(String),

    #[error("Unknown ingestion format: {0}")]
    UnknownFormat(String),

    #[error("Unknown report: {0}")]
    UnknownReport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl DashboardError {
    pub fn parse(format: &str, message: impl Into<String>) -> Self {
        DashboardError::Parse {
            format: format.to_string(),
            message: message.into(),
        }
    }
}

impl From<polars::error::PolarsError> for DashboardError {
    fn from(err: polars::error::PolarsError) -> Self {
        DashboardError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
