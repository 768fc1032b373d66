//! Dashboard configuration
//!
//! Defaults, overridden by environment variables (optionally from `.env`),
//! overridden in turn by CLI flags in the binaries.

use crate::error::{DashboardError, Result};
use crate::ingestion::IngestionFormat;
use crate::processing::Report;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_INPUT: &str = "SALES_DASHBOARD_INPUT";
pub const ENV_FORMAT: &str = "SALES_DASHBOARD_FORMAT";
pub const ENV_REPORTS: &str = "SALES_DASHBOARD_REPORTS";
pub const ENV_HOST: &str = "SALES_DASHBOARD_HOST";
pub const ENV_PORT: &str = "SALES_DASHBOARD_PORT";
pub const ENV_LOG: &str = "RUST_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Source file to ingest
    pub input: PathBuf,

    /// Ingestion format; inferred from the file extension when absent
    pub format: Option<IngestionFormat>,

    /// Reports to build, in order
    pub reports: Vec<Report>,

    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("datasets/Financials.csv"),
            format: None,
            reports: Report::all(),
            host: "127.0.0.1".to_string(),
            port: 8050,
            log_level: "info".to_string(),
        }
    }
}

/// Values given on the command line. A set field wins over its environment
/// variable, which is then not read at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub input: Option<PathBuf>,
    pub format: Option<IngestionFormat>,
    pub reports: Option<Vec<Report>>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ConfigOverrides {
    fn shadowed_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.input.is_some() {
            keys.push(ENV_INPUT);
        }
        if self.format.is_some() {
            keys.push(ENV_FORMAT);
        }
        if self.reports.is_some() {
            keys.push(ENV_REPORTS);
        }
        if self.host.is_some() {
            keys.push(ENV_HOST);
        }
        if self.port.is_some() {
            keys.push(ENV_PORT);
        }
        keys
    }

    fn apply(self, config: &mut DashboardConfig) {
        if let Some(input) = self.input {
            config.input = input;
        }
        if self.format.is_some() {
            config.format = self.format;
        }
        if let Some(reports) = self.reports {
            config.reports = reports;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
    }
}

impl DashboardConfig {
    /// Load `.env` (if any) and apply environment overrides to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::load(ConfigOverrides::default())
    }

    /// Defaults, then `.env` and the environment, then command-line values.
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup_with(|key| std::env::var(key).ok(), overrides)
    }

    /// Like `from_lookup`, skipping keys that `overrides` already decides.
    pub fn from_lookup_with<F>(lookup: F, overrides: ConfigOverrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let shadowed = overrides.shadowed_keys();
        let mut config = Self::from_lookup(|key| {
            if shadowed.iter().any(|k| *k == key) {
                None
            } else {
                lookup(key)
            }
        })?;
        overrides.apply(&mut config);
        Ok(config)
    }

    /// Apply overrides from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(input) = lookup(ENV_INPUT).filter(|v| !v.trim().is_empty()) {
            config.input = PathBuf::from(input.trim());
        }
        if let Some(format) = lookup(ENV_FORMAT).filter(|v| !v.trim().is_empty()) {
            config.format = Some(format.parse()?);
        }
        if let Some(reports) = lookup(ENV_REPORTS).filter(|v| !v.trim().is_empty()) {
            config.reports = parse_report_list(&reports)?;
        }
        if let Some(host) = lookup(ENV_HOST).filter(|v| !v.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup(ENV_PORT).filter(|v| !v.trim().is_empty()) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| DashboardError::Config(format!("invalid port '{}'", port)))?;
        }
        if let Some(level) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Format to ingest with: explicit, else from the input's extension.
    pub fn resolved_format(&self) -> Result<IngestionFormat> {
        match self.format {
            Some(format) => Ok(format),
            None => IngestionFormat::from_path(&self.input),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a comma-separated list of report ids.
pub fn parse_report_list(raw: &str) -> Result<Vec<Report>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.reports.len(), 7);
        assert_eq!(config.resolved_format().unwrap(), IngestionFormat::Csv);
        assert_eq!(config.bind_address(), "127.0.0.1:8050");
    }

    #[test]
    fn test_overrides() {
        let config = DashboardConfig::from_lookup(lookup_from(&[
            (ENV_INPUT, "data/sales.dat"),
            (ENV_FORMAT, "json"),
            (ENV_REPORTS, "correlation, sales-trends"),
            (ENV_PORT, "9000"),
        ]))
        .unwrap();
        assert_eq!(config.input, PathBuf::from("data/sales.dat"));
        assert_eq!(config.resolved_format().unwrap(), IngestionFormat::Json);
        assert_eq!(config.reports, vec![Report::Correlation, Report::SalesTrends]);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DashboardConfig::from_lookup(lookup_from(&[(ENV_PORT, "eighty")])),
            Err(DashboardError::Config(_))
        ));
        assert!(matches!(
            DashboardConfig::from_lookup(lookup_from(&[(ENV_REPORTS, "sales-trends,bogus")])),
            Err(DashboardError::UnknownReport(_))
        ));
        assert!(matches!(
            DashboardConfig::from_lookup(lookup_from(&[(ENV_FORMAT, "yaml")])),
            Err(DashboardError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_command_line_shadows_invalid_environment() {
        let lookup = lookup_from(&[
            (ENV_FORMAT, "yaml"),
            (ENV_PORT, "eighty"),
            (ENV_REPORTS, "bogus"),
            (ENV_HOST, "0.0.0.0"),
        ]);
        let config = DashboardConfig::from_lookup_with(
            lookup,
            ConfigOverrides {
                format: Some(IngestionFormat::Xml),
                port: Some(9100),
                reports: Some(vec![Report::CountrySales]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.format, Some(IngestionFormat::Xml));
        assert_eq!(config.port, 9100);
        assert_eq!(config.reports, vec![Report::CountrySales]);
        // not overridden, so the environment still applies
        assert_eq!(config.host, "0.0.0.0");

        assert!(matches!(
            DashboardConfig::from_lookup_with(
                lookup_from(&[(ENV_PORT, "eighty")]),
                ConfigOverrides {
                    format: Some(IngestionFormat::Csv),
                    ..Default::default()
                },
            ),
            Err(DashboardError::Config(_))
        ));
    }
}
