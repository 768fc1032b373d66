//! Processing Module - report strategies over an ingested table
//!
//! Every report is a `ProcessingStrategy`: a deterministic function from the
//! raw table to a fresh derived table. The `ProcessingContext` holds the
//! active strategy; `Report` is the closed list of reports the dashboard shows.

pub mod correlation;
pub mod grouping;
pub mod trends;

pub use correlation::{CorrelationMatrix, CORRELATION_MEASURES};
pub use grouping::{ColumnProjection, GroupBySum};
pub use trends::{MonthlySales, SalesTrend};

use crate::error::{DashboardError, Result};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Column names of the sales dataset
pub mod columns {
    pub const DATE: &str = "Date";
    pub const YEAR: &str = "Year";
    pub const MONTH: &str = "Month";
    pub const SALES: &str = "Sales";
    pub const PROFIT: &str = "Profit";
    pub const COUNTRY: &str = "Country";
    pub const PRODUCT: &str = "Product";
    pub const DISCOUNT_BAND: &str = "Discount Band";
    pub const TOTAL_SALES: &str = "TotalSales";
    pub const MONTHLY_SALES: &str = "MonthlySales";
}

/// Processing Strategy Trait
pub trait ProcessingStrategy: Send + Sync {
    /// Derive a new table; the input is never modified
    fn process_data(&self, table: &Table) -> Result<Table>;

    fn name(&self) -> &str;
}

/// Holds the active processing strategy.
pub struct ProcessingContext {
    strategy: Box<dyn ProcessingStrategy>,
}

impl ProcessingContext {
    pub fn new(strategy: Box<dyn ProcessingStrategy>) -> Self {
        Self { strategy }
    }

    pub fn set_strategy(&mut self, strategy: Box<dyn ProcessingStrategy>) {
        debug!("Processing strategy {} -> {}", self.strategy.name(), strategy.name());
        self.strategy = strategy;
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn process(&self, table: &Table) -> Result<Table> {
        self.strategy.process_data(table)
    }
}

/// How the presentation layer draws a report
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    StackedBar,
    Scatter,
    Heatmap,
}

/// The reports built for the dashboard, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Report {
    SalesTrends,
    ProfitByCountry,
    ProductPerformance,
    DiscountImpact,
    MonthlySales,
    CountrySales,
    Correlation,
}

impl Report {
    pub fn all() -> Vec<Report> {
        vec![
            Report::SalesTrends,
            Report::ProfitByCountry,
            Report::ProductPerformance,
            Report::DiscountImpact,
            Report::MonthlySales,
            Report::CountrySales,
            Report::Correlation,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Report::SalesTrends => "sales-trends",
            Report::ProfitByCountry => "profit-by-country",
            Report::ProductPerformance => "product-performance",
            Report::DiscountImpact => "discount-impact",
            Report::MonthlySales => "monthly-sales",
            Report::CountrySales => "country-sales",
            Report::Correlation => "correlation",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Report::SalesTrends => "Sales Trends Over Time",
            Report::ProfitByCountry => "Profit Analysis by Country",
            Report::ProductPerformance => "Product Performance",
            Report::DiscountImpact => "Discount Impact on Sales",
            Report::MonthlySales => "Monthly Sales Distribution",
            Report::CountrySales => "Country-wise Sales Distribution",
            Report::Correlation => "Correlation Analysis",
        }
    }

    pub fn chart(&self) -> ChartKind {
        match self {
            Report::SalesTrends => ChartKind::Line,
            Report::ProfitByCountry | Report::MonthlySales | Report::CountrySales => ChartKind::Bar,
            Report::ProductPerformance => ChartKind::StackedBar,
            Report::DiscountImpact => ChartKind::Scatter,
            Report::Correlation => ChartKind::Heatmap,
        }
    }

    pub fn strategy(&self) -> Box<dyn ProcessingStrategy> {
        match self {
            Report::SalesTrends => Box::new(SalesTrend::default()),
            Report::ProfitByCountry => Box::new(GroupBySum::profit_by_country()),
            Report::ProductPerformance => Box::new(GroupBySum::product_performance()),
            Report::DiscountImpact => Box::new(ColumnProjection::discount_impact()),
            Report::MonthlySales => Box::new(MonthlySales::default()),
            Report::CountrySales => Box::new(GroupBySum::country_sales()),
            Report::Correlation => Box::new(CorrelationMatrix::default()),
        }
    }
}

impl FromStr for Report {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Report::all()
            .into_iter()
            .find(|r| r.id() == wanted)
            .ok_or_else(|| DashboardError::UnknownReport(s.to_string()))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
