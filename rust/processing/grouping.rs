//! Group-by rollups and column projections

use crate::coercion::currency_series;
use crate::error::Result;
use crate::processing::columns::{COUNTRY, DISCOUNT_BAND, PRODUCT, PROFIT, SALES};
use crate::processing::ProcessingStrategy;
use crate::table::Table;
use polars::prelude::*;

/// Sum one or more measures per key value.
///
/// Groups come out in first-seen key order. Rows with a null key are dropped.
/// Measures are summed as `Float64`; text measures go through currency parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBySum {
    name: String,
    key: String,
    measures: Vec<String>,
}

impl GroupBySum {
    pub fn new(name: impl Into<String>, key: impl Into<String>, measures: &[&str]) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            measures: measures.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn profit_by_country() -> Self {
        Self::new("profit-by-country", COUNTRY, &[PROFIT])
    }

    pub fn product_performance() -> Self {
        Self::new("product-performance", PRODUCT, &[SALES, PROFIT])
    }

    pub fn country_sales() -> Self {
        Self::new("country-sales", COUNTRY, &[SALES])
    }
}

impl ProcessingStrategy for GroupBySum {
    fn process_data(&self, table: &Table) -> Result<Table> {
        let mut required: Vec<&str> = vec![self.key.as_str()];
        required.extend(self.measures.iter().map(|m| m.as_str()));
        table.require_columns(&required)?;

        let mut working = vec![table.column(&self.key)?.clone()];
        for measure in &self.measures {
            working.push(currency_series(table.column(measure)?)?);
        }

        let agg_exprs: Vec<Expr> = self
            .measures
            .iter()
            .map(|m| col(m).sum().alias(m))
            .collect();

        let result = DataFrame::new(working)?
            .lazy()
            .filter(col(&self.key).is_not_null())
            .group_by_stable([col(&self.key)])
            .agg(agg_exprs)
            .collect()?;

        Ok(Table::new(result))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Pass-through column subset, row order kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProjection {
    name: String,
    columns: Vec<String>,
}

impl ColumnProjection {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn discount_impact() -> Self {
        Self::new("discount-impact", &[DISCOUNT_BAND, SALES, PROFIT])
    }
}

impl ProcessingStrategy for ColumnProjection {
    fn process_data(&self, table: &Table) -> Result<Table> {
        let names: Vec<&str> = self.columns.iter().map(|c| c.as_str()).collect();
        table.select(&names)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
