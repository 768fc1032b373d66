//! Date-based rollups: monthly trend over time and month-of-year distribution

use crate::coercion::{currency_series, date_values};
use crate::error::Result;
use crate::processing::columns::{DATE, MONTH, MONTHLY_SALES, SALES, TOTAL_SALES, YEAR};
use crate::processing::ProcessingStrategy;
use crate::table::{date_to_epoch_days, Table};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Total sales per calendar (year, month).
///
/// Output columns: `Date` (first of month), `Year`, `Month`, `TotalSales`.
/// Any date that does not parse fails the whole report.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesTrend {
    date_column: String,
    measure_column: String,
}

impl SalesTrend {
    pub fn new(date_column: impl Into<String>, measure_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
            measure_column: measure_column.into(),
        }
    }
}

impl Default for SalesTrend {
    fn default() -> Self {
        Self::new(DATE, SALES)
    }
}

impl ProcessingStrategy for SalesTrend {
    fn process_data(&self, table: &Table) -> Result<Table> {
        table.require_columns(&[self.date_column.as_str(), self.measure_column.as_str()])?;

        let dates = date_values(table.column(&self.date_column)?)?;
        let mut measure = currency_series(table.column(&self.measure_column)?)?;
        measure.rename(TOTAL_SALES);

        let years: Vec<i32> = dates.iter().map(|d| d.year()).collect();
        let months: Vec<i32> = dates.iter().map(|d| d.month() as i32).collect();

        let grouped = DataFrame::new(vec![
            Series::new(YEAR, years),
            Series::new(MONTH, months),
            measure,
        ])?
        .lazy()
        .group_by_stable([col(YEAR), col(MONTH)])
        .agg([col(TOTAL_SALES).sum()])
        .collect()?;

        let year_col = grouped.column(YEAR)?;
        let month_col = grouped.column(MONTH)?;
        let first_of_month: Vec<Option<i32>> = year_col
            .i32()?
            .into_iter()
            .zip(month_col.i32()?.into_iter())
            .map(|(y, m)| match (y, m) {
                (Some(y), Some(m)) => NaiveDate::from_ymd_opt(y, m as u32, 1).map(date_to_epoch_days),
                _ => None,
            })
            .collect();
        let date = Series::new(DATE, first_of_month).cast(&DataType::Date)?;

        let result = DataFrame::new(vec![
            date,
            year_col.clone(),
            month_col.clone(),
            grouped.column(TOTAL_SALES)?.clone(),
        ])?;

        Ok(Table::new(result))
    }

    fn name(&self) -> &str {
        "sales-trends"
    }
}

/// Total sales per month number, years collapsed.
///
/// Output columns: `Date` (month number 1-12), `MonthlySales`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySales {
    date_column: String,
    measure_column: String,
}

impl MonthlySales {
    pub fn new(date_column: impl Into<String>, measure_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
            measure_column: measure_column.into(),
        }
    }
}

impl Default for MonthlySales {
    fn default() -> Self {
        Self::new(DATE, SALES)
    }
}

impl ProcessingStrategy for MonthlySales {
    fn process_data(&self, table: &Table) -> Result<Table> {
        table.require_columns(&[self.date_column.as_str(), self.measure_column.as_str()])?;

        let dates = date_values(table.column(&self.date_column)?)?;
        let mut measure = currency_series(table.column(&self.measure_column)?)?;
        measure.rename(MONTHLY_SALES);

        let months: Vec<i32> = dates.iter().map(|d| d.month() as i32).collect();

        let result = DataFrame::new(vec![Series::new(DATE, months), measure])?
            .lazy()
            .group_by_stable([col(DATE)])
            .agg([col(MONTHLY_SALES).sum()])
            .collect()?;

        Ok(Table::new(result))
    }

    fn name(&self) -> &str {
        "monthly-sales"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;

    fn daily() -> Table {
        Table::new(
            df![
                "Date" => ["2022-01-01", "2022-01-15", "2022-02-01", "2023-01-10"],
                "Sales" => [100i64, 50, 200, 25]
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_trend_rolls_up_year_month() {
        let input = Table::new(
            df![
                "Date" => ["2022-01-01", "2022-01-15", "2022-02-01"],
                "Sales" => [100i64, 50, 200]
            ]
            .unwrap(),
        );
        let out = SalesTrend::default().process_data(&input).unwrap();
        assert_eq!(out.column_names(), vec!["Date", "Year", "Month", "TotalSales"]);
        assert_eq!(out.height(), 2);

        let rows: Vec<(i32, i32, f64)> = out
            .column("Year").unwrap().i32().unwrap().into_iter()
            .zip(out.column("Month").unwrap().i32().unwrap().into_iter())
            .zip(out.column("TotalSales").unwrap().f64().unwrap().into_iter())
            .map(|((y, m), t)| (y.unwrap(), m.unwrap(), t.unwrap()))
            .collect();
        assert_eq!(rows, vec![(2022, 1, 150.0), (2022, 2, 200.0)]);

        assert_eq!(out.column("Date").unwrap().dtype(), &DataType::Date);
        let records = out.to_records().unwrap();
        assert_eq!(records[1]["Date"], serde_json::json!("2022-02-01"));
    }

    #[test]
    fn test_trend_keeps_years_apart() {
        let out = SalesTrend::default().process_data(&daily()).unwrap();
        assert_eq!(out.height(), 3);
    }

    #[test]
    fn test_trend_bad_date_is_hard_failure() {
        let input = Table::new(
            df![
                "Date" => ["2022-01-01", "someday"],
                "Sales" => [1.0, 2.0]
            ]
            .unwrap(),
        );
        assert!(matches!(
            SalesTrend::default().process_data(&input),
            Err(DashboardError::Parse { .. })
        ));
    }

    #[test]
    fn test_monthly_collapses_years() {
        let out = MonthlySales::default().process_data(&daily()).unwrap();
        assert_eq!(out.column_names(), vec!["Date", "MonthlySales"]);
        let rows: Vec<(i32, f64)> = out
            .column("Date").unwrap().i32().unwrap().into_iter()
            .zip(out.column("MonthlySales").unwrap().f64().unwrap().into_iter())
            .map(|(m, s)| (m.unwrap(), s.unwrap()))
            .collect();
        assert_eq!(rows, vec![(1, 175.0), (2, 200.0)]);
    }

    #[test]
    fn test_missing_date_column() {
        let input = Table::new(df!["Sales" => [1.0]].unwrap());
        assert!(matches!(
            MonthlySales::default().process_data(&input),
            Err(DashboardError::MissingColumn { .. })
        ));
    }
}
