//! Table - column-oriented in-memory table shared by ingestion, reports and presentation
//!
//! A thin wrapper over a polars `DataFrame`. The optional index carries row
//! labels for tables whose rows are named (the correlation matrix).

use crate::error::{DashboardError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

/// Minimum Jaro-Winkler similarity for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A single scalar cell as read from a source file, before column typing.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Infer a cell from raw text: blank/whitespace is null, numbers become numeric.
    pub fn from_raw(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Null;
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return Cell::Int(i);
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_nan() {
                return Cell::Null;
            }
            return Cell::Float(f);
        }

        Cell::Text(trimmed.to_string())
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

/// Build one typed series from a column of cells.
///
/// All integers give `Int64`, any mix of numbers gives `Float64`, and any text
/// (or a column with no values at all) gives `String`.
pub fn build_series(name: &str, cells: &[Cell]) -> Series {
    let has_text = cells.iter().any(|c| matches!(c, Cell::Text(_)));
    let has_float = cells.iter().any(|c| matches!(c, Cell::Float(_)));
    let has_int = cells.iter().any(|c| matches!(c, Cell::Int(_)));

    if has_text || (!has_float && !has_int) {
        let values: Vec<Option<String>> = cells.iter().map(Cell::as_text).collect();
        return Series::new(name, values);
    }

    if has_float {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Cell::Int(i) => Some(*i as f64),
                Cell::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        return Series::new(name, values);
    }

    let values: Vec<Option<i64>> = cells
        .iter()
        .map(|c| match c {
            Cell::Int(i) => Some(*i),
            _ => None,
        })
        .collect();
    Series::new(name, values)
}

/// Make header names unique: blanks become `Unnamed: <idx>`, repeats get `.1`, `.2`, ...
pub fn unique_column_names(raw: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (idx, name) in raw.iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name.trim().to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

/// Column-oriented view of a table column, as handed to chart widgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnData {
    pub name: String,
    pub dtype: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct Table {
    frame: DataFrame,
    index: Option<Vec<String>>,
}

impl Table {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame, index: None }
    }

    /// Attach row labels. The label count must match the row count.
    pub fn with_index(frame: DataFrame, index: Vec<String>) -> Result<Self> {
        if index.len() != frame.height() {
            return Err(DashboardError::Polars(format!(
                "index has {} labels but table has {} rows",
                index.len(),
                frame.height()
            )));
        }
        Ok(Self {
            frame,
            index: Some(index),
        })
    }

    /// Build a table from named cell columns, inferring each column's type.
    pub fn from_cells(names: &[String], columns: &[Vec<Cell>]) -> Result<Self> {
        let names = unique_column_names(names);
        let series: Vec<Series> = names
            .iter()
            .zip(columns.iter())
            .map(|(name, cells)| build_series(name, cells))
            .collect();
        Ok(Self::new(DataFrame::new(series)?))
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn index(&self) -> Option<&[String]> {
        self.index.as_deref()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.frame.shape()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Look up a column, failing with `MissingColumn` when absent.
    pub fn column(&self, name: &str) -> Result<&Series> {
        self.frame
            .column(name)
            .map_err(|_| self.missing_column(name))
    }

    /// Fail on the first name that is not a column of this table.
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        for name in names {
            if !self.has_column(name) {
                return Err(self.missing_column(name));
            }
        }
        Ok(())
    }

    /// Column subset in the requested order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        self.require_columns(names)?;
        let frame = self.frame.select(names.iter().copied())?;
        Ok(Table::new(frame))
    }

    /// Projection for the column-visibility toggle.
    ///
    /// Keeps this table's own column order and ignores unknown names. An empty
    /// selection yields a table without columns.
    pub fn select_visible(&self, selected: &[String]) -> Table {
        let wanted: HashSet<&str> = selected.iter().map(|s| s.as_str()).collect();
        let names: Vec<String> = self
            .column_names()
            .into_iter()
            .filter(|n| wanted.contains(n.as_str()))
            .collect();

        if names.is_empty() {
            return Table::new(DataFrame::empty());
        }

        // Every name comes from this frame, so selection cannot fail.
        match self.frame.select(names.iter().map(|s| s.as_str())) {
            Ok(frame) => Table::new(frame),
            Err(_) => Table::new(DataFrame::empty()),
        }
    }

    /// Row-oriented records for the data grid.
    pub fn to_records(&self) -> Result<Vec<Value>> {
        let columns = self.frame.get_columns();
        let mut records = Vec::with_capacity(self.height());

        for row in 0..self.height() {
            let mut obj = Map::new();
            for series in columns {
                obj.insert(series.name().to_string(), any_to_json(series.get(row)?));
            }
            records.push(Value::Object(obj));
        }

        Ok(records)
    }

    /// Column-oriented values for chart traces.
    pub fn to_columns(&self) -> Result<Vec<ColumnData>> {
        let mut out = Vec::with_capacity(self.width());
        for series in self.frame.get_columns() {
            let mut values = Vec::with_capacity(series.len());
            for row in 0..series.len() {
                values.push(any_to_json(series.get(row)?));
            }
            out.push(ColumnData {
                name: series.name().to_string(),
                dtype: series.dtype().to_string(),
                values,
            });
        }
        Ok(out)
    }

    fn missing_column(&self, name: &str) -> DashboardError {
        let available = self.column_names();
        let suggestion = available
            .iter()
            .map(|c| (c, strsim::jaro_winkler(&c.to_lowercase(), &name.to_lowercase())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c.clone());

        DashboardError::MissingColumn {
            column: name.to_string(),
            available,
            suggestion,
        }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.frame.equals_missing(&other.frame)
    }
}

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn date_to_epoch_days(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

fn float_to_json(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn any_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(v as f64),
        AnyValue::Float64(v) => float_to_json(v),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Date(days) => epoch_days_to_date(days)
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let frame = df![
            "Country" => ["US", "UK"],
            "Sales" => [10.0, 20.5],
            "Units" => [1i64, 2]
        ]
        .unwrap();
        Table::new(frame)
    }

    #[test]
    fn test_cell_inference() {
        assert_eq!(Cell::from_raw("  "), Cell::Null);
        assert_eq!(Cell::from_raw(""), Cell::Null);
        assert_eq!(Cell::from_raw(" 42 "), Cell::Int(42));
        assert_eq!(Cell::from_raw("4.5"), Cell::Float(4.5));
        assert_eq!(Cell::from_raw(" a"), Cell::Text("a".to_string()));
        assert_eq!(Cell::from_raw("$1,000"), Cell::Text("$1,000".to_string()));
    }

    #[test]
    fn test_build_series_types() {
        let ints = build_series("a", &[Cell::Int(1), Cell::Null]);
        assert_eq!(ints.dtype(), &DataType::Int64);
        assert_eq!(ints.null_count(), 1);

        let floats = build_series("b", &[Cell::Int(1), Cell::Float(2.5)]);
        assert_eq!(floats.dtype(), &DataType::Float64);

        let text = build_series("c", &[Cell::Int(1), Cell::Text("x".to_string())]);
        assert_eq!(text.dtype(), &DataType::String);
        assert_eq!(text.str().unwrap().get(0), Some("1"));

        let empty = build_series("d", &[Cell::Null, Cell::Null]);
        assert_eq!(empty.dtype(), &DataType::String);
        assert_eq!(empty.null_count(), 2);
    }

    #[test]
    fn test_unique_column_names() {
        let raw = vec![
            "a".to_string(),
            "a".to_string(),
            " ".to_string(),
            "a".to_string(),
        ];
        assert_eq!(
            unique_column_names(&raw),
            vec!["a", "a.1", "Unnamed: 2", "a.2"]
        );
    }

    #[test]
    fn test_missing_column_suggestion() {
        let table = sample();
        match table.column("country") {
            Err(DashboardError::MissingColumn { column, suggestion, available }) => {
                assert_eq!(column, "country");
                assert_eq!(suggestion.as_deref(), Some("Country"));
                assert_eq!(available.len(), 3);
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_select_visible_keeps_table_order() {
        let table = sample();
        let visible = table.select_visible(&["Units".to_string(), "Country".to_string(), "Nope".to_string()]);
        assert_eq!(visible.column_names(), vec!["Country", "Units"]);
        assert_eq!(visible.height(), 2);

        let none = table.select_visible(&[]);
        assert_eq!(none.width(), 0);
    }

    #[test]
    fn test_records_and_columns() {
        let table = sample();
        let records = table.to_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Country"], Value::String("US".to_string()));
        assert_eq!(records[1]["Sales"], serde_json::json!(20.5));
        assert_eq!(records[1]["Units"], serde_json::json!(2));

        let columns = table.to_columns().unwrap();
        assert_eq!(columns[0].name, "Country");
        assert_eq!(columns[2].values, vec![serde_json::json!(1), serde_json::json!(2)]);
    }

    #[test]
    fn test_epoch_days_round_trip_anchor() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_epoch_days(epoch), 0);
        let d = NaiveDate::from_ymd_opt(2022, 2, 1).unwrap();
        assert_eq!(epoch_days_to_date(date_to_epoch_days(d)), Some(d));
    }
}
