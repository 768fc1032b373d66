//! JSON Ingestion - a single JSON document flattened into rows

use crate::error::{DashboardError, Result};
use crate::ingestion::{read_source, IngestionStrategy};
use crate::table::{Cell, Table};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// JSON Ingestion
///
/// Accepted shapes:
/// - array of objects: one row per object
/// - object of arrays: one column per key
/// - any other object: a single row
/// - array of scalars: a single `value` column
///
/// Nested objects/arrays inside a row are kept as JSON text.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonIngestion;

impl JsonIngestion {
    pub fn parse_text(text: &str) -> Result<Table> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| DashboardError::parse("json", e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Table> {
        match value {
            Value::Array(items) if items.is_empty() => {
                Err(DashboardError::EmptyInput("JSON array has no elements".to_string()))
            }
            Value::Array(items) if items.iter().all(Value::is_object) => {
                let rows: Vec<&Map<String, Value>> = items.iter().filter_map(Value::as_object).collect();
                rows_to_table(&rows)
            }
            Value::Array(items) => {
                let cells: Vec<Cell> = items.iter().map(json_cell).collect();
                Table::from_cells(&["value".to_string()], &[cells])
            }
            Value::Object(map) if map.is_empty() => {
                Err(DashboardError::EmptyInput("JSON object has no keys".to_string()))
            }
            Value::Object(map) if map.values().all(Value::is_array) => columns_to_table(map),
            Value::Object(map) => rows_to_table(&[map]),
            _ => Err(DashboardError::parse(
                "json",
                "expected an object or an array at the document root",
            )),
        }
    }
}

impl IngestionStrategy for JsonIngestion {
    fn ingest_data(&self, path: &Path) -> Result<Table> {
        let text = read_source(path, self.name())?;
        Self::parse_text(&text)
    }

    fn name(&self) -> &str {
        "json"
    }
}

/// Scalars keep their JSON type; nested values become their JSON text.
fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Text(b.to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
        },
        Value::String(s) => Cell::Text(s.clone()),
        nested => Cell::Text(nested.to_string()),
    }
}

fn rows_to_table(rows: &[&Map<String, Value>]) -> Result<Table> {
    let mut names: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for row in rows {
        for key in row.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), names.len());
                names.push(key.clone());
            }
        }
    }

    let columns: Vec<Vec<Cell>> = names
        .iter()
        .map(|name| {
            rows.iter()
                .map(|row| row.get(name).map(json_cell).unwrap_or(Cell::Null))
                .collect()
        })
        .collect();

    Table::from_cells(&names, &columns)
}

fn columns_to_table(map: &Map<String, Value>) -> Result<Table> {
    let height = map
        .values()
        .filter_map(Value::as_array)
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    if height == 0 {
        return Err(DashboardError::EmptyInput("JSON columns have no values".to_string()));
    }

    let names: Vec<String> = map.keys().cloned().collect();
    let columns: Vec<Vec<Cell>> = map
        .values()
        .filter_map(Value::as_array)
        .map(|values| {
            (0..height)
                .map(|i| values.get(i).map(json_cell).unwrap_or(Cell::Null))
                .collect()
        })
        .collect();

    Table::from_cells(&names, &columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_array_of_objects() {
        let table = JsonIngestion::parse_text(
            r#"[{"Country": "US", "Profit": 50}, {"Country": "UK", "Profit": 60.5, "Note": "x"}]"#,
        )
        .unwrap();
        assert_eq!(table.column_names(), vec!["Country", "Profit", "Note"]);
        assert_eq!(table.height(), 2);
        assert_eq!(table.column("Profit").unwrap().dtype(), &DataType::Float64);
        assert_eq!(table.column("Note").unwrap().null_count(), 1);
    }

    #[test]
    fn test_object_of_arrays() {
        let table = JsonIngestion::parse_text(r#"{"a": [1, 2, 3], "b": ["x", "y"]}"#).unwrap();
        assert_eq!(table.shape(), (3, 2));
        assert_eq!(table.column("b").unwrap().null_count(), 1);
        assert_eq!(table.column("a").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_single_object_and_nesting() {
        let table = JsonIngestion::parse_text(r#"{"name": "A", "tags": {"k": 1}, "ok": true}"#).unwrap();
        assert_eq!(table.height(), 1);
        assert_eq!(
            table.column("tags").unwrap().str().unwrap().get(0),
            Some(r#"{"k":1}"#)
        );
        assert_eq!(table.column("ok").unwrap().str().unwrap().get(0), Some("true"));
    }

    #[test]
    fn test_strings_stay_text() {
        let table = JsonIngestion::parse_text(r#"[{"zip": "01234"}]"#).unwrap();
        assert_eq!(table.column("zip").unwrap().str().unwrap().get(0), Some("01234"));
    }

    #[test]
    fn test_scalar_array() {
        let table = JsonIngestion::parse_text("[1, 2, null]").unwrap();
        assert_eq!(table.column_names(), vec!["value"]);
        assert_eq!(table.height(), 3);
    }

    #[test]
    fn test_empty_and_invalid() {
        assert!(matches!(JsonIngestion::parse_text("[]"), Err(DashboardError::EmptyInput(_))));
        assert!(matches!(JsonIngestion::parse_text("{}"), Err(DashboardError::EmptyInput(_))));
        assert!(matches!(JsonIngestion::parse_text("42"), Err(DashboardError::Parse { .. })));
        assert!(matches!(JsonIngestion::parse_text("{oops"), Err(DashboardError::Parse { .. })));
    }
}
