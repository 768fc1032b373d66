//! CSV Ingestion - comma-separated text with a header row

use crate::error::{DashboardError, Result};
use crate::ingestion::{read_source, IngestionStrategy};
use crate::table::{Cell, Table};
use csv::ReaderBuilder;
use std::path::Path;

/// CSV Ingestion - header row names the columns, types are inferred per column.
///
/// Only commas are recognised as delimiters; a file using another separator
/// reads as a single text column.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvIngestion;

impl CsvIngestion {
    pub fn parse_text(text: &str) -> Result<Table> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = rdr.records();

        let headers: Vec<String> = match records.next() {
            Some(header) => header
                .map_err(|e| DashboardError::parse("csv", format!("Failed to read CSV headers: {}", e)))?
                .iter()
                .map(|h| h.trim().to_string())
                .collect(),
            None => return Err(DashboardError::EmptyInput("no columns to parse from file".to_string())),
        };

        let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
        for result in records {
            let record = result
                .map_err(|e| DashboardError::parse("csv", format!("Failed to read CSV record: {}", e)))?;

            if record.len() > headers.len() {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                return Err(DashboardError::parse(
                    "csv",
                    format!(
                        "expected {} fields on line {}, saw {}",
                        headers.len(),
                        line,
                        record.len()
                    ),
                ));
            }

            for (idx, column) in columns.iter_mut().enumerate() {
                let cell = record.get(idx).map(Cell::from_raw).unwrap_or(Cell::Null);
                column.push(cell);
            }
        }

        if columns.first().map(|c| c.is_empty()).unwrap_or(true) {
            return Err(DashboardError::EmptyInput("header row but no data rows".to_string()));
        }

        Table::from_cells(&headers, &columns)
    }
}

impl IngestionStrategy for CsvIngestion {
    fn ingest_data(&self, path: &Path) -> Result<Table> {
        let text = read_source(path, self.name())?;
        Self::parse_text(&text)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_parse_valid_csv() {
        let table = CsvIngestion::parse_text("col1,col2\n1,3\n2,4\n").unwrap();
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.column_names(), vec!["col1", "col2"]);
        assert_eq!(table.column("col1").unwrap().dtype(), &DataType::Int64);
        assert_eq!(table.column("col2").unwrap().i64().unwrap().get(1), Some(4));
    }

    #[test]
    fn test_type_inference_per_column() {
        let table = CsvIngestion::parse_text("a,b,c\n1,1.5,x\n2,2,y\n").unwrap();
        assert_eq!(table.column("a").unwrap().dtype(), &DataType::Int64);
        assert_eq!(table.column("b").unwrap().dtype(), &DataType::Float64);
        assert_eq!(table.column("c").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_anomalies_become_null() {
        let table = CsvIngestion::parse_text("Column1, Column2\n1, a\n2, \n ,").unwrap();
        assert_eq!(table.column_names(), vec!["Column1", "Column2"]);
        assert_eq!(table.height(), 3);
        let nulls: usize = table.frame().get_columns().iter().map(|s| s.null_count()).sum();
        assert_eq!(nulls, 3);
        assert_eq!(table.column("Column2").unwrap().str().unwrap().get(0), Some("a"));
    }

    #[test]
    fn test_other_delimiter_is_single_column() {
        let table = CsvIngestion::parse_text("Column1;Column2\n1;a\n2;b\n3;c\n").unwrap();
        assert_eq!(table.column_names(), vec!["Column1;Column2"]);
        assert_eq!(table.height(), 3);
        assert_eq!(table.column("Column1;Column2").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_empty_and_header_only() {
        assert!(matches!(
            CsvIngestion::parse_text(""),
            Err(DashboardError::EmptyInput(_))
        ));
        assert!(matches!(
            CsvIngestion::parse_text("a,b\n"),
            Err(DashboardError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_short_rows_padded_long_rows_rejected() {
        let table = CsvIngestion::parse_text("a,b,c\n1,2\n").unwrap();
        assert_eq!(table.column("c").unwrap().null_count(), 1);

        assert!(matches!(
            CsvIngestion::parse_text("a,b\n1,2,3\n"),
            Err(DashboardError::Parse { .. })
        ));
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() {
        let table = CsvIngestion::parse_text("x,x\n1,2\n").unwrap();
        assert_eq!(table.column_names(), vec!["x", "x.1"]);
    }
}
