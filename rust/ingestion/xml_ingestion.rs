//! XML Ingestion - best-effort reader for two-level record documents
//!
//! Expected shape:
//!
//! ```xml
//! <records>
//!   <record><Country>US</Country><Sales>100</Sales></record>
//!   <record><Country>UK</Country></record>
//! </records>
//! ```
//!
//! Each child of the root is a row; its own element children supply
//! tag -> text pairs. Attributes, namespaces and mixed content are ignored,
//! and rows that lack a tag get a null rather than an error.

use crate::error::{DashboardError, Result};
use crate::ingestion::{read_source, IngestionStrategy};
use crate::table::{Cell, Table};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct XmlIngestion;

impl XmlIngestion {
    pub fn parse_text(text: &str) -> Result<Table> {
        let doc = roxmltree::Document::parse(text)
            .map_err(|e| DashboardError::parse("xml", e.to_string()))?;
        let root = doc.root_element();

        let mut names: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut rows: Vec<HashMap<String, Cell>> = Vec::new();

        for record in root.children().filter(|n| n.is_element()) {
            let mut row = HashMap::new();
            for field in record.children().filter(|n| n.is_element()) {
                let tag = field.tag_name().name().to_string();
                if !positions.contains_key(&tag) {
                    positions.insert(tag.clone(), names.len());
                    names.push(tag.clone());
                }
                let cell = field.text().map(Cell::from_raw).unwrap_or(Cell::Null);
                // A repeated tag keeps its last value
                row.insert(tag, cell);
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(DashboardError::EmptyInput(format!(
                "<{}> has no child elements",
                root.tag_name().name()
            )));
        }
        if names.is_empty() {
            return Err(DashboardError::EmptyInput(format!(
                "{} <{}> records carry no field elements",
                rows.len(),
                root.tag_name().name()
            )));
        }

        let columns: Vec<Vec<Cell>> = names
            .iter()
            .map(|name| {
                rows.iter()
                    .map(|row| row.get(name).cloned().unwrap_or(Cell::Null))
                    .collect()
            })
            .collect();

        Table::from_cells(&names, &columns)
    }
}

impl IngestionStrategy for XmlIngestion {
    fn ingest_data(&self, path: &Path) -> Result<Table> {
        let text = read_source(path, self.name())?;
        Self::parse_text(&text)
    }

    fn name(&self) -> &str {
        "xml"
    }
}
