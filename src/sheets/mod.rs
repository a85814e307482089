//! Worksheet ingestion.
//!
//! The curator's spreadsheets arrive as per-worksheet CSV exports. A sheet is
//! read against an explicit mapping schema — output field name to either a
//! column name or a nested subfield→column mapping — validated once at
//! configuration load, never resolved ad hoc per row. Each produced row
//! carries its 1-based physical line number (header = row 1); blank rows are
//! skipped; missing columns map to empty strings.

pub mod postprocess;

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Where one output field comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldMapping {
    /// A single column, by header name.
    Column(String),
    /// A group of subfields, each from its own column.
    Group(BTreeMap<String, String>),
}

/// Mapping schema for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSchema {
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldMapping>,
}

impl SheetSchema {
    /// Schema sanity check, run when configuration is loaded.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            bail!("sheet mapping has no fields");
        }
        for (field, mapping) in &self.fields {
            match mapping {
                FieldMapping::Column(column) => {
                    if column.trim().is_empty() {
                        bail!("field \"{field}\" maps to an empty column name");
                    }
                }
                FieldMapping::Group(subfields) => {
                    if subfields.is_empty() {
                        bail!("field \"{field}\" maps to an empty group");
                    }
                    for (subfield, column) in subfields {
                        if column.trim().is_empty() {
                            bail!(
                                "field \"{field}.{subfield}\" maps to an empty column name"
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// A mapped cell value: plain text or a group of subfield values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Group(BTreeMap<String, String>),
}

/// One data row of a sheet, after mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    /// Physical 1-based row number in the sheet; the header is row 1.
    pub line_number: u32,
    pub values: BTreeMap<String, FieldValue>,
}

impl SheetRow {
    /// Text value of a plain field; empty when absent or grouped.
    pub fn text(&self, field: &str) -> &str {
        match self.values.get(field) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Subfield value of a grouped field; empty when absent.
    pub fn group_text(&self, field: &str, subfield: &str) -> &str {
        match self.values.get(field) {
            Some(FieldValue::Group(map)) => map.get(subfield).map(String::as_str).unwrap_or(""),
            _ => "",
        }
    }
}

/// Read a worksheet export against a schema. The first record is the header
/// row; every following record becomes a [`SheetRow`] unless all of its
/// cells are blank.
pub fn read_sheet(bytes: &[u8], schema: &SheetSchema) -> Result<Vec<SheetRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .context("failed to read header row")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect(),
        None => bail!("sheet is empty"),
    };

    let column_index = |name: &str| headers.iter().position(|h| h.as_str() == name);

    let mut rows = Vec::new();
    for (offset, record) in records.enumerate() {
        let record = record.context("failed to read sheet row")?;
        let line_number = (offset + 2) as u32;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let cell = |column: &str| -> String {
            column_index(column)
                .and_then(|idx| record.get(idx))
                .unwrap_or("")
                .to_string()
        };

        let mut values = BTreeMap::new();
        for (field, mapping) in &schema.fields {
            let value = match mapping {
                FieldMapping::Column(column) => FieldValue::Text(cell(column)),
                FieldMapping::Group(subfields) => FieldValue::Group(
                    subfields
                        .iter()
                        .map(|(subfield, column)| (subfield.clone(), cell(column)))
                        .collect(),
                ),
            };
            values.insert(field.clone(), value);
        }

        rows.push(SheetRow {
            line_number,
            values,
        });
    }

    Ok(rows)
}
