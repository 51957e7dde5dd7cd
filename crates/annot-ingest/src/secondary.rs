//! Secondary index: a secondary input loaded into memory, keyed by one column.

use std::collections::HashMap;
use std::path::Path;

use annot_format::AnnotReader;
use annot_model::{ColumnDef, ConfigError, InvalidData, Record, Value};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Multi-map from key value to every record carrying it, in file order.
#[derive(Debug, Clone, Default)]
pub struct SecondaryIndex {
    key_column: String,
    columns: Vec<ColumnDef>,
    entries: HashMap<String, Vec<Record>>,
    rows: usize,
}

impl SecondaryIndex {
    /// Load `path` and index it by `key_column`, keeping `fetch_columns` (all
    /// declared columns when empty).
    pub fn build(path: &Path, key_column: &str, fetch_columns: &[String]) -> Result<Self> {
        let reader = AnnotReader::open(path)?;
        let declared: Vec<(usize, ColumnDef)> = reader
            .header()
            .indexed_columns()
            .map(|(field, column)| (field, column.clone()))
            .collect();
        let find = |name: &str| declared.iter().find(|(_, column)| column.name == name);
        let Some((key_field, key_type)) =
            find(key_column).map(|(field, column)| (*field, column.data_type))
        else {
            return Err(ConfigError::MissingKeyColumn {
                column: key_column.to_string(),
                input: path.display().to_string(),
            }
            .into());
        };

        let kept: Vec<(usize, ColumnDef)> = if fetch_columns.is_empty() {
            declared.clone()
        } else {
            let mut kept = Vec::with_capacity(fetch_columns.len());
            let mut missing = Vec::new();
            for name in fetch_columns {
                match find(name.as_str()) {
                    Some(entry) => kept.push(entry.clone()),
                    None => missing.push(name.clone()),
                }
            }
            if !missing.is_empty() {
                return Err(ConfigError::MissingColumns {
                    input: path.display().to_string(),
                    columns: missing,
                }
                .into());
            }
            kept
        };

        let mut index = Self {
            key_column: key_column.to_string(),
            columns: kept.iter().map(|(_, column)| column.clone()).collect(),
            entries: HashMap::new(),
            rows: 0,
        };
        for line in reader {
            let line = line?;
            let invalid = |source: InvalidData| IngestError::InvalidRecord {
                line_number: line.line_number,
                raw_line: line.raw_line.clone(),
                source,
            };
            let key = Value::parse(key_column, line.field(key_field).unwrap_or(""), key_type)
                .map_err(invalid)?;
            let Some(key) = key.key() else {
                debug!(
                    path = %path.display(),
                    line = line.line_number,
                    "secondary row without key skipped"
                );
                continue;
            };
            let mut record = Record::new();
            for (field, column) in &kept {
                let value = Value::parse(
                    &column.name,
                    line.field(*field).unwrap_or(""),
                    column.data_type,
                )
                .map_err(invalid)?;
                record.insert(column.name.clone(), value);
            }
            index.entries.entry(key).or_default().push(record);
            index.rows += 1;
        }
        debug!(
            path = %path.display(),
            key_column,
            keys = index.entries.len(),
            rows = index.rows,
            "secondary index built"
        );
        Ok(index)
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Retained columns in file order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Every record with this key, in file order. Unknown keys give an empty slice.
    pub fn get(&self, key: &str) -> &[Record] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Values of `column` across every record with this key.
    pub fn get_values(&self, key: &str, column: &str) -> Vec<&Value> {
        self.get(key)
            .iter()
            .filter_map(|record| record.get(column))
            .collect()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of indexed rows.
    pub fn row_count(&self) -> usize {
        self.rows
    }
}
