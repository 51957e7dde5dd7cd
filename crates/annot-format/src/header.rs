//! Meta lines and column definitions at the top of an annotation file.

use std::collections::BTreeMap;

use annot_model::ColumnDef;
use serde::{Deserialize, Serialize};

/// Standard meta keys.
pub mod keys {
    pub const COLUMN: &str = "column";
    pub const NAME: &str = "name";
    pub const DISPLAY_NAME: &str = "displayname";
    pub const VERSION: &str = "version";
    pub const NO_AGGREGATE: &str = "no_aggregate";
}

/// JSON payload of a `#column=` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ColumnLine {
    pub index: usize,
    #[serde(flatten)]
    pub column: ColumnDef,
}

/// Everything found before the first data line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    meta: BTreeMap<String, String>,
    columns: Vec<ColumnDef>,
    /// Declared `index` of each entry in `columns`, which is the field it
    /// occupies on a data line.
    fields: Vec<usize>,
}

impl Header {
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    pub fn meta_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.meta
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Columns paired with the data field each one was declared at.
    pub fn indexed_columns(&self) -> impl Iterator<Item = (usize, &ColumnDef)> {
        self.fields.iter().copied().zip(&self.columns)
    }

    /// Data field of the column named `name`.
    pub fn field_of(&self, name: &str) -> Option<usize> {
        self.indexed_columns()
            .find(|(_, column)| column.name == name)
            .map(|(field, _)| field)
    }

    /// True when the file declared at least one column.
    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    pub(crate) fn insert_meta(&mut self, key: String, value: String) {
        self.meta.insert(key, value);
    }

    pub(crate) fn set_columns(&mut self, mut lines: Vec<ColumnLine>) {
        lines.sort_by_key(|line| line.index);
        (self.fields, self.columns) = lines
            .into_iter()
            .map(|line| (line.index, line.column))
            .unzip();
    }
}

/// Split `#key=value` into its parts. Lines without `=` carry an empty value.
pub(crate) fn split_meta_line(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_prefix('#')?;
    let body = body.trim_end_matches(['\r', '\n']);
    Some(body.split_once('=').unwrap_or((body, "")))
}

#[cfg(test)]
mod tests {
    use annot_model::DataType;

    use super::*;

    #[test]
    fn split_meta_line_handles_values_with_equals() {
        assert_eq!(split_meta_line("#name=a=b\n"), Some(("name", "a=b")));
        assert_eq!(split_meta_line("#flag\r\n"), Some(("flag", "")));
        assert_eq!(split_meta_line("name=x"), None);
    }

    #[test]
    fn column_line_json_shape() {
        let line = ColumnLine {
            index: 1,
            column: ColumnDef::float("score").with_title("Score"),
        };
        let json = serde_json::to_string(&line).unwrap();
        assert_eq!(
            json,
            r#"{"index":1,"name":"score","title":"Score","type":"float","aggregate":true}"#
        );
        let parsed: ColumnLine =
            serde_json::from_str(r#"{"index":0,"name":"uid","type":"int"}"#).unwrap();
        assert_eq!(parsed.column.data_type, DataType::Int);
        assert!(parsed.column.aggregate);
    }

    #[test]
    fn columns_follow_index_order() {
        let mut header = Header::default();
        header.set_columns(vec![
            ColumnLine {
                index: 1,
                column: ColumnDef::string("b"),
            },
            ColumnLine {
                index: 0,
                column: ColumnDef::string("a"),
            },
        ]);
        let names: Vec<_> = header.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn sparse_indices_keep_their_field() {
        let mut header = Header::default();
        header.set_columns(vec![
            ColumnLine {
                index: 2,
                column: ColumnDef::string("ref_base"),
            },
            ColumnLine {
                index: 0,
                column: ColumnDef::int("uid"),
            },
        ]);
        assert_eq!(header.field_of("uid"), Some(0));
        assert_eq!(header.field_of("ref_base"), Some(2));
        assert_eq!(header.field_of("alt_base"), None);
        let fields: Vec<_> = header.indexed_columns().map(|(field, _)| field).collect();
        assert_eq!(fields, vec![0, 2]);
    }
}
