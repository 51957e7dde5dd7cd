//! Primary record reader.

use std::path::Path;

use annot_format::{AnnotReader, DataLine, Header};
use annot_model::{ColumnDef, ConfigError, InputFormat, Record, Value};
use tracing::debug;

use crate::error::{IngestError, Result};

/// A typed primary record with its position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputLine {
    pub line_number: usize,
    pub raw_line: String,
    pub record: Record,
}

/// A declared input column bound to a field position.
#[derive(Debug, Clone)]
struct Binding {
    column: ColumnDef,
    field: usize,
}

/// Lazy, forward-only sequence of primary records restricted to the declared
/// input columns.
pub struct PrimaryReader {
    reader: AnnotReader,
    bindings: Vec<Binding>,
}

impl PrimaryReader {
    /// Open `path` and resolve each of `declared` against the file's column
    /// definitions, or against the positional layout of `format` when the
    /// file defines no columns.
    pub fn open(path: &Path, declared: &[String], format: InputFormat) -> Result<Self> {
        let reader = AnnotReader::open(path)?;
        let bindings = if reader.header().has_columns() {
            bind_to_header(path, reader.header(), declared)?
        } else {
            debug!(
                path = %path.display(),
                format = %format,
                "no column definitions, using positional layout"
            );
            bind_to_positions(declared, format)?
        };
        Ok(Self { reader, bindings })
    }

    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// Resolved columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.bindings.iter().map(|binding| &binding.column)
    }

    fn coerce(&self, line: DataLine) -> Result<InputLine> {
        let mut record = Record::new();
        for binding in &self.bindings {
            let raw = line.field(binding.field).unwrap_or("");
            match Value::parse(&binding.column.name, raw, binding.column.data_type) {
                Ok(value) => {
                    record.insert(binding.column.name.clone(), value);
                }
                Err(source) => {
                    return Err(IngestError::InvalidRecord {
                        line_number: line.line_number,
                        raw_line: line.raw_line,
                        source,
                    });
                }
            }
        }
        Ok(InputLine {
            line_number: line.line_number,
            raw_line: line.raw_line,
            record,
        })
    }
}

impl Iterator for PrimaryReader {
    type Item = Result<InputLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.reader.next()? {
            Ok(line) => line,
            Err(err) => return Some(Err(err.into())),
        };
        Some(self.coerce(line))
    }
}

fn bind_to_header(path: &Path, header: &Header, declared: &[String]) -> Result<Vec<Binding>> {
    let mut bindings = Vec::with_capacity(declared.len());
    let mut missing = Vec::new();
    for name in declared {
        match header
            .indexed_columns()
            .find(|(_, column)| &column.name == name)
        {
            Some((field, column)) => bindings.push(Binding {
                column: column.clone(),
                field,
            }),
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
    Ok(bindings)
}

fn bind_to_positions(declared: &[String], format: InputFormat) -> Result<Vec<Binding>> {
    let positional = format.positional_columns();
    declared
        .iter()
        .map(|name| {
            positional
                .iter()
                .position(|column| &column.name == name)
                .map(|field| Binding {
                    column: positional[field].clone(),
                    field,
                })
                .ok_or_else(|| {
                    IngestError::from(ConfigError::UnknownPositionalColumn {
                        column: name.clone(),
                        format: format.to_string(),
                    })
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn temp_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn positional_input_is_typed() {
        let file = temp_file("1\tchr1\t100\tA\tG\n");
        let mut reader =
            PrimaryReader::open(file.path(), &names(&["uid", "pos"]), InputFormat::Crv).unwrap();
        let line = reader.next().unwrap().unwrap();
        assert_eq!(line.line_number, 1);
        assert_eq!(line.record.len(), 2);
        assert_eq!(line.record["uid"], Value::Int(1));
        assert_eq!(line.record["pos"], Value::Int(100));
    }

    #[test]
    fn unknown_positional_column_fails_at_open() {
        let file = temp_file("1\tchr1\t100\tA\tG\n");
        let err = PrimaryReader::open(file.path(), &names(&["uid", "hugo"]), InputFormat::Crv)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            IngestError::Config(ConfigError::UnknownPositionalColumn { ref column, .. })
                if column == "hugo"
        ));
    }

    #[test]
    fn header_missing_declared_columns_names_them() {
        let file = temp_file(concat!(
            "#column={\"index\":0,\"name\":\"uid\",\"type\":\"int\"}\n",
            "1\n",
        ));
        let err = PrimaryReader::open(
            file.path(),
            &names(&["uid", "chrom", "pos"]),
            InputFormat::Crv,
        )
        .err()
        .unwrap();
        match err {
            IngestError::Config(ConfigError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["chrom", "pos"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_columns_are_used_by_name() {
        let file = temp_file(concat!(
            "#column={\"index\":0,\"name\":\"hugo\",\"type\":\"string\"}\n",
            "#column={\"index\":1,\"name\":\"uid\",\"type\":\"int\"}\n",
            "BRCA1\t9\n",
        ));
        let mut reader =
            PrimaryReader::open(file.path(), &names(&["uid", "hugo"]), InputFormat::Crv).unwrap();
        let line = reader.next().unwrap().unwrap();
        assert_eq!(line.record["uid"], Value::Int(9));
        assert_eq!(line.record["hugo"], Value::text("BRCA1"));
    }

    #[test]
    fn header_fields_follow_declared_index() {
        let file = temp_file(concat!(
            "#column={\"index\":0,\"name\":\"uid\",\"type\":\"int\"}\n",
            "#column={\"index\":2,\"name\":\"ref_base\",\"type\":\"string\"}\n",
            "1\tIGNORED\tACGT\n",
        ));
        let mut reader =
            PrimaryReader::open(file.path(), &names(&["uid", "ref_base"]), InputFormat::Crv)
                .unwrap();
        let line = reader.next().unwrap().unwrap();
        assert_eq!(line.record["uid"], Value::Int(1));
        assert_eq!(line.record["ref_base"], Value::text("ACGT"));
    }

    #[test]
    fn malformed_line_does_not_end_iteration() {
        let file = temp_file("1\tchr1\t100\tA\tG\nx\tchr1\t101\tC\tT\n3\tchr2\t5\tG\tA\n");
        let reader = PrimaryReader::open(
            file.path(),
            &InputFormat::Crv.positional_names(),
            InputFormat::Crv,
        )
        .unwrap();
        let results: Vec<_> = reader.collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(IngestError::InvalidRecord {
                line_number,
                raw_line,
                ..
            }) => {
                assert_eq!(*line_number, 2);
                assert_eq!(raw_line, "x\tchr1\t101\tC\tT");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(results[2].as_ref().unwrap().record["uid"], Value::Int(3));
    }

    #[test]
    fn short_line_leaves_trailing_columns_absent() {
        let file = temp_file("4\tchr1\n");
        let mut reader = PrimaryReader::open(
            file.path(),
            &InputFormat::Crv.positional_names(),
            InputFormat::Crv,
        )
        .unwrap();
        let line = reader.next().unwrap().unwrap();
        assert!(line.record["pos"].is_missing());
    }
}
