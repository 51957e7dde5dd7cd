//! Full-scan cursor over an already written output file.

use std::path::Path;

use annot_format::{AnnotReader, OutputMode};
use annot_model::{Record, Schema, Value};

use crate::error::{Result, RunError};

/// Iterates the rows of an output file as typed records, in the order they
/// were written.
pub struct OutputCursor {
    reader: AnnotReader,
    schema: Schema,
}

impl OutputCursor {
    pub fn open(path: &Path, schema: &Schema, mode: OutputMode) -> Result<Self> {
        let mut reader = AnnotReader::open(path)?;
        if mode == OutputMode::Plain {
            // title row
            if let Some(line) = reader.next() {
                line?;
            }
        }
        Ok(Self {
            reader,
            schema: schema.clone(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Iterator for OutputCursor {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.reader.next()? {
            Ok(line) => line,
            Err(err) => return Some(Err(err.into())),
        };
        let mut record = Record::new();
        for (index, column) in self.schema.iter().enumerate() {
            let raw = line.field(index).unwrap_or("");
            match Value::parse(&column.name, raw, column.data_type) {
                Ok(value) => {
                    record.insert(column.name.clone(), value);
                }
                Err(source) => {
                    return Some(Err(RunError::Ingest(
                        annot_ingest::IngestError::InvalidRecord {
                            line_number: line.line_number,
                            raw_line: line.raw_line,
                            source,
                        },
                    )));
                }
            }
        }
        Some(Ok(record))
    }
}
