//! Annotation file reader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use annot_model::ColumnDef;
use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder};

use crate::error::{FormatError, Result};
use crate::header::{ColumnLine, Header, keys, split_meta_line};

/// One physical data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLine {
    /// 1-based, counted from the first line after the header block.
    pub line_number: usize,
    /// The fields joined back with tabs. Line terminators, including a
    /// trailing `\r`, are not part of it.
    pub raw_line: String,
    pub fields: Vec<String>,
}

impl DataLine {
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

/// Forward-only reader over a tab-separated annotation file.
///
/// The header block (`#` lines) is consumed by [`AnnotReader::open`]; iteration
/// yields the data lines that follow.
pub struct AnnotReader {
    path: PathBuf,
    header: Header,
    records: ByteRecordsIntoIter<BufReader<File>>,
}

impl AnnotReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|err| FormatError::io(&path, err))?;
        let mut input = BufReader::new(file);
        let header = read_header(&path, &mut input)?;
        let records = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(input)
            .into_byte_records();
        Ok(Self {
            path,
            header,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Declared columns in index order. Empty when the file has no definitions.
    pub fn columns(&self) -> &[ColumnDef] {
        self.header.columns()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns()
            .iter()
            .map(|column| column.name.as_str())
            .collect()
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.header.meta(key)
    }
}

impl Iterator for AnnotReader {
    type Item = Result<DataLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(err) => return Some(Err(FormatError::csv(&self.path, err))),
        };
        let line_number = record
            .position()
            .map_or(0, |position| position.line() as usize);
        Some(decode(&self.path, line_number, &record))
    }
}

fn decode(path: &Path, line_number: usize, record: &ByteRecord) -> Result<DataLine> {
    let mut fields = Vec::with_capacity(record.len());
    for field in record {
        match std::str::from_utf8(field) {
            Ok(text) => fields.push(text.to_string()),
            Err(source) => {
                let raw: Vec<&[u8]> = record.iter().collect();
                return Err(FormatError::InvalidUtf8 {
                    path: path.to_path_buf(),
                    line_number,
                    raw_line: String::from_utf8_lossy(&raw.join(&b'\t')).into_owned(),
                    source,
                });
            }
        }
    }
    Ok(DataLine {
        line_number,
        raw_line: fields.join("\t"),
        fields,
    })
}

fn read_header(path: &Path, input: &mut BufReader<File>) -> Result<Header> {
    let mut header = Header::default();
    let mut column_lines = Vec::new();
    let mut meta_line = 0usize;
    loop {
        let buf = input.fill_buf().map_err(|err| FormatError::io(path, err))?;
        if buf.first() != Some(&b'#') {
            break;
        }
        let mut line = String::new();
        input
            .read_line(&mut line)
            .map_err(|err| FormatError::io(path, err))?;
        meta_line += 1;
        let Some((key, value)) = split_meta_line(&line) else {
            continue;
        };
        if key == keys::COLUMN {
            let column: ColumnLine =
                serde_json::from_str(value).map_err(|err| FormatError::ColumnDefinition {
                    path: path.to_path_buf(),
                    line: meta_line,
                    message: err.to_string(),
                })?;
            column_lines.push(column);
        } else {
            header.insert_meta(key.to_string(), value.to_string());
        }
    }
    header.set_columns(column_lines);
    Ok(header)
}
