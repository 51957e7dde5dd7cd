//! Annotation file writer.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use annot_model::{ColumnDef, Record};
use csv::{QuoteStyle, WriterBuilder};

use crate::error::{FormatError, Result};
use crate::header::{ColumnLine, keys};

/// Output flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Meta lines and `#column=` definitions, readable by [`crate::AnnotReader`].
    #[default]
    Annotated,
    /// A single title row for people.
    Plain,
}

/// Writes one annotation file.
///
/// Header lines (meta lines and the column definition block) must precede the
/// first data row. The first [`AnnotWriter::write_data`] call writes the
/// definition block if it has not been written yet. Dropping the writer
/// flushes buffered rows; [`AnnotWriter::close`] does the same but reports
/// errors.
pub struct AnnotWriter {
    path: PathBuf,
    mode: OutputMode,
    columns: Vec<ColumnDef>,
    definition_written: bool,
    rows: usize,
    inner: csv::Writer<File>,
}

impl AnnotWriter {
    pub fn create(path: impl AsRef<Path>, mode: OutputMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|err| FormatError::io(&path, err))?;
        let inner = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .flexible(true)
            .from_writer(file);
        Ok(Self {
            path,
            mode,
            columns: Vec::new(),
            definition_written: false,
            rows: 0,
            inner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Define the column at `index`, replacing any earlier definition there.
    pub fn add_column(&mut self, index: usize, column: ColumnDef) -> Result<()> {
        self.ensure_header_open()?;
        match index.cmp(&self.columns.len()) {
            std::cmp::Ordering::Less => self.columns[index] = column,
            std::cmp::Ordering::Equal => self.columns.push(column),
            std::cmp::Ordering::Greater => {
                return Err(FormatError::ColumnIndex {
                    index,
                    len: self.columns.len(),
                });
            }
        }
        Ok(())
    }

    pub fn add_columns(&mut self, columns: impl IntoIterator<Item = ColumnDef>) -> Result<()> {
        for column in columns {
            let index = self.columns.len();
            self.add_column(index, column)?;
        }
        Ok(())
    }

    /// Write `#key=value`. Plain output carries no meta lines, so this is a
    /// no-op there.
    pub fn write_meta_line(&mut self, key: &str, value: &str) -> Result<()> {
        self.ensure_header_open()?;
        if self.mode == OutputMode::Plain {
            return Ok(());
        }
        let line = format!("#{key}={}\n", single_line(value));
        self.write_raw(line.as_bytes())
    }

    /// Write the column block: `#column=` lines plus `no_aggregate` in
    /// annotated mode, the title row in plain mode.
    pub fn write_definition(&mut self) -> Result<()> {
        self.ensure_header_open()?;
        match self.mode {
            OutputMode::Annotated => {
                let mut text = String::new();
                for (index, column) in self.columns.iter().enumerate() {
                    let line = ColumnLine {
                        index,
                        column: column.clone(),
                    };
                    let json = serde_json::to_string(&line).map_err(|err| {
                        FormatError::io(&self.path, std::io::Error::other(err))
                    })?;
                    text.push_str(&format!("#{}={json}\n", keys::COLUMN));
                }
                let no_aggregate: Vec<&str> = self
                    .columns
                    .iter()
                    .filter(|column| !column.aggregate)
                    .map(|column| column.name.as_str())
                    .collect();
                text.push_str(&format!(
                    "#{}={}\n",
                    keys::NO_AGGREGATE,
                    no_aggregate.join(",")
                ));
                self.write_raw(text.as_bytes())?;
            }
            OutputMode::Plain => {
                let titles: Vec<&str> = self
                    .columns
                    .iter()
                    .map(ColumnDef::display_title)
                    .collect();
                self.inner
                    .write_record(&titles)
                    .map_err(|err| FormatError::csv(&self.path, err))?;
            }
        }
        self.definition_written = true;
        Ok(())
    }

    /// Write one row in column order. Columns absent from `record` are empty.
    pub fn write_data(&mut self, record: &Record) -> Result<()> {
        if !self.definition_written {
            self.write_definition()?;
        }
        let fields: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                record
                    .get(&column.name)
                    .map(|value| single_field(&value.to_string()))
                    .unwrap_or_default()
            })
            .collect();
        self.inner
            .write_record(&fields)
            .map_err(|err| FormatError::csv(&self.path, err))?;
        self.rows += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner
            .flush()
            .map_err(|err| FormatError::io(&self.path, err))
    }

    /// Flush and release the file.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    fn ensure_header_open(&self) -> Result<()> {
        if self.definition_written {
            return Err(FormatError::HeaderClosed {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.flush()?;
        let mut file: &File = self.inner.get_ref();
        file.write_all(bytes)
            .map_err(|err| FormatError::io(&self.path, err))
    }
}

/// Tabs and line breaks inside a value would shift or split the row.
fn single_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

fn single_line(value: &str) -> String {
    value.replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use annot_model::Value;
    use tempfile::TempDir;

    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn plain_mode_writes_titles_and_skips_meta() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tsv");
        let mut writer = AnnotWriter::create(&path, OutputMode::Plain).unwrap();
        writer
            .add_columns([
                ColumnDef::int("uid").with_title("UID"),
                ColumnDef::float("score"),
            ])
            .unwrap();
        writer.write_meta_line("name", "demo").unwrap();
        writer
            .write_data(&record(&[("uid", Value::Int(1)), ("score", Value::Float(0.5))]))
            .unwrap();
        writer.close().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "UID\tscore\n1\t0.5\n");
    }

    #[test]
    fn annotated_header_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.var");
        let mut writer = AnnotWriter::create(&path, OutputMode::Annotated).unwrap();
        writer.write_meta_line(keys::NAME, "demo").unwrap();
        writer.write_meta_line(keys::VERSION, "1.0\nbroken").unwrap();
        writer
            .add_columns([
                ColumnDef::int("uid"),
                ColumnDef::string("gene").with_aggregate(false),
            ])
            .unwrap();
        writer
            .write_data(&record(&[("uid", Value::Int(7)), ("gene", Value::text("TP53"))]))
            .unwrap();
        writer.close().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("#name=demo\n#version=1.0 broken\n#column={\"index\":0,"));
        assert!(text.contains("#no_aggregate=gene\n"));
        assert!(text.ends_with("7\tTP53\n"));

        let reader = crate::AnnotReader::open(&path).unwrap();
        assert_eq!(reader.meta(keys::NAME), Some("demo"));
        assert_eq!(reader.meta(keys::NO_AGGREGATE), Some("gene"));
        assert_eq!(reader.column_names(), vec!["uid", "gene"]);
        let rows: Vec<Vec<String>> = reader.map(|line| line.unwrap().fields).collect();
        assert_eq!(rows, vec![vec!["7".to_string(), "TP53".to_string()]]);
    }

    #[test]
    fn absent_columns_are_empty_and_extra_keys_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tsv");
        let mut writer = AnnotWriter::create(&path, OutputMode::Plain).unwrap();
        writer
            .add_columns([ColumnDef::int("uid"), ColumnDef::string("a"), ColumnDef::string("b")])
            .unwrap();
        writer
            .write_data(&record(&[
                ("uid", Value::Int(3)),
                ("b", Value::text("x")),
                ("zzz", Value::text("dropped")),
            ]))
            .unwrap();
        drop(writer);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().nth(1), Some("3\t\tx"));
    }

    #[test]
    fn header_lines_after_data_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut writer =
            AnnotWriter::create(dir.path().join("out.tsv"), OutputMode::Annotated).unwrap();
        writer.add_column(0, ColumnDef::int("uid")).unwrap();
        writer.write_data(&record(&[("uid", Value::Int(1))])).unwrap();
        assert!(matches!(
            writer.write_meta_line("name", "late"),
            Err(FormatError::HeaderClosed { .. })
        ));
        assert!(writer.add_column(1, ColumnDef::string("x")).is_err());
    }

    #[test]
    fn column_index_gap_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut writer =
            AnnotWriter::create(dir.path().join("out.tsv"), OutputMode::Annotated).unwrap();
        let err = writer.add_column(2, ColumnDef::int("uid")).unwrap_err();
        assert!(matches!(err, FormatError::ColumnIndex { index: 2, len: 0 }));
    }

    #[test]
    fn embedded_tabs_do_not_split_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tsv");
        let mut writer = AnnotWriter::create(&path, OutputMode::Plain).unwrap();
        writer.add_column(0, ColumnDef::string("note")).unwrap();
        writer
            .write_data(&record(&[("note", Value::text("a\tb\nc"))]))
            .unwrap();
        writer.close().unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "note\na b c\n");
    }
}
