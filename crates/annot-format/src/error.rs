use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing annotation files.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("line {line_number} of {path} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        path: PathBuf,
        line_number: usize,
        raw_line: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("invalid column definition on meta line {line} of {path}: {message}")]
    ColumnDefinition {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("column index {index} leaves a gap after {len} defined columns")]
    ColumnIndex { index: usize, len: usize },

    #[error("cannot write header lines to {path} after data rows")]
    HeaderClosed { path: PathBuf },
}

impl FormatError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FormatError>;
