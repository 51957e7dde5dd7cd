use annot_format::FormatError;
use annot_model::{ConfigError, InvalidData};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Format(FormatError),

    /// A data line whose fields could not be coerced. The line is dropped
    /// and reading continues.
    #[error("line {line_number}: {source}")]
    InvalidRecord {
        line_number: usize,
        raw_line: String,
        #[source]
        source: InvalidData,
    },

    /// A data line that is not valid UTF-8. Recoverable like
    /// [`IngestError::InvalidRecord`].
    #[error("line {line_number}: not valid UTF-8 ({source})")]
    UnreadableLine {
        line_number: usize,
        raw_line: String,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// A record-level failure as it is written to the error log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub line_number: usize,
    pub raw_line: String,
    pub message: String,
}

impl IngestError {
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            IngestError::InvalidRecord { .. } | IngestError::UnreadableLine { .. }
        )
    }

    /// Split off a record-level failure. Fatal errors come back unchanged.
    pub fn into_record_failure(self) -> std::result::Result<RecordFailure, Self> {
        match self {
            IngestError::InvalidRecord {
                line_number,
                raw_line,
                source,
            } => Ok(RecordFailure {
                line_number,
                raw_line,
                message: source.to_string(),
            }),
            IngestError::UnreadableLine {
                line_number,
                raw_line,
                source,
            } => Ok(RecordFailure {
                line_number,
                raw_line,
                message: format!("not valid UTF-8 ({source})"),
            }),
            other => Err(other),
        }
    }
}

impl From<FormatError> for IngestError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::InvalidUtf8 {
                line_number,
                raw_line,
                source,
                ..
            } => IngestError::UnreadableLine {
                line_number,
                raw_line,
                source,
            },
            other => IngestError::Format(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_line_failures_split_off() {
        let invalid = IngestError::InvalidRecord {
            line_number: 4,
            raw_line: "x\ty".to_string(),
            source: InvalidData {
                column: "pos".to_string(),
                value: "x".to_string(),
                expected: "int",
            },
        };
        assert!(invalid.is_record_level());
        let failure = invalid.into_record_failure().unwrap();
        assert_eq!(failure.line_number, 4);
        assert_eq!(failure.message, "invalid value 'x' for pos (int)");

        let fatal = IngestError::Config(ConfigError::DuplicateColumn {
            name: "uid".to_string(),
        });
        assert!(!fatal.is_record_level());
        assert!(fatal.into_record_failure().is_err());
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
