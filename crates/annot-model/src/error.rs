use std::path::PathBuf;

use thiserror::Error;

/// Run configuration problems. Always fatal, always raised before the first
/// record is read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("required key \"{key}\" not found in configuration")]
    MissingKey { key: &'static str },

    #[error("{value} is not a valid level. Valid levels are variant, gene")]
    InvalidLevel { value: String },

    #[error("invalid input_format {value}, select from crv, crx, crg")]
    InvalidInputFormat { value: String },

    #[error("invalid logging_level {value}, select from error, warn, info, debug, trace")]
    InvalidLoggingLevel { value: String },

    #[error("duplicate column name: {name}")]
    DuplicateColumn { name: String },

    #[error("columns not defined in {input}: {}", .columns.join(", "))]
    MissingColumns { input: String, columns: Vec<String> },

    #[error("column {column} not defined for {format} format input")]
    UnknownPositionalColumn { column: String, format: String },

    #[error("key column {column} not present in secondary input {input}")]
    MissingKeyColumn { column: String, input: String },

    #[error("too few secondary inputs. {expected} expected, {provided} provided")]
    TooFewSecondaryInputs { expected: usize, provided: usize },

    #[error("too many secondary inputs. {expected} expected, {provided} provided")]
    TooManySecondaryInputs { expected: usize, provided: usize },

    #[error("secondary input {name} is not declared in configuration")]
    UnknownSecondaryInput { name: String },

    #[error("secondary input {name} matches on {column}, which is not an input column")]
    UnknownMatchColumn { name: String, column: String },

    #[error("invalid secondary input binding {binding}, expected <name>@<path>")]
    InvalidSecondaryBinding { binding: String },
}

impl ConfigError {
    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A single field that could not be coerced to its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value '{value}' for {column} ({expected})")]
pub struct InvalidData {
    pub column: String,
    pub value: String,
    pub expected: &'static str,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_names_the_key() {
        let err = ConfigError::MissingKey { key: "level" };
        assert_eq!(
            err.to_string(),
            "required key \"level\" not found in configuration"
        );
    }

    #[test]
    fn missing_columns_are_joined() {
        let err = ConfigError::MissingColumns {
            input: "input.crv".to_string(),
            columns: vec!["hugo".to_string(), "so".to_string()],
        };
        assert_eq!(err.to_string(), "columns not defined in input.crv: hugo, so");
    }

    #[test]
    fn secondary_count_messages() {
        let few = ConfigError::TooFewSecondaryInputs {
            expected: 2,
            provided: 1,
        };
        assert!(few.to_string().starts_with("too few"));
        let many = ConfigError::TooManySecondaryInputs {
            expected: 0,
            provided: 1,
        };
        assert!(many.to_string().contains("0 expected, 1 provided"));
    }
}
