//! Run configuration for one annotator module.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schema::{ColumnDef, InputFormat, Level, Schema};

/// Column pairing for a secondary join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchColumns {
    /// Column read from the primary record.
    pub primary: String,
    /// Key column of the secondary input.
    pub secondary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryInputConfig {
    pub match_columns: MatchColumns,
    /// Columns kept from the secondary input; empty keeps all of them.
    #[serde(default)]
    pub use_columns: Vec<String>,
}

/// Configuration as resolved from the configuration source, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    pub level: Option<String>,
    pub output_columns: Option<Vec<ColumnDef>>,
    pub input_format: Option<String>,
    pub input_columns: Option<Vec<String>>,
    #[serde(default)]
    pub secondary_inputs: BTreeMap<String, SecondaryInputConfig>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub logging_level: Option<String>,
}

/// Validated configuration. The identifier column is always the first output column.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub module: String,
    pub level: Level,
    pub output_columns: Schema,
    pub input_format: InputFormat,
    pub input_columns: Vec<String>,
    pub secondary_inputs: BTreeMap<String, SecondaryInputConfig>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub logging_level: Option<String>,
}

const LOGGING_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl RunConfig {
    pub fn from_raw(module: &str, raw: RawConfig) -> Result<Self, ConfigError> {
        let level: Level = raw
            .level
            .ok_or(ConfigError::MissingKey { key: "level" })?
            .parse()?;
        let output_columns = raw
            .output_columns
            .ok_or(ConfigError::MissingKey {
                key: "output_columns",
            })?;
        let identifier = level.identifier_column();
        let output_columns = Schema::new(output_columns)?.with_identifier(identifier.clone());

        let input_format = match raw.input_format {
            Some(value) => value.parse()?,
            None => level.default_input_format(),
        };

        let input_columns = match raw.input_columns {
            Some(mut columns) => {
                if !columns.contains(&identifier.name) {
                    columns.push(identifier.name.clone());
                }
                columns
            }
            None => input_format.positional_names(),
        };

        for (name, secondary) in &raw.secondary_inputs {
            if !input_columns.contains(&secondary.match_columns.primary) {
                return Err(ConfigError::UnknownMatchColumn {
                    name: name.clone(),
                    column: secondary.match_columns.primary.clone(),
                });
            }
        }

        let logging_level = match raw.logging_level {
            Some(value) => {
                let lowered = value.to_lowercase();
                if !LOGGING_LEVELS.contains(&lowered.as_str()) {
                    return Err(ConfigError::InvalidLoggingLevel { value });
                }
                Some(lowered)
            }
            None => None,
        };

        Ok(Self {
            module: module.to_string(),
            level,
            output_columns,
            input_format,
            input_columns,
            secondary_inputs: raw.secondary_inputs,
            title: raw.title,
            version: raw.version,
            logging_level,
        })
    }

    /// Name of the identifier column.
    pub fn id_column(&self) -> &str {
        self.output_columns
            .identifier()
            .map_or("", |column| column.name.as_str())
    }

    /// Display title, falling back to the module name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.module)
    }

    /// Fails unless exactly as many secondary inputs are supplied as are declared.
    pub fn check_secondary_count(&self, provided: usize) -> Result<(), ConfigError> {
        let expected = self.secondary_inputs.len();
        if expected > provided {
            return Err(ConfigError::TooFewSecondaryInputs { expected, provided });
        }
        if expected < provided {
            return Err(ConfigError::TooManySecondaryInputs { expected, provided });
        }
        Ok(())
    }
}
