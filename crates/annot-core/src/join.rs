//! Secondary joins.

use std::collections::BTreeMap;
use std::path::PathBuf;

use annot_ingest::SecondaryIndex;
use annot_model::{ConfigError, Record, RunConfig};
use thiserror::Error;
use tracing::info;

use crate::annotator::SecondaryData;
use crate::error::Result;

/// The primary record lacks the column a secondary source matches on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("match column {column} for secondary input {source_name} missing from record")]
pub struct JoinError {
    pub source_name: String,
    pub column: String,
}

struct Source {
    name: String,
    primary_column: String,
    index: SecondaryIndex,
}

/// Secondary indexes and the primary columns they are looked up by.
#[derive(Default)]
pub struct Joiner {
    sources: Vec<Source>,
}

impl Joiner {
    /// Check the supplied inputs against the configuration and build one
    /// index per source. Runs before any primary record is read.
    pub fn build(config: &RunConfig, inputs: &BTreeMap<String, PathBuf>) -> Result<Self> {
        config.check_secondary_count(inputs.len())?;
        let mut sources = Vec::with_capacity(inputs.len());
        for (name, path) in inputs {
            let Some(declared) = config.secondary_inputs.get(name) else {
                return Err(ConfigError::UnknownSecondaryInput { name: name.clone() }.into());
            };
            let index = SecondaryIndex::build(
                path,
                &declared.match_columns.secondary,
                &declared.use_columns,
            )?;
            info!(
                secondary = %name,
                path = %path.display(),
                keys = index.len(),
                "secondary input loaded"
            );
            sources.push(Source {
                name: name.clone(),
                primary_column: declared.match_columns.primary.clone(),
                index,
            });
        }
        Ok(Self { sources })
    }

    /// True when no secondary sources are configured.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn index(&self, name: &str) -> Option<&SecondaryIndex> {
        self.sources
            .iter()
            .find(|source| source.name == name)
            .map(|source| &source.index)
    }

    /// Matching records per source. A source with no match maps to an empty slice.
    pub fn join(&self, record: &Record) -> std::result::Result<SecondaryData<'_>, JoinError> {
        let mut bundle = SecondaryData::new();
        for source in &self.sources {
            let value = record
                .get(&source.primary_column)
                .ok_or_else(|| JoinError {
                    source_name: source.name.clone(),
                    column: source.primary_column.clone(),
                })?;
            let matches = value
                .key()
                .map_or(&[][..], |key| source.index.get(&key));
            bundle.insert(source.name.clone(), matches);
        }
        Ok(bundle)
    }
}
