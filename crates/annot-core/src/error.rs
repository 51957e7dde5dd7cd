use std::path::PathBuf;

use annot_format::FormatError;
use annot_ingest::IngestError;
use annot_model::ConfigError;
use thiserror::Error;

/// Outcome of a failed `annotate` call.
#[derive(Debug, Error)]
pub enum AnnotateError {
    /// The record cannot be annotated as given. Logged, run continues.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Any other record-level failure. Logged, run continues.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),

    /// Stops the run.
    #[error("{0}")]
    Fatal(String),
}

impl AnnotateError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, AnnotateError::Fatal(_))
    }

    /// Text written to the error log.
    pub fn log_message(&self) -> String {
        match self {
            AnnotateError::InvalidData(message) | AnnotateError::Fatal(message) => message.clone(),
            AnnotateError::Failed(err) => format!("{err:#}"),
        }
    }
}

impl From<RunError> for AnnotateError {
    fn from(err: RunError) -> Self {
        Self::Failed(err.into())
    }
}

/// Fatal run errors. Record-level problems never surface here.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open lookup store {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("no annotator registered as {name}")]
    UnknownAnnotator { name: String },

    #[error("annotator {module} failed during {stage}: {message}")]
    Annotator {
        module: String,
        stage: &'static str,
        message: String,
    },

    #[error("run cancelled after {records} records")]
    Cancelled { records: usize },

    #[error("cannot {action} while run is {state}")]
    InvalidState {
        action: &'static str,
        state: crate::runner::RunState,
    },
}

impl RunError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_log_message_includes_context_chain() {
        let err = AnnotateError::Failed(
            anyhow::anyhow!("lookup returned nothing").context("resolving gene"),
        );
        assert_eq!(err.log_message(), "resolving gene: lookup returned nothing");
        assert!(!err.is_fatal());
    }

    #[test]
    fn fatal_is_fatal() {
        assert!(AnnotateError::fatal("database gone").is_fatal());
        assert_eq!(AnnotateError::invalid("bad ref").log_message(), "bad ref");
    }
}
