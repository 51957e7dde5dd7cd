//! Annotation run controller.
//!
//! The [`Runner`] reads primary records, joins them against secondary
//! indexes, hands each one to an [`Annotator`], normalizes what comes back
//! against the declared output columns and writes it out. A bad record is
//! logged to the error log and skipped; it never stops the run.

pub mod annotator;
pub mod cursor;
pub mod error;
pub mod error_log;
pub mod join;
pub mod normalize;
pub mod runner;
pub mod status;
pub mod store;
pub mod summary;

pub use annotator::{
    Annotation, Annotator, AnnotatorFactory, AnnotatorRegistry, GeneValues, RunContext,
    SecondaryData,
};
pub use cursor::OutputCursor;
pub use error::{AnnotateError, Result, RunError};
pub use error_log::ErrorLog;
pub use join::{JoinError, Joiner};
pub use normalize::normalize;
pub use runner::{RunOptions, RunPaths, RunState, RunSummary, Runner};
pub use status::{DUMMY_JOB, ProgressThrottle, StatusDocument, StatusSink, StatusUpdate};
pub use store::LookupStore;
pub use summary::GeneCollection;
