//! Tab-separated annotation file format.
//!
//! A file starts with an optional header block of `#key=value` meta lines.
//! `#column=<json>` lines declare the columns; the remaining lines are data,
//! one record per line, fields separated by tabs with no quoting. An empty
//! field is an absent value.

pub mod error;
pub mod header;
pub mod reader;
pub mod writer;

pub use error::{FormatError, Result};
pub use header::{Header, keys};
pub use reader::{AnnotReader, DataLine};
pub use writer::{AnnotWriter, OutputMode};
