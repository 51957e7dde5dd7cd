//! Data model shared by every stage of the annotation pipeline.
//!
//! Records carry [`Value`]s keyed by column name. Column layout comes from a
//! [`Schema`], and a validated [`RunConfig`] fixes the record level, input
//! format and secondary sources for one annotator module.

pub mod config;
pub mod error;
pub mod schema;
pub mod value;

pub use config::{MatchColumns, RawConfig, RunConfig, SecondaryInputConfig};
pub use error::{ConfigError, InvalidData, Result};
pub use schema::{ColumnDef, InputFormat, Level, Schema};
pub use value::{DataType, Record, Value};
