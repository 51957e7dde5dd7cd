//! Inputs of an annotation run.
//!
//! - [`config_loader`]: module and job configuration files
//! - [`primary`]: the primary record reader
//! - [`secondary`]: in-memory secondary indexes
//! - [`binding`]: `name@path` secondary input bindings

pub mod binding;
pub mod config_loader;
pub mod error;
pub mod primary;
pub mod secondary;

pub use binding::SecondaryBinding;
pub use config_loader::{MODULES_DIR_ENV_VAR, ModuleLocation, load_run_config, modules_root};
pub use error::{IngestError, RecordFailure, Result};
pub use primary::{InputLine, PrimaryReader};
pub use secondary::SecondaryIndex;
