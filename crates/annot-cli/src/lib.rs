//! Library side of the `annot` command-line runner.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod modules;
pub mod summary;
