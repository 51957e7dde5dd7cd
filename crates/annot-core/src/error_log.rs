//! Per-record diagnostics sink.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::error;

use crate::error::{Result, RunError};

/// Appends one entry per failed record to `<job>.err`:
///
/// ```text
/// SOURCE:<module> [<line>]<raw line>
/// (<message>)
/// #
/// ```
///
/// Each distinct message is also emitted once as a tracing error event.
pub struct ErrorLog {
    path: PathBuf,
    module: String,
    writer: BufWriter<File>,
    seen: HashSet<String>,
    entries: usize,
}

impl ErrorLog {
    pub fn create(path: impl Into<PathBuf>, module: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| RunError::io(&path, err))?;
        Ok(Self {
            path,
            module: module.into(),
            writer: BufWriter::new(file),
            seen: HashSet::new(),
            entries: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&mut self, line_number: usize, raw_line: &str, message: &str) -> Result<()> {
        if self.seen.insert(message.to_string()) {
            error!(line = line_number, error = %message, "record failed");
        }
        writeln!(
            self.writer,
            "SOURCE:{} [{line_number}]{raw_line}\n({message})\n#",
            self.module
        )
        .map_err(|err| RunError::io(&self.path, err))?;
        self.entries += 1;
        Ok(())
    }

    /// Entries written by this run.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn unique_messages(&self) -> usize {
        self.seen.len()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|err| RunError::io(&self.path, err))
    }
}
