//! Job status notifier.
//!
//! Status updates are handed to a background thread over a bounded channel
//! and written to `<job>.status.json`. Sending never blocks the record loop;
//! when the channel is full the update is dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossbeam_channel::{Sender, TrySendError, bounded};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Job name whose runs report no status and keep no run log.
pub const DUMMY_JOB: &str = "__dummy__";

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Status(String),
    Version { module: String, version: String },
}

/// Contents of the status file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDocument {
    pub status: String,
    #[serde(default)]
    pub annotator_version: BTreeMap<String, String>,
    pub updated_at: Option<DateTime<Local>>,
}

impl StatusDocument {
    /// Existing document at `path`, or an empty one.
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    fn apply(&mut self, update: StatusUpdate) {
        match update {
            StatusUpdate::Status(status) => self.status = status,
            StatusUpdate::Version { module, version } => {
                self.annotator_version.insert(module, version);
            }
        }
        self.updated_at = Some(Local::now());
    }
}

/// Sending half of the status notifier.
pub struct StatusSink {
    sender: Option<Sender<StatusUpdate>>,
    worker: Option<JoinHandle<()>>,
}

impl StatusSink {
    /// A sink that drops every update.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            worker: None,
        }
    }

    /// Start the writer thread for `path`.
    pub fn spawn(path: PathBuf) -> Self {
        let (sender, receiver) = bounded::<StatusUpdate>(CHANNEL_CAPACITY);
        let worker = std::thread::spawn(move || {
            let mut document = StatusDocument::load(&path);
            for update in receiver {
                document.apply(update);
                let written = serde_json::to_string_pretty(&document)
                    .map_err(std::io::Error::other)
                    .and_then(|text| std::fs::write(&path, text));
                if let Err(err) = written {
                    warn!(path = %path.display(), error = %err, "status update not written");
                }
            }
        });
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn send(&self, update: StatusUpdate) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(update)) => debug!(?update, "status channel full, update dropped"),
            Err(TrySendError::Disconnected(_)) => debug!("status writer gone"),
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.send(StatusUpdate::Status(message.into()));
    }

    /// Close the channel and wait for pending updates to be written.
    pub fn finish(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("status writer thread panicked");
        }
    }
}

impl Drop for StatusSink {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Decides when a progress update is due: every `every_records` records or
/// after `interval`, whichever comes first.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    every_records: usize,
    interval: Duration,
    last: Instant,
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(3))
    }
}

impl ProgressThrottle {
    pub fn new(every_records: usize, interval: Duration) -> Self {
        Self {
            every_records: every_records.max(1),
            interval,
            last: Instant::now(),
        }
    }

    pub fn is_due(&mut self, line_number: usize, now: Instant) -> bool {
        let due = line_number % self.every_records == 0
            || now.saturating_duration_since(self.last) > self.interval;
        if due {
            self.last = now;
        }
        due
    }
}
