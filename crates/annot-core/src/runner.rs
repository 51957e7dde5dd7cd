//! Run controller.
//!
//! A run moves through
//! `Created → Configured → Setup → Running → Postprocessing → Cleaned → Done`.
//! Any fatal error moves it to `Failed` after releasing whatever was opened,
//! through the same release path a successful run uses. Record-level errors
//! never leave the `Running` state: they are written to the error log and the
//! loop continues with the next record.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use annot_format::{AnnotWriter, OutputMode, keys};
use annot_ingest::{IngestError, ModuleLocation, PrimaryReader, load_run_config};
use annot_model::{Level, RunConfig};
use chrono::{DateTime, Local};
use tracing::{Span, error, info, info_span, warn};

use crate::annotator::{Annotation, Annotator, RunContext};
use crate::cursor::OutputCursor;
use crate::error::{AnnotateError, Result, RunError};
use crate::error_log::ErrorLog;
use crate::join::Joiner;
use crate::normalize::normalize;
use crate::status::{DUMMY_JOB, ProgressThrottle, StatusSink, StatusUpdate};
use crate::store::{LookupStore, default_search_dirs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    Configured,
    Setup,
    Running,
    Postprocessing,
    Cleaned,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Created => "created",
            RunState::Configured => "configured",
            RunState::Setup => "set up",
            RunState::Running => "running",
            RunState::Postprocessing => "postprocessing",
            RunState::Cleaned => "cleaned",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What to run and where to put the results.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub module: ModuleLocation,
    pub input: PathBuf,
    pub secondary_inputs: BTreeMap<String, PathBuf>,
    pub job_name: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub job_config: Option<PathBuf>,
    pub mode: OutputMode,
    /// Lookup store search path; defaults to the module data directory, then
    /// the shared resource directory.
    pub store_dirs: Option<Vec<PathBuf>>,
    pub report_status: bool,
}

impl RunOptions {
    pub fn new(module: ModuleLocation, input: impl Into<PathBuf>) -> Self {
        Self {
            module,
            input: input.into(),
            secondary_inputs: BTreeMap::new(),
            job_name: None,
            output_dir: None,
            job_config: None,
            mode: OutputMode::Annotated,
            store_dirs: None,
            report_status: true,
        }
    }

    #[must_use]
    pub fn with_secondary(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.secondary_inputs.insert(name.into(), path.into());
        self
    }

    #[must_use]
    pub fn with_job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_job_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.job_config = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_store_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.store_dirs = Some(dirs);
        self
    }

    #[must_use]
    pub fn with_status(mut self, report_status: bool) -> Self {
        self.report_status = report_status;
        self
    }

    /// Job name, defaulting to the input file name.
    pub fn job_name(&self) -> String {
        self.job_name.clone().unwrap_or_else(|| {
            self.input
                .file_name()
                .map_or_else(|| "job".to_string(), |n| n.to_string_lossy().into_owned())
        })
    }

    /// Output directory, defaulting to the directory of the input file.
    pub fn output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        match self.input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn paths(&self, level: Level) -> RunPaths {
        RunPaths::new(&self.output_dir(), &self.job_name(), &self.module.name, level)
    }
}

/// Files produced by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub output: PathBuf,
    pub error_log: PathBuf,
    pub run_log: PathBuf,
    pub status: PathBuf,
}

impl RunPaths {
    pub fn new(output_dir: &Path, job: &str, module: &str, level: Level) -> Self {
        Self {
            output: output_dir.join(format!("{job}.{module}.{}", level.output_suffix())),
            error_log: output_dir.join(format!("{job}.err")),
            run_log: output_dir.join(format!("{job}.log")),
            status: output_dir.join(format!("{job}.status.json")),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub module: String,
    pub display_name: String,
    pub job: String,
    pub version: Option<String>,
    pub paths: RunPaths,
    pub records_read: usize,
    pub rows_written: usize,
    pub skipped: usize,
    pub record_errors: usize,
    pub unique_errors: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub runtime: Duration,
}

impl RunSummary {
    pub fn runtime_secs(&self) -> f64 {
        self.runtime.as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    records_read: usize,
    rows_written: usize,
    skipped: usize,
    record_errors: usize,
}

/// Everything opened during setup and released during cleanup.
struct Resources {
    reader: PrimaryReader,
    joiner: Joiner,
    writer: AnnotWriter,
    store: Option<LookupStore>,
    errors: ErrorLog,
}

pub struct Runner {
    options: RunOptions,
    annotator: Box<dyn Annotator>,
    state: RunState,
    config: Option<RunConfig>,
    resources: Option<Resources>,
    status: StatusSink,
    cancel: Arc<AtomicBool>,
    span: Span,
    counters: Counters,
    unique_errors: usize,
    annotator_started: bool,
    started: Option<(DateTime<Local>, Instant)>,
}

impl Runner {
    pub fn new(options: RunOptions, annotator: Box<dyn Annotator>) -> Self {
        let span = info_span!(
            "annotator",
            annotator = %options.module.name,
            job = %options.job_name()
        );
        Self {
            options,
            annotator,
            state: RunState::Created,
            config: None,
            resources: None,
            status: StatusSink::disabled(),
            cancel: Arc::new(AtomicBool::new(false)),
            span,
            counters: Counters::default(),
            unique_errors: 0,
            annotator_started: false,
            started: None,
        }
    }

    /// Use an already validated configuration instead of loading the module file.
    #[must_use]
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Run lifecycle events are recorded inside `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Flag checked between records; setting it stops the run.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> Option<&RunConfig> {
        self.config.as_ref()
    }

    /// Display name: configured title, else the uppercased module directory name.
    pub fn display_name(&self) -> String {
        self.config
            .as_ref()
            .and_then(|config| config.title.clone())
            .unwrap_or_else(|| self.options.module.default_display_name())
    }

    /// Drive the run to `Done`, or to `Failed` with every opened resource released.
    pub fn run(&mut self) -> Result<RunSummary> {
        let span = self.span.clone();
        let _guard = span.enter();
        match self.drive() {
            Ok(summary) => Ok(summary),
            Err(err) => {
                if let Err(release_err) = self.release() {
                    warn!(error = %release_err, "release after failure incomplete");
                }
                self.state = RunState::Failed;
                self.status.finish();
                error!(error = %err, "run failed");
                Err(err)
            }
        }
    }

    fn drive(&mut self) -> Result<RunSummary> {
        self.configure()?;
        self.setup()?;
        self.process_records()?;
        self.postprocess()?;
        self.cleanup()?;
        self.finish()
    }

    fn expect_state(&self, expected: RunState, action: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(RunError::InvalidState {
                action,
                state: self.state,
            });
        }
        Ok(())
    }

    /// `Created → Configured`: load and validate configuration. No input or
    /// output file is touched.
    pub fn configure(&mut self) -> Result<()> {
        self.expect_state(RunState::Created, "configure")?;
        let started_at = Local::now();
        self.started = Some((started_at, Instant::now()));
        info!(started_at = %started_at.format("%Y-%m-%d %H:%M:%S"), "started");

        if self.config.is_none() {
            let config = load_run_config(&self.options.module, self.options.job_config.as_deref())?;
            self.config = Some(config);
        }

        let job = self.options.job_name();
        if self.options.report_status && job != DUMMY_JOB {
            let level = self.config.as_ref().map_or(Level::Variant, |config| config.level);
            let status_path = self.options.paths(level).status;
            let output_dir = self.options.output_dir();
            std::fs::create_dir_all(&output_dir).map_err(|err| RunError::io(&output_dir, err))?;
            self.status = StatusSink::spawn(status_path);
        }
        self.status.status(format!(
            "Started {} ({})",
            self.display_name(),
            self.options.module.name
        ));
        self.state = RunState::Configured;
        Ok(())
    }

    /// `Configured → Setup`: build secondary indexes, open the primary input,
    /// the error log, the output (headers included) and the lookup store,
    /// then run annotator setup.
    pub fn setup(&mut self) -> Result<()> {
        self.expect_state(RunState::Configured, "set up")?;
        let display_name = self.display_name();
        let Some(config) = self.config.as_ref() else {
            return Err(RunError::InvalidState {
                action: "set up",
                state: self.state,
            });
        };

        let joiner = Joiner::build(config, &self.options.secondary_inputs)?;
        let reader = PrimaryReader::open(
            &self.options.input,
            &config.input_columns,
            config.input_format,
        )?;
        info!(
            input = %self.options.input.display(),
            format = %config.input_format,
            "primary input opened"
        );

        let output_dir = self.options.output_dir();
        std::fs::create_dir_all(&output_dir).map_err(|err| RunError::io(&output_dir, err))?;
        let paths = self.options.paths(config.level);
        let errors = ErrorLog::create(&paths.error_log, &self.options.module.name)?;

        let mut writer = AnnotWriter::create(&paths.output, self.options.mode)?;
        writer.add_columns(config.output_columns.iter().cloned())?;
        writer.write_meta_line(keys::NAME, &self.options.module.name)?;
        writer.write_meta_line(keys::DISPLAY_NAME, &display_name)?;
        if let Some(version) = &config.version {
            writer.write_meta_line(keys::VERSION, version)?;
        }
        writer.write_definition()?;

        let store_dirs = self
            .options
            .store_dirs
            .clone()
            .unwrap_or_else(|| default_search_dirs(&self.options.module.dir));
        let store = LookupStore::open_for_module(&self.options.module.name, &store_dirs)?;
        if let Some(store) = &store {
            info!(path = %store.path().display(), "lookup store opened");
        }

        self.resources = Some(Resources {
            reader,
            joiner,
            writer,
            store,
            errors,
        });

        self.annotator_started = true;
        let ctx = RunContext {
            config,
            module_dir: &self.options.module.dir,
            store: self.resources.as_ref().and_then(|res| res.store.as_ref()),
        };
        self.annotator
            .setup(&ctx)
            .map_err(|err| annotator_error(&self.options.module.name, "setup", &err))?;
        self.state = RunState::Setup;
        Ok(())
    }

    /// `Setup → Running`: the record loop.
    pub fn process_records(&mut self) -> Result<()> {
        self.expect_state(RunState::Setup, "process records")?;
        self.state = RunState::Running;
        let display_name = self.display_name();
        let module = self.options.module.name.as_str();
        let (Some(config), Some(resources)) = (self.config.as_ref(), self.resources.as_mut())
        else {
            return Err(RunError::InvalidState {
                action: "process records",
                state: self.state,
            });
        };
        let ctx = RunContext {
            config,
            module_dir: &self.options.module.dir,
            store: resources.store.as_ref(),
        };
        let id_column = config.id_column();
        let mut throttle = ProgressThrottle::default();

        loop {
            if self.cancel.load(Ordering::SeqCst) {
                return Err(RunError::Cancelled {
                    records: self.counters.records_read,
                });
            }
            let Some(next) = resources.reader.next() else {
                break;
            };
            self.counters.records_read += 1;
            let line = match next.map_err(IngestError::into_record_failure) {
                Ok(line) => line,
                Err(Ok(failure)) => {
                    resources.errors.record(
                        failure.line_number,
                        &failure.raw_line,
                        &failure.message,
                    )?;
                    self.counters.record_errors += 1;
                    continue;
                }
                Err(Err(err)) => return Err(err.into()),
            };

            if self.status.is_enabled() && throttle.is_due(line.line_number, Instant::now()) {
                self.status.status(format!(
                    "Running {display_name} ({module}): line {}",
                    line.line_number
                ));
            }

            let bundle = match resources.joiner.join(&line.record) {
                Ok(bundle) => bundle,
                Err(err) => {
                    resources
                        .errors
                        .record(line.line_number, &line.raw_line, &err.to_string())?;
                    self.counters.record_errors += 1;
                    continue;
                }
            };
            let secondary = (!resources.joiner.is_empty()).then_some(&bundle);

            match self.annotator.annotate(&line.record, secondary, &ctx) {
                Ok(Annotation::Row(row)) => {
                    let id_value = line.record.get(id_column).cloned().unwrap_or_default();
                    let row = normalize(row, &config.output_columns, id_column, &id_value);
                    resources.writer.write_data(&row)?;
                    self.counters.rows_written += 1;
                }
                Ok(Annotation::Skip) => self.counters.skipped += 1,
                Err(err) if err.is_fatal() => {
                    return Err(annotator_error(
                        module,
                        "annotate",
                        &AnnotateError::fatal(format!(
                            "line {}: {}",
                            line.line_number,
                            err.log_message()
                        )),
                    ));
                }
                Err(err) => {
                    resources
                        .errors
                        .record(line.line_number, &line.raw_line, &err.log_message())?;
                    self.counters.record_errors += 1;
                }
            }
        }
        self.unique_errors = resources.errors.unique_messages();
        info!(
            records = self.counters.records_read,
            rows = self.counters.rows_written,
            skipped = self.counters.skipped,
            errors = self.counters.record_errors,
            "records processed"
        );
        Ok(())
    }

    /// `Running → Postprocessing`: hand the annotator a cursor over the output.
    pub fn postprocess(&mut self) -> Result<()> {
        self.expect_state(RunState::Running, "postprocess")?;
        self.state = RunState::Postprocessing;
        let (Some(config), Some(resources)) = (self.config.as_ref(), self.resources.as_mut())
        else {
            return Err(RunError::InvalidState {
                action: "postprocess",
                state: self.state,
            });
        };
        resources.writer.flush()?;
        let mut cursor = OutputCursor::open(
            resources.writer.path(),
            &config.output_columns,
            resources.writer.mode(),
        )?;
        let ctx = RunContext {
            config,
            module_dir: &self.options.module.dir,
            store: resources.store.as_ref(),
        };
        self.annotator
            .postprocess(&mut cursor, &ctx)
            .map_err(|err| annotator_error(&self.options.module.name, "postprocess", &err))
    }

    /// `Postprocessing → Cleaned`: close output and lookup store, then run
    /// annotator cleanup.
    pub fn cleanup(&mut self) -> Result<()> {
        self.expect_state(RunState::Postprocessing, "clean up")?;
        self.release()?;
        self.state = RunState::Cleaned;
        Ok(())
    }

    fn finish(&mut self) -> Result<RunSummary> {
        self.expect_state(RunState::Cleaned, "finish")?;
        let Some(config) = self.config.as_ref() else {
            return Err(RunError::InvalidState {
                action: "finish",
                state: self.state,
            });
        };
        let (started_at, start) = self
            .started
            .unwrap_or_else(|| (Local::now(), Instant::now()));
        let runtime = start.elapsed();
        let finished_at = Local::now();
        let display_name = self.display_name();
        let module = self.options.module.name.clone();

        self.status.send(StatusUpdate::Version {
            module: module.clone(),
            version: config
                .version
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        });
        self.status
            .status(format!("Finished {display_name} ({module})"));
        self.status.finish();

        info!(
            finished_at = %finished_at.format("%Y-%m-%d %H:%M:%S"),
            runtime = %format!("{:.3}s", runtime.as_secs_f64()),
            "finished"
        );
        self.state = RunState::Done;
        Ok(RunSummary {
            module,
            display_name,
            job: self.options.job_name(),
            version: config.version.clone(),
            paths: self.options.paths(config.level),
            records_read: self.counters.records_read,
            rows_written: self.counters.rows_written,
            skipped: self.counters.skipped,
            record_errors: self.counters.record_errors,
            unique_errors: self.unique_errors,
            started_at,
            finished_at,
            runtime,
        })
    }

    /// Close everything opened so far. Annotator cleanup failures are logged,
    /// not returned.
    fn release(&mut self) -> Result<()> {
        let mut first_error = None;
        if let Some(resources) = self.resources.take() {
            let Resources {
                writer,
                store,
                mut errors,
                ..
            } = resources;
            if let Err(err) = writer.close() {
                first_error.get_or_insert(RunError::from(err));
            }
            if let Some(store) = store
                && let Err(err) = store.close()
            {
                first_error.get_or_insert(err);
            }
            if let Err(err) = errors.flush() {
                first_error.get_or_insert(err);
            }
        }
        if self.annotator_started {
            self.annotator_started = false;
            if let Err(err) = self.annotator.cleanup() {
                warn!(error = %format!("{err:#}"), "annotator cleanup failed");
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if self.resources.is_some() || self.annotator_started {
            let _ = self.release();
        }
    }
}

fn annotator_error(module: &str, stage: &'static str, err: &AnnotateError) -> RunError {
    RunError::Annotator {
        module: module.to_string(),
        stage,
        message: err.log_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_follow_job_and_module() {
        let paths = RunPaths::new(Path::new("/out"), "sample.crv", "clinvar", Level::Variant);
        assert_eq!(paths.output, PathBuf::from("/out/sample.crv.clinvar.var"));
        assert_eq!(paths.error_log, PathBuf::from("/out/sample.crv.err"));
        assert_eq!(paths.run_log, PathBuf::from("/out/sample.crv.log"));
        let gene = RunPaths::new(Path::new("/out"), "j", "m", Level::Gene);
        assert_eq!(gene.output, PathBuf::from("/out/j.m.gen"));
    }

    #[test]
    fn defaults_come_from_the_input_path() {
        let location = ModuleLocation::new(Path::new("/modules"), "demo");
        let options = RunOptions::new(location.clone(), "/data/run1/input.crv");
        assert_eq!(options.job_name(), "input.crv");
        assert_eq!(options.output_dir(), PathBuf::from("/data/run1"));

        let bare = RunOptions::new(location, "input.crv")
            .with_job_name("job")
            .with_output_dir("/tmp/out");
        assert_eq!(bare.job_name(), "job");
        assert_eq!(bare.output_dir(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn relative_input_defaults_to_current_dir() {
        let options = RunOptions::new(ModuleLocation::new(Path::new("m"), "x"), "input.crv");
        assert_eq!(options.output_dir(), PathBuf::from("."));
    }
}
