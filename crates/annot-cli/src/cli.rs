//! CLI argument definitions for the annotation runner.

use std::path::PathBuf;

use annot_ingest::SecondaryBinding;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "annot",
    version,
    about = "Run per-record annotation modules over variant and gene files",
    long_about = "Run one annotation module over a primary input file.\n\n\
                  Each record is joined against optional secondary inputs, annotated,\n\
                  and written as one row of a tab-separated output file. Records that\n\
                  fail are written to <job>.err and skipped."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags and the module's logging_level).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to this file (default for runs: <OUTPUT_DIR>/<JOB>.log).
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Directory holding one subdirectory per module.
    #[arg(long = "modules-dir", value_name = "DIR", global = true)]
    pub modules_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Annotate an input file with one module.
    Run(RunArgs),

    /// List the built-in annotation modules.
    Modules,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Name of the annotation module.
    #[arg(value_name = "MODULE")]
    pub module: String,

    /// Primary input file (crv, crx or crg).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Secondary input as NAME@PATH. Repeat once per declared secondary input.
    #[arg(short = 's', long = "secondary", value_name = "NAME@PATH")]
    pub secondary: Vec<SecondaryBinding>,

    /// Job name (default: the input file name).
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub job_name: Option<String>,

    /// Output directory (default: the input file's directory).
    #[arg(short = 'd', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Job configuration with [annotators.<MODULE>] overrides.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub job_config: Option<PathBuf>,

    /// Write a single title row instead of column definition meta lines.
    #[arg(short = 'p', long = "plainoutput")]
    pub plain_output: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
