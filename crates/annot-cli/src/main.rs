//! `annot`: run one annotation module over an input file.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use annot_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg, RunArgs};
use annot_cli::commands::{prepare_run, remove_run_log, run_annotation, run_modules};
use annot_cli::logging::{LogConfig, LogFormat, init_logging, parse_level};
use annot_cli::modules::default_registry;
use annot_cli::summary::print_summary;
use annot_core::DUMMY_JOB;
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let exit_code = match &cli.command {
        Command::Run(args) => run(&cli, args),
        Command::Modules => {
            let log_config = log_config_from_cli(&cli, None, cli.log_file.clone());
            if let Err(error) = init_logging(&log_config) {
                eprintln!("error: failed to initialize logging: {error}");
                std::process::exit(1);
            }
            match run_modules(default_registry(), cli.modules_dir.as_deref()) {
                Ok(()) => 0,
                Err(error) => {
                    eprintln!("error: {error:#}");
                    1
                }
            }
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli, args: &RunArgs) -> i32 {
    let prepared = match prepare_run(args, cli.modules_dir.as_deref(), default_registry()) {
        Ok(prepared) => prepared,
        Err(error) => {
            eprintln!("error: {error:#}");
            return 1;
        }
    };
    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| prepared.paths().run_log);
    let log_config = log_config_from_cli(
        cli,
        prepared.config.logging_level.as_deref(),
        Some(log_file.clone()),
    );
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        return 1;
    }
    let dummy_log = (prepared.options.job_name() == DUMMY_JOB && cli.log_file.is_none())
        .then_some(log_file);

    let exit_code = match run_annotation(prepared) {
        Ok(summary) => {
            print_summary(&summary);
            0
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    if let Some(path) = dummy_log {
        remove_run_log(&path);
    }
    exit_code
}

/// Level precedence: `--log-level`, then `-v/-q`, then the module's
/// `logging_level`, then `RUST_LOG`, then info.
fn log_config_from_cli(
    cli: &Cli,
    configured_level: Option<&str>,
    log_file: Option<PathBuf>,
) -> LogConfig {
    let configured = configured_level.and_then(parse_level);
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter =
        !(cli.verbosity.is_present() || cli.log_level.is_some() || configured.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    } else if let Some(level) = configured.filter(|_| !cli.verbosity.is_present()) {
        config.level_filter = level;
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => log_file.is_none() && io::stderr().is_terminal(),
    };
    config.log_file = log_file;
    config
}
