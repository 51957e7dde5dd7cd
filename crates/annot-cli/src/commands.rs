use std::collections::BTreeSet;
use std::path::Path;

use annot_core::{Annotator, AnnotatorRegistry, RunError, RunOptions, RunPaths, RunSummary, Runner};
use annot_format::OutputMode;
use annot_ingest::{ModuleLocation, load_run_config, modules_root};
use annot_model::RunConfig;
use anyhow::{Context, Result, bail};
use comfy_table::Table;
use tracing::debug;

use crate::cli::RunArgs;
use crate::summary::apply_table_style;

/// A run whose module, configuration and options are resolved but which has
/// not touched any input or output yet.
pub struct PreparedRun {
    pub options: RunOptions,
    pub config: RunConfig,
    pub annotator: Box<dyn Annotator>,
}

impl PreparedRun {
    pub fn paths(&self) -> RunPaths {
        self.options.paths(self.config.level)
    }
}

pub fn prepare_run(
    args: &RunArgs,
    modules_dir: Option<&Path>,
    registry: &AnnotatorRegistry,
) -> Result<PreparedRun> {
    let annotator = registry
        .create(&args.module)
        .ok_or_else(|| RunError::UnknownAnnotator {
            name: args.module.clone(),
        })?;
    let location = ModuleLocation::new(&modules_root(modules_dir), &args.module);
    let config = load_run_config(&location, args.job_config.as_deref())
        .with_context(|| format!("load configuration of module {}", args.module))?;

    let mode = if args.plain_output {
        OutputMode::Plain
    } else {
        OutputMode::Annotated
    };
    let mut options = RunOptions::new(location, args.input.clone()).with_mode(mode);
    let mut seen = BTreeSet::new();
    for binding in &args.secondary {
        if !seen.insert(binding.name.as_str()) {
            bail!("secondary input {} given more than once", binding.name);
        }
        options = options.with_secondary(binding.name.clone(), binding.path.clone());
    }
    if let Some(name) = &args.job_name {
        options = options.with_job_name(name.clone());
    }
    if let Some(dir) = &args.output_dir {
        options = options.with_output_dir(dir.clone());
    }
    if let Some(path) = &args.job_config {
        options = options.with_job_config(path.clone());
    }

    Ok(PreparedRun {
        options,
        config,
        annotator,
    })
}

pub fn run_annotation(prepared: PreparedRun) -> Result<RunSummary> {
    let PreparedRun {
        options,
        config,
        annotator,
    } = prepared;
    let input = options.input.clone();
    let mut runner = Runner::new(options, annotator).with_config(config);
    runner
        .run()
        .with_context(|| format!("annotate {}", input.display()))
}

/// Remove the log of a throwaway run. A log that cannot be removed is left
/// in place.
pub fn remove_run_log(path: &Path) {
    if let Err(error) = std::fs::remove_file(path) {
        debug!(path = %path.display(), %error, "run log not removed");
    }
}

pub fn run_modules(registry: &AnnotatorRegistry, modules_dir: Option<&Path>) -> Result<()> {
    let root = modules_root(modules_dir);
    let mut table = Table::new();
    table.set_header(vec!["Module", "Description", "Configuration"]);
    apply_table_style(&mut table);
    for name in registry.names() {
        let location = ModuleLocation::new(&root, name);
        let config_path = location.config_path();
        let configured = if config_path.is_file() {
            config_path.display().to_string()
        } else {
            "missing".to_string()
        };
        table.add_row(vec![
            name.to_string(),
            registry.description(name).unwrap_or_default().to_string(),
            configured,
        ]);
    }
    println!("{table}");
    Ok(())
}
