//! Module configuration lookup and loading.
//!
//! A module lives in `<modules_dir>/<module>/` and is configured by
//! `<module>.toml` in that directory. A job configuration may override
//! individual keys per module under `[annotators.<module>]`.

use std::path::{Path, PathBuf};

use annot_model::{ConfigError, RawConfig, RunConfig};
use toml::Table;
use tracing::debug;

/// Environment variable for overriding the modules directory.
pub const MODULES_DIR_ENV_VAR: &str = "ANNOT_MODULES_DIR";

/// Resolve the modules directory.
///
/// Resolution order:
/// 1. `explicit` (the `--modules-dir` flag)
/// 2. `ANNOT_MODULES_DIR` environment variable
/// 3. `modules/` in the working directory
pub fn modules_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Ok(root) = std::env::var(MODULES_DIR_ENV_VAR) {
        return PathBuf::from(root);
    }
    PathBuf::from("modules")
}

/// Where a module's files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    pub name: String,
    pub dir: PathBuf,
}

impl ModuleLocation {
    pub fn new(root: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            dir: root.join(&name),
            name,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(format!("{}.toml", self.name))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.join("data")
    }

    /// Uppercased directory name, used when no title is configured.
    pub fn default_display_name(&self) -> String {
        self.dir
            .file_name()
            .map_or_else(|| self.name.clone(), |n| n.to_string_lossy().into_owned())
            .to_uppercase()
    }
}

fn read_table(path: &Path) -> Result<Table, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
    toml::from_str(&text).map_err(|err| ConfigError::parse(path, err))
}

/// Keys under `[annotators.<module>]` in a job configuration file.
pub fn load_job_overrides(path: &Path, module: &str) -> Result<Table, ConfigError> {
    let mut table = read_table(path)?;
    let overrides = table
        .remove("annotators")
        .and_then(|annotators| match annotators {
            toml::Value::Table(mut modules) => modules.remove(module),
            _ => None,
        });
    match overrides {
        Some(toml::Value::Table(overrides)) => Ok(overrides),
        Some(_) => Err(ConfigError::parse(
            path,
            format!("annotators.{module} must be a table"),
        )),
        None => Ok(Table::new()),
    }
}

/// Override keys replace base keys wholesale; nested tables are not merged.
pub fn merge(mut base: Table, overrides: Table) -> Table {
    for (key, value) in overrides {
        base.insert(key, value);
    }
    base
}

pub fn raw_config_from_table(path: &Path, table: Table) -> Result<RawConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|err| ConfigError::parse(path, err))
}

/// Load and validate the run configuration of `location`, applying job
/// overrides when a job configuration is given.
pub fn load_run_config(
    location: &ModuleLocation,
    job_config: Option<&Path>,
) -> Result<RunConfig, ConfigError> {
    let path = location.config_path();
    let mut table = read_table(&path)?;
    if let Some(job_path) = job_config {
        let overrides = load_job_overrides(job_path, &location.name)?;
        debug!(
            module = %location.name,
            job_config = %job_path.display(),
            keys = overrides.len(),
            "applying job configuration overrides"
        );
        table = merge(table, overrides);
    }
    let raw = raw_config_from_table(&path, table)?;
    RunConfig::from_raw(&location.name, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> Table {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn explicit_modules_dir_wins() {
        let root = modules_root(Some(Path::new("/opt/modules")));
        assert_eq!(root, PathBuf::from("/opt/modules"));
    }

    #[test]
    fn module_paths() {
        let location = ModuleLocation::new(Path::new("/m"), "clinvar");
        assert_eq!(location.config_path(), PathBuf::from("/m/clinvar/clinvar.toml"));
        assert_eq!(location.data_dir(), PathBuf::from("/m/clinvar/data"));
        assert_eq!(location.default_display_name(), "CLINVAR");
    }

    #[test]
    fn merge_replaces_whole_keys() {
        let base = table("level = \"variant\"\ntitle = \"A\"\n[secondary_inputs.x]\nmatch_columns = { primary = \"uid\", secondary = \"uid\" }\n");
        let overrides = table("title = \"B\"\nsecondary_inputs = {}\n");
        let merged = merge(base, overrides);
        assert_eq!(merged["title"].as_str(), Some("B"));
        assert_eq!(merged["level"].as_str(), Some("variant"));
        assert!(merged["secondary_inputs"].as_table().unwrap().is_empty());
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "level = ").unwrap();
        assert!(matches!(
            load_job_overrides(&path, "x"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
