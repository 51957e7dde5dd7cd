use std::path::PathBuf;
use std::str::FromStr;

use annot_model::ConfigError;

/// A `name@path` secondary input binding from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryBinding {
    pub name: String,
    pub path: PathBuf,
}

impl FromStr for SecondaryBinding {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once('@') {
            Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok(Self {
                name: name.to_string(),
                path: PathBuf::from(path),
            }),
            _ => Err(ConfigError::InvalidSecondaryBinding {
                binding: value.to_string(),
            }),
        }
    }
}
