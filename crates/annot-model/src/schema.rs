//! Column declarations, schemas, record levels and input formats.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::value::DataType;

fn default_aggregate() -> bool {
    true
}

/// Declaration of one input or output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub data_type: DataType,
    /// Whether downstream summarization folds this column's values.
    #[serde(default = "default_aggregate")]
    pub aggregate: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            title: None,
            data_type,
            aggregate: true,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, DataType::String)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Float)
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_aggregate(mut self, aggregate: bool) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Title for human-facing output, falling back to the name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Ordered, name-unique column declarations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ConfigError::DuplicateColumn {
                    name: column.name.clone(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Put `identifier` first. Running this on a schema that already leads with
    /// the identifier is a no-op; an identifier declared elsewhere is moved.
    #[must_use]
    pub fn with_identifier(mut self, identifier: ColumnDef) -> Self {
        if self
            .columns
            .first()
            .is_some_and(|first| first.name == identifier.name)
        {
            return self;
        }
        let existing = self
            .columns
            .iter()
            .position(|column| column.name == identifier.name);
        let column = match existing {
            Some(idx) => self.columns.remove(idx),
            None => identifier,
        };
        self.columns.insert(0, column);
        self
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDef> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn identifier(&self) -> Option<&ColumnDef> {
        self.columns.first()
    }

    /// Names of columns whose aggregate hint is off.
    pub fn non_aggregating(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| !column.aggregate)
            .map(|column| column.name.as_str())
            .collect()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let columns = Vec::<ColumnDef>::deserialize(deserializer)?;
        Schema::new(columns).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a ColumnDef;
    type IntoIter = std::slice::Iter<'a, ColumnDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// Granularity of annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Variant,
    Gene,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Variant => "variant",
            Level::Gene => "gene",
        }
    }

    /// The identifier column injected as the first output column.
    pub fn identifier_column(self) -> ColumnDef {
        match self {
            Level::Variant => ColumnDef::int("uid").with_title("UID"),
            Level::Gene => ColumnDef::string("hugo").with_title("HUGO symbol"),
        }
    }

    pub fn default_input_format(self) -> InputFormat {
        match self {
            Level::Variant => InputFormat::Crv,
            Level::Gene => InputFormat::Crg,
        }
    }

    /// Extension of the annotation output file.
    pub fn output_suffix(self) -> &'static str {
        match self {
            Level::Variant => "var",
            Level::Gene => "gen",
        }
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "variant" => Ok(Level::Variant),
            "gene" => Ok(Level::Gene),
            other => Err(ConfigError::InvalidLevel {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary input file flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Variant list.
    Crv,
    /// Variant list with gene mappings.
    Crx,
    /// Gene list.
    Crg,
}

impl InputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            InputFormat::Crv => "crv",
            InputFormat::Crx => "crx",
            InputFormat::Crg => "crg",
        }
    }

    /// Column layout assumed when a file carries no column definitions.
    pub fn positional_columns(self) -> Vec<ColumnDef> {
        let variant = || {
            vec![
                ColumnDef::int("uid").with_title("UID"),
                ColumnDef::string("chrom").with_title("Chromosome"),
                ColumnDef::int("pos").with_title("Position"),
                ColumnDef::string("ref_base").with_title("Reference base(s)"),
                ColumnDef::string("alt_base").with_title("Alternate base(s)"),
            ]
        };
        match self {
            InputFormat::Crv => variant(),
            InputFormat::Crx => {
                let mut columns = variant();
                columns.extend([
                    ColumnDef::string("hugo").with_title("HUGO symbol"),
                    ColumnDef::string("transcript").with_title("Transcript"),
                    ColumnDef::string("so").with_title("Sequence ontology"),
                    ColumnDef::string("all_mappings").with_title("All mappings"),
                ]);
                columns
            }
            InputFormat::Crg => vec![
                ColumnDef::string("hugo").with_title("HUGO symbol"),
                ColumnDef::int("num_variants").with_title("Number of variants"),
                ColumnDef::string("so").with_title("Sequence ontology"),
                ColumnDef::string("all_so").with_title("All sequence ontologies"),
            ],
        }
    }

    pub fn positional_names(self) -> Vec<String> {
        self.positional_columns()
            .into_iter()
            .map(|column| column.name)
            .collect()
    }
}

impl FromStr for InputFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "crv" => Ok(InputFormat::Crv),
            "crx" => Ok(InputFormat::Crx),
            "crg" => Ok(InputFormat::Crg),
            other => Err(ConfigError::InvalidInputFormat {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Schema::new(vec![ColumnDef::string("a"), ColumnDef::int("a")]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateColumn { name } if name == "a"));
    }

    #[test]
    fn identifier_injection_is_idempotent() {
        let schema = Schema::new(vec![ColumnDef::float("score")]).unwrap();
        let once = schema.with_identifier(Level::Variant.identifier_column());
        let twice = once.clone().with_identifier(Level::Variant.identifier_column());
        assert_eq!(once, twice);
        assert_eq!(once.names().collect::<Vec<_>>(), vec!["uid", "score"]);
    }

    #[test]
    fn identifier_declared_later_is_moved_first() {
        let schema = Schema::new(vec![ColumnDef::float("score"), ColumnDef::string("hugo")])
            .unwrap()
            .with_identifier(Level::Gene.identifier_column());
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["hugo", "score"]);
    }

    #[test]
    fn non_aggregating_lists_flagged_columns() {
        let schema = Schema::new(vec![
            ColumnDef::string("a"),
            ColumnDef::string("b").with_aggregate(false),
            ColumnDef::string("c").with_aggregate(false),
        ])
        .unwrap();
        assert_eq!(schema.non_aggregating(), vec!["b", "c"]);
    }

    #[test]
    fn crx_extends_crv() {
        let crv = InputFormat::Crv.positional_names();
        let crx = InputFormat::Crx.positional_names();
        assert_eq!(&crx[..crv.len()], crv.as_slice());
        assert!(crx.contains(&"hugo".to_string()));
    }

    #[test]
    fn level_parse_rejects_unknown() {
        assert_eq!("gene".parse::<Level>().unwrap(), Level::Gene);
        assert!(matches!(
            "summary".parse::<Level>(),
            Err(ConfigError::InvalidLevel { .. })
        ));
    }
}
