//! Typed field values carried in records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidData;

/// Declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    #[serde(alias = "str", alias = "category")]
    String,
    #[serde(alias = "integer")]
    Int,
    #[serde(alias = "double")]
    Float,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Int => "int",
            DataType::Float => "float",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a record. `Missing` is written as an empty field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    #[default]
    Missing,
}

/// A record keyed by column name. Column order comes from the schema, not the map.
pub type Record = BTreeMap<String, Value>;

impl Value {
    /// Coerce a raw field to the declared type. Empty input is always `Missing`.
    pub fn parse(column: &str, raw: &str, data_type: DataType) -> Result<Self, InvalidData> {
        if raw.is_empty() {
            return Ok(Value::Missing);
        }
        match data_type {
            DataType::String => Ok(Value::Text(raw.to_string())),
            DataType::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| invalid(column, raw, data_type)),
            DataType::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| invalid(column, raw, data_type)),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Float(value) if value.fract() == 0.0 => Some(*value as i64),
            Value::Float(_) | Value::Missing => None,
            Value::Text(value) => value.trim().parse().ok(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            Value::Text(value) => value.trim().parse().ok(),
            Value::Missing => None,
        }
    }

    /// Canonical text used for join keys, so `7` in one file matches `"7"` in another.
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

fn invalid(column: &str, raw: &str, data_type: DataType) -> InvalidData {
    InvalidData {
        column: column.to_string(),
        value: raw.to_string(),
        expected: data_type.as_str(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(value) => f.write_str(value),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Missing => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Value::Float(value as f64), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Missing, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_is_missing_for_every_type() {
        for data_type in [DataType::String, DataType::Int, DataType::Float] {
            assert_eq!(Value::parse("c", "", data_type), Ok(Value::Missing));
        }
    }

    #[test]
    fn parses_declared_types() {
        assert_eq!(Value::parse("pos", "123", DataType::Int), Ok(Value::Int(123)));
        assert_eq!(
            Value::parse("score", "0.5", DataType::Float),
            Ok(Value::Float(0.5))
        );
        assert_eq!(
            Value::parse("chrom", "chr1", DataType::String),
            Ok(Value::text("chr1"))
        );
    }

    #[test]
    fn bad_int_reports_column_and_value() {
        let err = Value::parse("pos", "12x", DataType::Int).unwrap_err();
        assert_eq!(err.column, "pos");
        assert_eq!(err.value, "12x");
        assert_eq!(err.to_string(), "invalid value '12x' for pos (int)");
    }

    #[test]
    fn only_whole_floats_convert_to_int() {
        assert_eq!(Value::Float(2.0).as_i64(), Some(2));
        assert_eq!(Value::Float(2.5).as_i64(), None);
        assert_eq!(Value::text(" 12 ").as_i64(), Some(12));
        assert_eq!(Value::Missing.as_i64(), None);
    }

    #[test]
    fn join_keys_are_type_agnostic() {
        assert_eq!(Value::Int(7).key(), Value::text("7").key());
        assert_eq!(Value::Missing.key(), None);
    }

    #[test]
    fn display_writes_missing_as_empty() {
        assert_eq!(Value::Missing.to_string(), "");
        assert_eq!(Value::Float(7.0).to_string(), "7");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
    }

    #[test]
    fn data_type_aliases_deserialize() {
        #[derive(Deserialize)]
        struct Holder {
            kind: DataType,
        }
        let holder: Holder = serde_json::from_str(r#"{"kind":"integer"}"#).unwrap();
        assert_eq!(holder.kind, DataType::Int);
    }
}
