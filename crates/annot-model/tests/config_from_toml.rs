//! Run configuration parsed from module TOML files.

use annot_model::{ConfigError, DataType, InputFormat, Level, RawConfig, RunConfig};

fn parse(text: &str) -> Result<RunConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(text).map_err(|err| ConfigError::parse("test.toml", err))?;
    RunConfig::from_raw("clinvar", raw)
}

#[test]
fn full_module_file() {
    let config = parse(
        r#"
level = "variant"
input_format = "crx"
title = "ClinVar"
version = "2024.01"

[[output_columns]]
name = "significance"
title = "Clinical significance"
type = "string"

[[output_columns]]
name = "review_stars"
type = "int"
aggregate = false

[secondary_inputs.genes]
match_columns = { primary = "hugo", secondary = "gene" }
use_columns = ["gene", "panel"]
"#,
    )
    .unwrap();

    assert_eq!(config.level, Level::Variant);
    assert_eq!(config.input_format, InputFormat::Crx);
    assert_eq!(
        config.output_columns.names().collect::<Vec<_>>(),
        vec!["uid", "significance", "review_stars"]
    );
    assert_eq!(
        config.output_columns.get("review_stars").unwrap().data_type,
        DataType::Int
    );
    assert_eq!(config.output_columns.non_aggregating(), vec!["review_stars"]);
    assert_eq!(config.display_title(), "ClinVar");
    let genes = &config.secondary_inputs["genes"];
    assert_eq!(genes.match_columns.secondary, "gene");
    assert_eq!(genes.use_columns, vec!["gene", "panel"]);
}

#[test]
fn duplicate_output_column_is_rejected() {
    let err = parse(
        r#"
level = "gene"
output_columns = [{ name = "score" }, { name = "score", type = "float" }]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateColumn { name } if name == "score"));
}

#[test]
fn unknown_data_type_is_a_parse_error() {
    let err = parse(
        r#"
level = "gene"
output_columns = [{ name = "score", type = "decimal" }]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn invalid_level_names_the_value() {
    let err = parse(
        r#"
level = "sample"
output_columns = []
"#,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "sample is not a valid level. Valid levels are variant, gene"
    );
}
