//! Secondary index building and lookup.

use std::io::Write;

use annot_ingest::{IngestError, SecondaryIndex};
use annot_model::{ConfigError, Value};
use tempfile::NamedTempFile;

const GENES: &str = concat!(
    "#column={\"index\":0,\"name\":\"gene\",\"type\":\"string\"}\n",
    "#column={\"index\":1,\"name\":\"panel\",\"type\":\"string\"}\n",
    "#column={\"index\":2,\"name\":\"weight\",\"type\":\"float\"}\n",
    "BRCA1\tcancer\t0.9\n",
    "TP53\tcancer\t0.8\n",
    "BRCA1\tovarian\t0.5\n",
    "\tnone\t0.1\n",
);

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn duplicate_keys_keep_file_order() {
    let file = temp_file(GENES);
    let index = SecondaryIndex::build(file.path(), "gene", &[]).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.row_count(), 3);

    let rows = index.get("BRCA1");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["panel"], Value::text("cancer"));
    assert_eq!(rows[1]["panel"], Value::text("ovarian"));
    assert_eq!(
        index.get_values("BRCA1", "weight"),
        vec![&Value::Float(0.9), &Value::Float(0.5)]
    );
}

#[test]
fn unknown_key_is_empty() {
    let file = temp_file(GENES);
    let index = SecondaryIndex::build(file.path(), "gene", &[]).unwrap();
    assert!(index.get("EGFR").is_empty());
    assert!(index.get_values("EGFR", "panel").is_empty());
}

#[test]
fn fetch_columns_restrict_records() {
    let file = temp_file(GENES);
    let index = SecondaryIndex::build(file.path(), "gene", &["weight".to_string()]).unwrap();
    let rows = index.get("TP53");
    assert_eq!(rows[0].len(), 1);
    assert!(rows[0].contains_key("weight"));
    assert_eq!(index.columns().len(), 1);
}

#[test]
fn missing_key_column_is_a_configuration_error() {
    let file = temp_file(GENES);
    let err = SecondaryIndex::build(file.path(), "hugo", &[]).unwrap_err();
    assert!(matches!(
        err,
        IngestError::Config(ConfigError::MissingKeyColumn { .. })
    ));
}

#[test]
fn missing_fetch_column_is_a_configuration_error() {
    let file = temp_file(GENES);
    let err = SecondaryIndex::build(file.path(), "gene", &["score".to_string()]).unwrap_err();
    assert!(matches!(
        err,
        IngestError::Config(ConfigError::MissingColumns { ref columns, .. }) if columns == &["score"]
    ));
}

#[test]
fn sparse_column_indices_select_their_fields() {
    let file = temp_file(concat!(
        "#column={\"index\":1,\"name\":\"gene\",\"type\":\"string\"}\n",
        "#column={\"index\":3,\"name\":\"weight\",\"type\":\"float\"}\n",
        "x\tBRCA1\ty\t0.9\n",
        "x\tTP53\ty\t0.8\n",
    ));
    let index = SecondaryIndex::build(file.path(), "gene", &[]).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.get_values("BRCA1", "weight"), vec![&Value::Float(0.9)]);

    let fetched = SecondaryIndex::build(file.path(), "gene", &["weight".to_string()]).unwrap();
    assert_eq!(fetched.get("TP53")[0]["weight"], Value::Float(0.8));
}
