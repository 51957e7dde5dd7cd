//! Reconcile annotator output with the declared output columns.

use annot_model::{Record, Schema, Value};

/// Force `id_value` into `id_column`, fill every declared column the
/// annotator left out with [`Value::Missing`], and drop undeclared columns.
pub fn normalize(mut row: Record, schema: &Schema, id_column: &str, id_value: &Value) -> Record {
    row.insert(id_column.to_string(), id_value.clone());
    schema
        .iter()
        .map(|column| {
            let value = row.remove(&column.name).unwrap_or_default();
            (column.name.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use annot_model::{ColumnDef, Level};
    use proptest::prelude::*;

    use super::*;

    fn schema(names: &[String]) -> Schema {
        Schema::new(names.iter().map(ColumnDef::string).collect())
            .unwrap()
            .with_identifier(Level::Variant.identifier_column())
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Missing),
            any::<i64>().prop_map(Value::Int),
            "[a-z]{0,6}".prop_map(Value::Text),
        ]
    }

    #[test]
    fn identifier_is_overwritten() {
        let schema = schema(&["score".to_string()]);
        let mut row = Record::new();
        row.insert("uid".to_string(), Value::Int(99));
        row.insert("score".to_string(), Value::Int(7));
        let out = normalize(row, &schema, "uid", &Value::Int(1));
        assert_eq!(out["uid"], Value::Int(1));
        assert_eq!(out["score"], Value::Int(7));
    }

    proptest! {
        #[test]
        fn output_has_exactly_the_declared_columns(
            declared in proptest::collection::btree_set("[a-z]{1,5}", 0..6),
            produced in proptest::collection::btree_map("[a-z]{1,5}", value_strategy(), 0..8),
            id in any::<i64>(),
        ) {
            let declared: Vec<String> = declared.into_iter().filter(|name| name != "uid").collect();
            let schema = schema(&declared);
            let out = normalize(produced.clone(), &schema, "uid", &Value::Int(id));

            prop_assert_eq!(out.len(), schema.len());
            prop_assert_eq!(&out["uid"], &Value::Int(id));
            for name in &declared {
                let expected = produced.get(name).cloned().unwrap_or_default();
                prop_assert_eq!(&out[name], &expected);
            }
        }
    }
}
