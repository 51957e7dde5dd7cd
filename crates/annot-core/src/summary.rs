//! Gene-level summaries of variant output.

use std::collections::BTreeMap;

use annot_model::{Record, Value};

use crate::annotator::{Annotator, GeneValues};
use crate::error::Result;

/// Output values grouped by gene, then by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneCollection {
    genes: BTreeMap<String, GeneValues>,
}

impl GeneCollection {
    /// Group `columns` of every row by the value of `gene_column`. Rows without
    /// a gene are left out.
    pub fn collect<I>(rows: I, gene_column: &str, columns: &[&str]) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        let mut collection = Self::default();
        for row in rows {
            let row = row?;
            let Some(gene) = row.get(gene_column).and_then(Value::key) else {
                continue;
            };
            collection.add(gene, &row, columns);
        }
        Ok(collection)
    }

    pub fn add(&mut self, gene: String, row: &Record, columns: &[&str]) {
        let values = self.genes.entry(gene).or_insert_with(|| {
            columns
                .iter()
                .map(|column| ((*column).to_string(), Vec::new()))
                .collect()
        });
        for column in columns {
            let value = row.get(*column).cloned().unwrap_or_default();
            values.entry((*column).to_string()).or_default().push(value);
        }
    }

    pub fn get(&self, gene: &str) -> Option<&GeneValues> {
        self.genes.get(gene)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> impl Iterator<Item = &str> {
        self.genes.keys().map(String::as_str)
    }

    /// Ask `annotator` for one summary row per gene, skipping genes it
    /// returns nothing for.
    pub fn summarize(&self, annotator: &mut dyn Annotator) -> BTreeMap<String, Record> {
        self.genes
            .iter()
            .filter_map(|(gene, values)| {
                annotator
                    .summarize_by_gene(gene, values)
                    .map(|row| (gene.clone(), row))
            })
            .collect()
    }
}
