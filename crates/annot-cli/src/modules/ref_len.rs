//! `ref_len`: length of the reference allele.
//!
//! When the module has a lookup store, its `nucleotide_names` table
//! (`base TEXT, name TEXT`) is loaded at setup and the reference allele is
//! also spelled out base by base in `verbose_ref`.

use std::collections::HashMap;

use annot_core::{AnnotateError, Annotation, Annotator, RunContext, SecondaryData};
use annot_model::{Record, Value};
use anyhow::Context;
use rusqlite::Connection;
use tracing::debug;

pub const NAME: &str = "ref_len";
pub const DESCRIPTION: &str = "Reference allele length";

/// Allele used for insertions.
const NO_BASES: &str = "-";

#[derive(Debug, Default)]
pub struct RefLen {
    nucleotide_names: HashMap<char, String>,
}

impl RefLen {
    fn verbose(&self, bases: &str) -> Option<String> {
        if self.nucleotide_names.is_empty() {
            return None;
        }
        let names: Vec<&str> = bases
            .chars()
            .map(|base| {
                self.nucleotide_names
                    .get(&base)
                    .map_or("unknown", String::as_str)
            })
            .collect();
        Some(names.join(","))
    }
}

impl Annotator for RefLen {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn setup(&mut self, ctx: &RunContext<'_>) -> Result<(), AnnotateError> {
        let Some(store) = ctx.store else {
            return Ok(());
        };
        self.nucleotide_names = load_nucleotide_names(store.connection())
            .with_context(|| format!("reading nucleotide_names from {}", store.path().display()))?;
        debug!(names = self.nucleotide_names.len(), "nucleotide names loaded");
        Ok(())
    }

    fn annotate(
        &mut self,
        input: &Record,
        _secondary: Option<&SecondaryData<'_>>,
        _ctx: &RunContext<'_>,
    ) -> Result<Annotation, AnnotateError> {
        let Some(ref_base) = input.get("ref_base").and_then(Value::as_str) else {
            return Ok(Annotation::Skip);
        };
        let bases = if ref_base == NO_BASES {
            ""
        } else {
            ref_base
        };
        if let Some(bad) = bases
            .chars()
            .find(|base| !matches!(base, 'A' | 'C' | 'G' | 'T' | 'N'))
        {
            return Err(AnnotateError::invalid(format!(
                "unexpected base '{bad}' in reference allele {ref_base}"
            )));
        }

        let mut row = Record::new();
        row.insert("ref_len".to_string(), Value::from(bases.len()));
        row.insert("verbose_ref".to_string(), Value::from(self.verbose(bases)));
        Ok(Annotation::Row(row))
    }
}

fn load_nucleotide_names(conn: &Connection) -> rusqlite::Result<HashMap<char, String>> {
    let mut stmt = conn.prepare("SELECT base, name FROM nucleotide_names")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    let mut names = HashMap::new();
    for row in rows {
        let (base, name) = row?;
        if let Some(base) = base.chars().next() {
            names.insert(base.to_ascii_uppercase(), name);
        }
    }
    Ok(names)
}
