//! Annotator trait and registry.
//!
//! An annotator supplies the per-record transformation of one module. Input
//! parsing, secondary joins, error isolation and output writing are handled by
//! the [`crate::Runner`]; the annotator only sees typed records.
//!
//! Annotators are registered explicitly under their module name:
//!
//! ```ignore
//! let mut registry = AnnotatorRegistry::new();
//! registry.register("ref_len", "Reference allele length", || Box::new(RefLen::default()));
//! let annotator = registry.create("ref_len").unwrap();
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use annot_model::{Record, RunConfig, Value};

use crate::cursor::OutputCursor;
use crate::error::AnnotateError;
use crate::store::LookupStore;

/// Matching secondary records per secondary source name.
pub type SecondaryData<'a> = BTreeMap<String, &'a [Record]>;

/// Per-column value lists of every output row belonging to one gene.
pub type GeneValues = BTreeMap<String, Vec<Value>>;

/// Result of annotating one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// Write this row after normalizing it against the output columns.
    Row(Record),
    /// Write nothing for this record.
    Skip,
}

impl From<Record> for Annotation {
    fn from(record: Record) -> Self {
        Annotation::Row(record)
    }
}

impl From<Option<Record>> for Annotation {
    fn from(record: Option<Record>) -> Self {
        record.map_or(Annotation::Skip, Annotation::Row)
    }
}

/// Read-only run state shared with the annotator.
#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    pub config: &'a RunConfig,
    pub module_dir: &'a Path,
    pub store: Option<&'a LookupStore>,
}

/// The per-record transformation of one annotation module.
pub trait Annotator: Send {
    /// Module name this annotator is registered under.
    fn name(&self) -> &'static str;

    /// Human-readable description of the annotator.
    fn description(&self) -> &'static str {
        "Annotator"
    }

    /// Called once after inputs, output and lookup store are open.
    fn setup(&mut self, _ctx: &RunContext<'_>) -> Result<(), AnnotateError> {
        Ok(())
    }

    /// Annotate one primary record.
    ///
    /// `secondary` is `Some` whenever the module declares secondary inputs,
    /// even when nothing matched this record.
    fn annotate(
        &mut self,
        input: &Record,
        secondary: Option<&SecondaryData<'_>>,
        ctx: &RunContext<'_>,
    ) -> Result<Annotation, AnnotateError>;

    /// Called after the last record with a cursor over the written output.
    fn postprocess(
        &mut self,
        _output: &mut OutputCursor,
        _ctx: &RunContext<'_>,
    ) -> Result<(), AnnotateError> {
        Ok(())
    }

    /// Release annotator resources. Failures are logged, never raised.
    fn cleanup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Fold the values collected for one gene into a single summary row.
    /// `None` leaves the gene out of the summary.
    fn summarize_by_gene(&mut self, _hugo: &str, _values: &GeneValues) -> Option<Record> {
        None
    }
}

pub type AnnotatorFactory = fn() -> Box<dyn Annotator>;

struct Registration {
    description: &'static str,
    factory: AnnotatorFactory,
}

/// Registry of annotator factories keyed by module name.
#[derive(Default)]
pub struct AnnotatorRegistry {
    entries: HashMap<&'static str, Registration>,
}

impl AnnotatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for `name`, replacing any earlier registration.
    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        factory: AnnotatorFactory,
    ) {
        self.entries.insert(
            name,
            Registration {
                description,
                factory,
            },
        );
    }

    /// A fresh annotator instance for `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn Annotator>> {
        self.entries.get(name).map(|entry| (entry.factory)())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn description(&self, name: &str) -> Option<&'static str> {
        self.entries.get(name).map(|entry| entry.description)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered module names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
