//! `secondary_count`: how many secondary rows matched each record.

use annot_core::{AnnotateError, Annotation, Annotator, RunContext, SecondaryData};
use annot_model::{Record, Value};

pub const NAME: &str = "secondary_count";
pub const DESCRIPTION: &str = "Count of matching secondary input rows";

#[derive(Debug, Default)]
pub struct SecondaryCount;

impl Annotator for SecondaryCount {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn setup(&mut self, ctx: &RunContext<'_>) -> Result<(), AnnotateError> {
        if ctx.config.secondary_inputs.is_empty() {
            return Err(AnnotateError::fatal(
                "no secondary inputs are declared for this module",
            ));
        }
        Ok(())
    }

    fn annotate(
        &mut self,
        _input: &Record,
        secondary: Option<&SecondaryData<'_>>,
        _ctx: &RunContext<'_>,
    ) -> Result<Annotation, AnnotateError> {
        let Some(secondary) = secondary else {
            return Ok(Annotation::Skip);
        };
        let rows: usize = secondary.values().copied().map(<[Record]>::len).sum();
        let sources: Vec<&str> = secondary
            .iter()
            .filter(|(_, matches)| !matches.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();

        let mut row = Record::new();
        row.insert("secondary_rows".to_string(), Value::from(rows));
        row.insert(
            "matched_sources".to_string(),
            Value::from((!sources.is_empty()).then(|| sources.join(","))),
        );
        Ok(Annotation::Row(row))
    }
}
