pub mod fetch;
pub mod pending;
pub mod report;
pub mod status;

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use lightcurve_fetch::{InputError, InputTable, TargetId};

/// Where to ask for a replacement column when the configured one is
/// missing.
pub struct ColumnPrompt<'a> {
    pub input: &'a mut dyn BufRead,
    pub output: &'a mut dyn Write,
}

/// Read the identifier column from the input table.
///
/// A missing column is retried once with a name read from `prompt`, or
/// fails right away without one.
pub fn read_identifiers(
    input: &Path,
    column: &str,
    prompt: Option<ColumnPrompt<'_>>,
) -> Result<Vec<TargetId>> {
    let table = InputTable::open(input)
        .with_context(|| format!("failed to read input table: {}", input.display()))?;

    match table.identifiers(column) {
        Ok(ids) => {
            tracing::info!(column, count = ids.len(), "using identifier column");
            Ok(ids)
        }
        Err(InputError::MissingColumn { column, available }) => {
            let Some(prompt) = prompt else {
                anyhow::bail!(
                    "column '{column}' not found in {}; available columns: {}",
                    input.display(),
                    available.join(", ")
                );
            };

            writeln!(prompt.output, "Column '{column}' not found in the input table.")?;
            writeln!(prompt.output, "Available columns: {}", available.join(", "))?;
            write!(prompt.output, "Please enter the column name containing Kepler IDs: ")?;
            prompt.output.flush()?;

            let mut answer = String::new();
            prompt.input.read_line(&mut answer)?;
            let answer = answer.trim();

            table.identifiers(answer).map_err(|e| match e {
                InputError::MissingColumn { column, .. } => {
                    anyhow::anyhow!("column '{column}' not found, giving up")
                }
                other => other.into(),
            })
        }
        Err(e) => Err(e.into()),
    }
}
