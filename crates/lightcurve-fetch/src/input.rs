use std::io::Read;
use std::path::Path;

use crate::target::TargetId;

/// Errors that can occur while reading the input table.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read input table: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{column}' not found; available columns: {}", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

/// A CSV table of catalog rows. Lines starting with `#` are treated as
/// comments, which covers the header blocks in archive exports.
#[derive(Debug, Clone)]
pub struct InputTable {
    headers: Vec<String>,
    records: Vec<csv::StringRecord>,
}

impl InputTable {
    pub fn open(path: &Path) -> Result<Self, InputError> {
        let reader = Self::builder().from_path(path)?;
        Self::from_csv(reader)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, InputError> {
        Self::from_csv(Self::builder().from_reader(reader))
    }

    fn builder() -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::Headers);
        builder
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, InputError> {
        let headers = reader.headers()?.iter().map(str::to_owned).collect();
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, records })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identifiers from one column, in row order. Blank cells are skipped.
    pub fn identifiers(&self, column: &str) -> Result<Vec<TargetId>, InputError> {
        let index = self
            .headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| InputError::MissingColumn {
                column: column.to_owned(),
                available: self.headers.clone(),
            })?;

        Ok(self
            .records
            .iter()
            .filter_map(|record| record.get(index))
            .map(TargetId::new)
            .filter(|id| !id.is_empty())
            .collect())
    }
}
