use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::result::FetchResult;
use crate::target::TargetId;

/// Errors that can occur reading or writing a summary.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Cumulative, ordered record of outcomes across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    rows: Vec<FetchResult>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<FetchResult>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FetchResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, result: FetchResult) {
        self.rows.push(result);
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = FetchResult>) {
        self.rows.extend(results);
    }

    /// Identifiers with at least one row.
    pub fn ids(&self) -> HashSet<&TargetId> {
        self.rows.iter().map(|r| &r.kepler_id).collect()
    }

    pub fn contains(&self, id: &TargetId) -> bool {
        self.rows.iter().any(|r| &r.kepler_id == id)
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self, SummaryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let rows = csv_reader
            .deserialize()
            .collect::<Result<Vec<FetchResult>, _>>()?;
        Ok(Self { rows })
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), SummaryError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.rows.is_empty() {
            csv_writer.write_record(["kepler_id", "success", "output_file", "status"])?;
        }
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Load a summary file. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, SummaryError> {
        match std::fs::File::open(path) {
            Ok(file) => Self::read_from(file).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite the whole summary at `path`. The new contents replace the old
    /// file in one rename, so readers never see a partial table.
    pub fn save(&self, path: &Path) -> Result<(), SummaryError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".summary-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        self.write_to(tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Where checkpoints of a summary go.
pub trait SummarySink: Send + Sync {
    fn persist(&self, summary: &Summary) -> Result<(), SummaryError>;
}

/// Persists the summary as a CSV file, overwriting it each time.
#[derive(Debug, Clone)]
pub struct CsvSummaryFile {
    path: PathBuf,
}

impl CsvSummaryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Summary>, SummaryError> {
        Summary::load(&self.path)
    }
}

impl SummarySink for CsvSummaryFile {
    fn persist(&self, summary: &Summary) -> Result<(), SummaryError> {
        summary.save(&self.path)
    }
}
