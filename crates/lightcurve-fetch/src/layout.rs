use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::light_curve::LightCurve;
use crate::target::TargetId;

pub const DEFAULT_PREFIX: &str = "kepler_";
pub const DEFAULT_SUFFIX: &str = "_lightkurve.csv";

/// Errors that can occur while writing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Maps identifiers to artifact files in an output directory.
///
/// Layout: `<dir>/<prefix><id><suffix>`, e.g.
/// `lightkurve_data/kepler_10797460_lightkurve.csv`. Bytes of the
/// identifier outside `[A-Za-z0-9._-]` are written as `%XX`, so distinct
/// identifiers never share a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    dir: PathBuf,
    prefix: String,
    suffix: String,
}

impl ArtifactLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_template(dir, DEFAULT_PREFIX, DEFAULT_SUFFIX)
    }

    pub fn with_template(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self, id: &TargetId) -> String {
        format!("{}{}{}", self.prefix, sanitize(id.as_str()), self.suffix)
    }

    pub fn path_for(&self, id: &TargetId) -> PathBuf {
        self.dir.join(self.file_name(id))
    }

    pub fn exists(&self, id: &TargetId) -> bool {
        self.path_for(id).is_file()
    }

    /// True if `name` fits the `<prefix>...<suffix>` template with a
    /// non-empty middle.
    pub fn matches(&self, name: &str) -> bool {
        name.len() > self.prefix.len() + self.suffix.len()
            && name.starts_with(&self.prefix)
            && name.ends_with(&self.suffix)
    }

    /// File names in the output directory that fit the template.
    /// A missing directory yields an empty set.
    pub fn scan(&self) -> io::Result<HashSet<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(e),
        };

        let mut names = HashSet::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && self.matches(name)
            {
                names.insert(name.to_owned());
            }
        }
        Ok(names)
    }

    /// Write a light curve to its artifact path. Creates the directory as
    /// needed. The file only appears under its final name once fully
    /// written, so a present artifact is always a complete one.
    pub fn write_artifact(
        &self,
        id: &TargetId,
        curve: &LightCurve,
    ) -> Result<PathBuf, ArtifactError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(id);

        let mut tmp = tempfile::Builder::new()
            .prefix(".partial-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        curve.write_csv(tmp.as_file_mut(), id)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        Ok(path)
    }
}

/// Percent-encode everything but `[A-Za-z0-9._-]`, `%` included.
fn sanitize(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for &b in id.as_bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.') {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
