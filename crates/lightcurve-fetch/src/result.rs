use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::target::TargetId;

/// Outcome label recorded for one identifier.
///
/// The `Display` text is what lands in the summary's `status` column, and
/// [`FetchStatus::parse`] reads it back to the same variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FetchStatus {
    Downloaded,
    /// The worker found the artifact already on disk.
    Skipped,
    /// The work-list builder found the artifact before dispatch.
    FoundExisting,
    NotFound,
    TimedOut { secs: u64 },
    Error(String),
    /// The worker task itself died (panicked or was aborted).
    Crashed(String),
    /// Free text read back from a summary we did not write.
    Other(String),
}

impl FetchStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "Downloaded" => Self::Downloaded,
            "Skipped (already exists)" => Self::Skipped,
            "Found existing file" => Self::FoundExisting,
            "No light curve found" => Self::NotFound,
            other => {
                if let Some(msg) = other.strip_prefix("Error: ") {
                    Self::Error(msg.to_owned())
                } else if let Some(msg) = other.strip_prefix("Exception: ") {
                    Self::Crashed(msg.to_owned())
                } else if let Some(secs) = other
                    .strip_prefix("Timed out after ")
                    .and_then(|rest| rest.strip_suffix('s'))
                    .and_then(|n| n.parse().ok())
                {
                    Self::TimedOut { secs }
                } else {
                    Self::Other(other.to_owned())
                }
            }
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downloaded => write!(f, "Downloaded"),
            Self::Skipped => write!(f, "Skipped (already exists)"),
            Self::FoundExisting => write!(f, "Found existing file"),
            Self::NotFound => write!(f, "No light curve found"),
            Self::TimedOut { secs } => write!(f, "Timed out after {secs}s"),
            Self::Error(msg) => write!(f, "Error: {msg}"),
            Self::Crashed(msg) => write!(f, "Exception: {msg}"),
            Self::Other(text) => write!(f, "{text}"),
        }
    }
}

impl From<String> for FetchStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<FetchStatus> for String {
    fn from(value: FetchStatus) -> Self {
        value.to_string()
    }
}

/// One row of the summary: what happened to one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub kepler_id: TargetId,
    #[serde(deserialize_with = "deserialize_flag")]
    pub success: bool,
    pub output_file: Option<PathBuf>,
    pub status: FetchStatus,
}

impl FetchResult {
    pub fn succeeded(kepler_id: TargetId, output_file: PathBuf, status: FetchStatus) -> Self {
        Self {
            kepler_id,
            success: true,
            output_file: Some(output_file),
            status,
        }
    }

    pub fn failed(kepler_id: TargetId, status: FetchStatus) -> Self {
        Self {
            kepler_id,
            success: false,
            output_file: None,
            status,
        }
    }
}

/// Accepts the spellings other tools use for booleans in CSV
/// (`true`, `True`, `1`, ...).
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid success flag: {other:?}"
        ))),
    }
}
