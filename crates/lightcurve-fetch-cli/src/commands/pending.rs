use std::io::Write;

use anyhow::{Context, Result};
use lightcurve_fetch::{ArtifactLayout, CsvSummaryFile, TargetId, WorkList, build_work_list};

use super::fetch::load_prior;
use crate::config::AppConfig;

/// Print how many identifiers a `fetch` would still dispatch, and
/// optionally which ones. Nothing is written to disk.
pub fn run<W: Write>(
    config: &AppConfig,
    ids: Vec<TargetId>,
    list: bool,
    out: &mut W,
) -> Result<WorkList> {
    let total = ids.len();

    let layout = ArtifactLayout::new(&config.output_dir);
    let prior = load_prior(&CsvSummaryFile::new(config.summary_path()));
    let work = build_work_list(ids, prior.as_ref(), &layout).with_context(|| {
        format!(
            "failed to scan output directory: {}",
            config.output_dir.display()
        )
    })?;

    writeln!(out, "Input identifiers: {total}")?;
    writeln!(out, "Already in summary: {}", work.skipped_from_summary)?;
    writeln!(out, "Found on disk: {}", work.found_existing.len())?;
    if work.duplicates > 0 {
        writeln!(out, "Duplicates: {}", work.duplicates)?;
    }
    writeln!(out, "Pending: {}", work.pending.len())?;

    if list {
        for id in &work.pending {
            writeln!(out, "{id}")?;
        }
    }

    Ok(work)
}
