use std::io::Write;

use anyhow::{Context, Result};
use lightcurve_fetch::{AdvisoryPolicy, RunStats, Summary};

use super::report::write_report;
use crate::config::AppConfig;

/// Print the report for an existing summary without fetching anything.
///
/// The advisory is evaluated against the configured worker count, since
/// the summary does not record how many workers produced it.
pub fn run<W: Write>(config: &AppConfig, out: &mut W) -> Result<RunStats> {
    let path = config.summary_path();
    let summary = Summary::load(&path)
        .with_context(|| format!("failed to read summary: {}", path.display()))?
        .with_context(|| format!("no summary at {}", path.display()))?;

    let stats = RunStats::from_results(summary.rows());
    let policy = AdvisoryPolicy {
        max_error_rate: config.advisory.max_error_rate,
        min_workers: config.advisory.min_workers,
    };
    let advisory = policy.advise(&stats, config.workers);

    write_report(out, &path, &stats, advisory.as_ref())?;
    Ok(stats)
}
