use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use lightcurve_fetch::{
    Archive, ArtifactLayout, CsvSummaryFile, Dispatcher, RunObserver, RunReport, Summary,
    TargetId, build_work_list,
};

use super::report::write_report;
use crate::config::AppConfig;

/// Load the prior summary, treating an unreadable one as absent.
///
/// An unreadable file is copied to `<name>.unreadable` first, since the
/// first checkpoint replaces it.
pub fn load_prior(summary_file: &CsvSummaryFile) -> Option<Summary> {
    match summary_file.load() {
        Ok(Some(summary)) => {
            tracing::info!(
                rows = summary.len(),
                path = %summary_file.path().display(),
                "loaded existing results"
            );
            Some(summary)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(
                path = %summary_file.path().display(),
                error = %e,
                "could not load existing summary, starting fresh"
            );
            let backup = backup_path(summary_file.path());
            match std::fs::copy(summary_file.path(), &backup) {
                Ok(_) => tracing::warn!(
                    backup = %backup.display(),
                    "kept a copy of the unreadable summary"
                ),
                Err(e) => tracing::warn!(
                    backup = %backup.display(),
                    error = %e,
                    "could not copy unreadable summary"
                ),
            }
            None
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".unreadable");
    PathBuf::from(name)
}

/// Resume a bulk fetch of `ids`: reconcile, dispatch, report.
pub async fn run<W: Write>(
    archive: Arc<dyn Archive>,
    config: &AppConfig,
    ids: Vec<TargetId>,
    limit: Option<usize>,
    observer: &dyn RunObserver,
    out: &mut W,
) -> Result<RunReport> {
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;
    let layout = ArtifactLayout::new(&config.output_dir);

    let summary_file = CsvSummaryFile::new(config.summary_path());
    let prior = load_prior(&summary_file);

    let mut work = build_work_list(ids, prior.as_ref(), &layout).with_context(|| {
        format!(
            "failed to scan output directory: {}",
            config.output_dir.display()
        )
    })?;

    if work.skipped_from_summary > 0 {
        tracing::info!(count = work.skipped_from_summary, "skipping already processed IDs");
    }
    if !work.found_existing.is_empty() {
        tracing::info!(
            count = work.found_existing.len(),
            "found files that already exist but weren't in summary"
        );
    }
    if work.duplicates > 0 {
        tracing::info!(count = work.duplicates, "dropped duplicate IDs from input");
    }
    if let Some(limit) = limit
        && work.pending.len() > limit
    {
        tracing::info!(limit, "processing only the first pending IDs");
        work.truncate(limit);
    }
    tracing::info!(pending = work.pending.len(), "preparing to download");

    let mut summary = prior.unwrap_or_default();
    summary.extend(work.found_existing);

    let dispatcher = Dispatcher::new(archive, layout, config.run_config());
    let report = dispatcher
        .run(work.pending, &mut summary, &summary_file, observer)
        .await?;

    write_report(
        out,
        summary_file.path(),
        &report.stats,
        report.advisory.as_ref(),
    )?;

    Ok(report)
}
