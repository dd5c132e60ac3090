use std::collections::HashSet;
use std::io;

use crate::layout::ArtifactLayout;
use crate::result::{FetchResult, FetchStatus};
use crate::summary::Summary;
use crate::target::TargetId;

/// Identifiers still needing a fetch, plus what was reconciled away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkList {
    /// Identifiers to dispatch, in input order.
    pub pending: Vec<TargetId>,
    /// Synthetic results for artifacts found on disk but missing from the
    /// prior summary.
    pub found_existing: Vec<FetchResult>,
    /// Input identifiers dropped because the prior summary already has them.
    pub skipped_from_summary: usize,
    /// Repeated identifiers dropped from the input.
    pub duplicates: usize,
}

impl WorkList {
    /// Keep only the first `limit` pending identifiers.
    pub fn truncate(&mut self, limit: usize) {
        self.pending.truncate(limit);
    }
}

/// Reconcile the input identifiers against the prior summary and the
/// artifacts already on disk.
///
/// The directory scan runs independently of the summary: a run that
/// crashed after writing an artifact but before checkpointing leaves a file
/// the summary never heard of, and that file wins.
pub fn build_work_list(
    ids: impl IntoIterator<Item = TargetId>,
    prior: Option<&Summary>,
    layout: &ArtifactLayout,
) -> io::Result<WorkList> {
    let mut work = WorkList::default();

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for id in ids {
        if seen.insert(id.clone()) {
            unique.push(id);
        } else {
            work.duplicates += 1;
        }
    }

    let recorded = prior.map(Summary::ids).unwrap_or_default();
    let on_disk = layout.scan()?;

    for id in unique {
        if recorded.contains(&id) {
            work.skipped_from_summary += 1;
            continue;
        }

        if on_disk.contains(&layout.file_name(&id)) {
            let path = layout.path_for(&id);
            work.found_existing
                .push(FetchResult::succeeded(id, path, FetchStatus::FoundExisting));
            continue;
        }

        work.pending.push(id);
    }

    tracing::debug!(
        pending = work.pending.len(),
        found_existing = work.found_existing.len(),
        skipped_from_summary = work.skipped_from_summary,
        duplicates = work.duplicates,
        "built work list"
    );

    Ok(work)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    fn ids(raw: &[&str]) -> Vec<TargetId> {
        raw.iter().copied().map(TargetId::new).collect()
    }

    fn recorded(id: &str, status: FetchStatus) -> FetchResult {
        FetchResult {
            kepler_id: TargetId::new(id),
            success: matches!(status, FetchStatus::Downloaded),
            output_file: None,
            status,
        }
    }

    #[test]
    fn resume_skips_ids_in_prior_summary() {
        let tmp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(tmp.path());
        let prior = Summary::from_rows(vec![
            recorded("A", FetchStatus::Downloaded),
            recorded("B", FetchStatus::NotFound),
        ]);

        let work = build_work_list(ids(&["A", "B", "C"]), Some(&prior), &layout).unwrap();

        assert_eq!(work.pending, ids(&["C"]));
        assert_eq!(work.skipped_from_summary, 2);
        assert!(work.found_existing.is_empty());
    }

    #[test]
    fn artifact_on_disk_takes_precedence() {
        let tmp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(tmp.path());
        std::fs::write(layout.path_for(&TargetId::new("B")), "time\n").unwrap();

        let work = build_work_list(ids(&["A", "B"]), None, &layout).unwrap();

        assert_eq!(work.pending, ids(&["A"]));
        assert_eq!(work.found_existing.len(), 1);
        let found = &work.found_existing[0];
        assert_eq!(found.kepler_id, TargetId::new("B"));
        assert!(found.success);
        assert_eq!(found.status, FetchStatus::FoundExisting);
        assert_eq!(found.output_file, Some(layout.path_for(&TargetId::new("B"))));
    }

    #[test]
    fn lookalike_artifact_does_not_count_as_existing() {
        let tmp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(tmp.path());
        std::fs::write(layout.path_for(&TargetId::new("KIC-1")), "time\n").unwrap();

        let work = build_work_list(ids(&["KIC 1", "KIC/1"]), None, &layout).unwrap();

        assert_eq!(work.pending, ids(&["KIC 1", "KIC/1"]));
        assert!(work.found_existing.is_empty());
    }

    #[test]
    fn summary_match_is_by_normalized_string() {
        let tmp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(tmp.path());
        let prior = Summary::from_rows(vec![recorded("757450", FetchStatus::Downloaded)]);

        let work = build_work_list(ids(&[" 757450 ", "891901"]), Some(&prior), &layout).unwrap();
        assert_eq!(work.pending, ids(&["891901"]));
    }

    #[test]
    fn duplicate_input_ids_are_dispatched_once() {
        let tmp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(tmp.path());

        let work = build_work_list(ids(&["A", "B", "A", "C", "B"]), None, &layout).unwrap();
        assert_eq!(work.pending, ids(&["A", "B", "C"]));
        assert_eq!(work.duplicates, 2);
    }

    #[test]
    fn files_for_ids_not_in_input_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(tmp.path());
        std::fs::write(layout.path_for(&TargetId::new("Z")), "time\n").unwrap();

        let work = build_work_list(ids(&["A"]), None, &layout).unwrap();
        assert_eq!(work.pending, ids(&["A"]));
        assert!(work.found_existing.is_empty());
    }

    #[test]
    fn missing_output_dir_means_nothing_on_disk() {
        let tmp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(PathBuf::from(tmp.path()).join("not-yet"));
        let work = build_work_list(ids(&["A"]), None, &layout).unwrap();
        assert_eq!(work.pending, ids(&["A"]));
    }

    #[test]
    fn truncate_limits_pending_only() {
        let tmp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(tmp.path());
        let mut work = build_work_list(ids(&["A", "B", "C"]), None, &layout).unwrap();
        work.truncate(2);
        assert_eq!(work.pending, ids(&["A", "B"]));
    }
}
