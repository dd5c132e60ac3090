use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use crate::archive::{Archive, ArchiveError};
use crate::layout::ArtifactLayout;
use crate::result::{FetchResult, FetchStatus};
use crate::target::TargetId;

/// Fetch one target and write its artifact.
///
/// Always returns a result; every failure, a panicking archive included, is
/// reported as a row with `success == false`. If the artifact already exists
/// the archive is not contacted and the result is `Skipped`, so calling this
/// twice for the same target is harmless.
pub async fn fetch_one(
    archive: Arc<dyn Archive>,
    target: TargetId,
    layout: ArtifactLayout,
    timeout: Option<Duration>,
) -> FetchResult {
    if layout.exists(&target) {
        tracing::debug!(kepler_id = %target, "artifact already exists, skipping");
        let path = layout.path_for(&target);
        return FetchResult::succeeded(target, path, FetchStatus::Skipped);
    }

    let guarded = AssertUnwindSafe(archive.fetch(&target)).catch_unwind();
    let fetched = match timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(fetched) => fetched,
            Err(_) => {
                tracing::debug!(kepler_id = %target, ?limit, "fetch timed out");
                return FetchResult::failed(
                    target,
                    FetchStatus::TimedOut {
                        secs: limit.as_secs_f64().ceil() as u64,
                    },
                );
            }
        },
        None => guarded.await,
    };

    let fetched = match fetched {
        Ok(fetched) => fetched,
        Err(payload) => {
            let msg = panic_message(payload);
            tracing::warn!(kepler_id = %target, error = %msg, "archive panicked");
            return FetchResult::failed(target, FetchStatus::Crashed(msg));
        }
    };

    let curve = match fetched {
        Ok(curve) => curve,
        Err(ArchiveError::NotFound(_)) => {
            tracing::debug!(kepler_id = %target, archive = archive.label(), "no light curve found");
            return FetchResult::failed(target, FetchStatus::NotFound);
        }
        Err(e) => {
            tracing::debug!(kepler_id = %target, error = %e, "fetch failed");
            return FetchResult::failed(target, FetchStatus::Error(e.to_string()));
        }
    };

    let write_target = target.clone();
    let written = tokio::task::spawn_blocking(move || {
        layout.write_artifact(&write_target, &curve)
    })
    .await;

    match written {
        Ok(Ok(path)) => {
            tracing::debug!(kepler_id = %target, path = %path.display(), "downloaded");
            FetchResult::succeeded(target, path, FetchStatus::Downloaded)
        }
        Ok(Err(e)) => FetchResult::failed(
            target,
            FetchStatus::Error(format!("failed to write artifact: {e}")),
        ),
        Err(e) => FetchResult::failed(
            target,
            FetchStatus::Error(format!("artifact writer stopped: {e}")),
        ),
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_owned()
    }
}
