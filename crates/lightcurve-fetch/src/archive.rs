use std::sync::Arc;

use crate::light_curve::LightCurve;
use crate::target::TargetId;

/// Errors that can occur when fetching from an archive.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArchiveError {
    #[error("no light curve found for {0}")]
    NotFound(TargetId),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

/// A remote archive of light curves.
///
/// Implementations look up a target, pick its first light-curve product
/// and decode it into a [`LightCurve`].
#[async_trait::async_trait]
pub trait Archive: Send + Sync {
    /// Human-readable label identifying this archive.
    fn label(&self) -> &str;

    /// Fetch the light curve for one target.
    async fn fetch(&self, target: &TargetId) -> Result<LightCurve, ArchiveError>;
}

#[async_trait::async_trait]
impl<T: Archive + ?Sized> Archive for Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    async fn fetch(&self, target: &TargetId) -> Result<LightCurve, ArchiveError> {
        (**self).fetch(target).await
    }
}
