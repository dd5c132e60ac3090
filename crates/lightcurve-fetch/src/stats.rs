use std::collections::HashMap;

use crate::result::FetchResult;

/// Error rate above which the advisory fires.
pub const DEFAULT_MAX_ERROR_RATE: f64 = 0.5;
/// The advisory only fires when more workers than this were used.
pub const DEFAULT_MIN_WORKERS: usize = 5;

/// Aggregate counts over a set of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub total: usize,
    pub succeeded: usize,
    /// `(status text, count)`, most frequent first, ties by status text.
    pub by_status: Vec<(String, usize)>,
}

impl RunStats {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a FetchResult>) -> Self {
        let mut total = 0;
        let mut succeeded = 0;
        let mut counts: HashMap<String, usize> = HashMap::new();

        for result in results {
            total += 1;
            if result.success {
                succeeded += 1;
            }
            *counts.entry(result.status.to_string()).or_insert(0) += 1;
        }

        let mut by_status: Vec<(String, usize)> = counts.into_iter().collect();
        by_status.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            total,
            succeeded,
            by_status,
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// Fraction of results that failed; 0 when there are none.
    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.failed() as f64 / self.total as f64
        }
    }
}

/// When to suggest a smaller worker pool for the next run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvisoryPolicy {
    pub max_error_rate: f64,
    pub min_workers: usize,
}

impl Default for AdvisoryPolicy {
    fn default() -> Self {
        Self {
            max_error_rate: DEFAULT_MAX_ERROR_RATE,
            min_workers: DEFAULT_MIN_WORKERS,
        }
    }
}

/// A suggestion for the next run. Never changes the current one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advisory {
    pub error_rate: f64,
    pub suggested_workers: usize,
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "High error rate ({:.1}%). Consider reducing workers to {} in your next run.",
            self.error_rate * 100.0,
            self.suggested_workers
        )
    }
}

impl AdvisoryPolicy {
    pub fn advise(&self, stats: &RunStats, workers: usize) -> Option<Advisory> {
        let error_rate = stats.error_rate();
        if error_rate > self.max_error_rate && workers > self.min_workers {
            Some(Advisory {
                error_rate,
                suggested_workers: workers / 2,
            })
        } else {
            None
        }
    }
}
