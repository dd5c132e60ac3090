use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::{Archive, ArchiveError, LightCurve, TargetId};

enum Outcome {
    Curve(LightCurve),
    Fail(ArchiveError),
    Panic,
}

/// In-memory archive for testing.
///
/// Targets without a scripted outcome are `NotFound`. Tracks per-target call
/// counts and the highest number of fetches in flight at once.
pub struct InMemoryArchive {
    label: String,
    outcomes: HashMap<TargetId, Outcome>,
    delay: Option<Duration>,
    calls: Mutex<HashMap<TargetId, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryArchive {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            outcomes: HashMap::new(),
            delay: None,
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every fetch sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn add(&mut self, target: impl Into<TargetId>, curve: LightCurve) {
        self.outcomes.insert(target.into(), Outcome::Curve(curve));
    }

    pub fn fail(&mut self, target: impl Into<TargetId>, error: ArchiveError) {
        self.outcomes.insert(target.into(), Outcome::Fail(error));
    }

    /// Fetching this target panics inside the archive.
    pub fn panic_on(&mut self, target: impl Into<TargetId>) {
        self.outcomes.insert(target.into(), Outcome::Panic);
    }

    pub fn calls(&self, target: &TargetId) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(target).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Archive for InMemoryArchive {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, target: &TargetId) -> Result<LightCurve, ArchiveError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(target.clone()).or_insert(0) += 1;
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.outcomes.get(target) {
            Some(Outcome::Curve(curve)) => Ok(curve.clone()),
            Some(Outcome::Fail(error)) => Err(error.clone()),
            Some(Outcome::Panic) => panic!("archive blew up on {target}"),
            None => Err(ArchiveError::NotFound(target.clone())),
        }
    }
}
