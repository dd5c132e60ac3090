use std::io::{IsTerminal, Write};
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use lightcurve_fetch::{FetchResult, RunObserver};

const TEMPLATE: &str =
    "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} light curves ({percent:>3}%) | {msg}";

/// Progress bar on stderr, hidden when stderr is not a terminal.
///
/// Checkpoint notices go above the bar, or to stdout while it is hidden.
pub struct ProgressObserver {
    bar: ProgressBar,
    notices: Mutex<Box<dyn Write + Send>>,
}

impl ProgressObserver {
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled && std::io::stderr().is_terminal() {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
                bar.set_style(style.progress_chars("=> "));
            }
            bar
        } else {
            ProgressBar::hidden()
        };
        Self::with_notices(bar, Box::new(std::io::stdout()))
    }

    fn with_notices(bar: ProgressBar, notices: Box<dyn Write + Send>) -> Self {
        Self {
            bar,
            notices: Mutex::new(notices),
        }
    }

    fn notice(&self, line: String) {
        if !self.bar.is_hidden() {
            self.bar.println(line);
            return;
        }
        if let Ok(mut out) = self.notices.lock()
            && let Err(e) = writeln!(out, "{line}")
        {
            tracing::debug!(error = %e, "could not print notice");
        }
    }
}

impl RunObserver for ProgressObserver {
    fn started(&self, pending: usize) {
        self.bar.set_length(pending as u64);
        self.bar
            .enable_steady_tick(std::time::Duration::from_millis(120));
    }

    fn completed(&self, result: &FetchResult, done: usize, _total: usize) {
        self.bar.set_position(done as u64);
        self.bar.set_message(format!("{}: {}", result.kepler_id, result.status));
    }

    fn checkpointed(&self, done: usize, total: usize) {
        self.notice(format!("Intermediate progress saved: {done}/{total} completed"));
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }
}
