use std::io::{self, Write};
use std::path::Path;

use lightcurve_fetch::{Advisory, RunStats};

/// Print the end-of-run report.
///
/// ```text
/// Summary saved to out/kepler_lightkurve_summary.csv
/// Successfully downloaded 3 out of 4 light curves
///
/// Status breakdown:
///   Downloaded: 3
///   No light curve found: 1
/// ```
pub fn write_report<W: Write>(
    out: &mut W,
    summary_path: &Path,
    stats: &RunStats,
    advisory: Option<&Advisory>,
) -> io::Result<()> {
    writeln!(out, "Summary saved to {}", summary_path.display())?;
    writeln!(
        out,
        "Successfully downloaded {} out of {} light curves",
        stats.succeeded, stats.total
    )?;

    if !stats.by_status.is_empty() {
        writeln!(out)?;
        writeln!(out, "Status breakdown:")?;
        for (status, count) in &stats.by_status {
            writeln!(out, "  {status}: {count}")?;
        }
    }

    if let Some(advisory) = advisory {
        writeln!(out)?;
        writeln!(out, "WARNING: {advisory}")?;
    }

    Ok(())
}
