use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,lightcurve_fetch=info,lightcurve_fetch_mast=info,lightcurve_fetch_cli=info";
const VERBOSE_FILTER: &str = "info,lightcurve_fetch=debug,lightcurve_fetch_mast=debug,lightcurve_fetch_cli=debug";

/// Initialize logging to stderr. stdout carries the run report.
///
/// `RUST_LOG` wins over `verbose` when set.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
