use std::path::PathBuf;
use std::time::Duration;

use lightcurve_fetch::dispatch::{DEFAULT_CHECKPOINT_EVERY, DEFAULT_FETCH_TIMEOUT, DEFAULT_WORKERS};
use lightcurve_fetch::stats::{DEFAULT_MAX_ERROR_RATE, DEFAULT_MIN_WORKERS};
use lightcurve_fetch::{AdvisoryPolicy, RunConfig};
use serde::{Deserialize, Serialize};

pub const SUMMARY_FILE_NAME: &str = "kepler_lightkurve_summary.csv";

/// Top-level application configuration. Every field has a default, so an
/// empty file is valid.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Input table holding the identifiers.
    pub input: PathBuf,
    /// Column of the input table holding the identifiers.
    pub column: String,
    pub output_dir: PathBuf,
    /// Defaults to `kepler_lightkurve_summary.csv` inside `output_dir`.
    pub summary: Option<PathBuf>,
    pub workers: usize,
    pub checkpoint_every: usize,
    /// Seconds before one fetch is abandoned. `0` disables the limit.
    pub timeout_secs: u64,
    pub advisory: AdvisoryConfig,
    pub mast: MastConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub max_error_rate: f64,
    pub min_workers: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MastConfig {
    pub mission: String,
    pub api_base_url: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("koi_data.csv"),
            column: "kepid".into(),
            output_dir: PathBuf::from("lightkurve_data"),
            summary: None,
            workers: DEFAULT_WORKERS,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            advisory: AdvisoryConfig::default(),
            mast: MastConfig::default(),
        }
    }
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            max_error_rate: DEFAULT_MAX_ERROR_RATE,
            min_workers: DEFAULT_MIN_WORKERS,
        }
    }
}

impl Default for MastConfig {
    fn default() -> Self {
        Self {
            mission: lightcurve_fetch_mast::archive::DEFAULT_MISSION.into(),
            api_base_url: None,
            request_timeout_secs: None,
        }
    }
}

impl AppConfig {
    pub fn summary_path(&self) -> PathBuf {
        self.summary
            .clone()
            .unwrap_or_else(|| self.output_dir.join(SUMMARY_FILE_NAME))
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            workers: self.workers.max(1),
            checkpoint_every: self.checkpoint_every.max(1),
            fetch_timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            advisory: AdvisoryPolicy {
                max_error_rate: self.advisory.max_error_rate,
                min_workers: self.advisory.min_workers,
            },
        }
    }

    pub fn mast_config(&self) -> lightcurve_fetch_mast::MastArchiveConfig {
        lightcurve_fetch_mast::MastArchiveConfig {
            mission: self.mast.mission.clone(),
            api_base_url: self.mast.api_base_url.clone(),
            request_timeout: self.mast.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Config file path: `~/.config/lightcurve-fetch/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lightcurve-fetch").join("config.toml"))
}

/// Load config from file, falling back to defaults if missing or invalid.
pub fn load_config() -> AppConfig {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => return config,
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config, using defaults"
            ),
        }
    }

    AppConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.column, "kepid");
        assert_eq!(config.workers, 20);
        assert_eq!(config.checkpoint_every, 50);
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn summary_defaults_into_output_dir() {
        let config = AppConfig {
            output_dir: PathBuf::from("out"),
            ..Default::default()
        };
        assert_eq!(
            config.summary_path(),
            PathBuf::from("out").join("kepler_lightkurve_summary.csv")
        );
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
input = "targets.csv"
column = "kic"
output_dir = "curves"
summary = "curves/summary.csv"
workers = 8
checkpoint_every = 10
timeout_secs = 60

[advisory]
max_error_rate = 0.3

[mast]
mission = "K2"
api_base_url = "http://localhost:9000"
request_timeout_secs = 30
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.input, PathBuf::from("targets.csv"));
        assert_eq!(config.column, "kic");
        assert_eq!(config.summary_path(), PathBuf::from("curves/summary.csv"));

        let run = config.run_config();
        assert_eq!(run.workers, 8);
        assert_eq!(run.checkpoint_every, 10);
        assert_eq!(run.fetch_timeout, Some(Duration::from_secs(60)));
        assert_eq!(run.advisory.max_error_rate, 0.3);
        assert_eq!(run.advisory.min_workers, 5);

        let mast = config.mast_config();
        assert_eq!(mast.mission, "K2");
        assert_eq!(mast.api_base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(mast.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn zero_timeout_disables_the_limit() {
        let config: AppConfig = toml::from_str("timeout_secs = 0").unwrap();
        assert_eq!(config.run_config().fetch_timeout, None);
    }

    #[test]
    fn zero_workers_is_clamped() {
        let config: AppConfig = toml::from_str("workers = 0\ncheckpoint_every = 0").unwrap();
        let run = config.run_config();
        assert_eq!(run.workers, 1);
        assert_eq!(run.checkpoint_every, 1);
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        assert!(toml::from_str::<AppConfig>("workers = \"many\"").is_err());
    }
}
