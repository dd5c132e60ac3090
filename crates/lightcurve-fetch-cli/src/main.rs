mod commands;
mod config;
mod logging;
mod progress;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use lightcurve_fetch::Archive;
use lightcurve_fetch_mast::MastArchive;

use crate::commands::ColumnPrompt;
use crate::config::AppConfig;
use crate::progress::ProgressObserver;

#[derive(Parser)]
#[command(name = "lightcurve-fetch")]
#[command(about = "Bulk-download Kepler light curves from MAST, resuming where the last run stopped")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every identifier not yet in the summary or on disk
    Fetch {
        #[command(flatten)]
        paths: PathArgs,
        /// Maximum fetches in flight at once
        #[arg(long)]
        workers: Option<usize>,
        /// Save the summary after every N results
        #[arg(long)]
        checkpoint_every: Option<usize>,
        /// Give up on a single fetch after this many seconds (0 = never)
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Only dispatch the first N pending identifiers
        #[arg(long)]
        limit: Option<usize>,
        /// MAST API base URL
        #[arg(long)]
        api_base_url: Option<String>,
        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
    /// Print the report for an existing summary
    Status {
        /// Summary CSV (defaults to the one inside the output directory)
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Worker count to evaluate the error-rate advisory against
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Show which identifiers are still pending
    Pending {
        #[command(flatten)]
        paths: PathArgs,
        /// Print every pending identifier
        #[arg(long)]
        list: bool,
    },
}

/// Input and output locations shared by `fetch` and `pending`.
#[derive(Args)]
struct PathArgs {
    /// Input CSV holding the identifiers
    #[arg(long)]
    input: Option<PathBuf>,
    /// Column of the input CSV holding the identifiers
    #[arg(long)]
    column: Option<String>,
    /// Directory for light-curve files
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Summary CSV (defaults to the one inside the output directory)
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl PathArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(column) = self.column {
            config.column = column;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if self.summary.is_some() {
            config.summary = self.summary;
        }
    }
}

/// Ask on the terminal for a missing column; fail when stdin is piped.
fn with_prompt<T>(f: impl FnOnce(Option<ColumnPrompt<'_>>) -> T) -> T {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return f(None);
    }
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    f(Some(ColumnPrompt {
        input: &mut input,
        output: &mut output,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let mut config = config::load_config();
    let mut stdout = std::io::stdout();

    match cli.command {
        Command::Fetch {
            paths,
            workers,
            checkpoint_every,
            timeout_secs,
            limit,
            api_base_url,
            no_progress,
        } => {
            paths.apply(&mut config);
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(every) = checkpoint_every {
                config.checkpoint_every = every;
            }
            if let Some(secs) = timeout_secs {
                config.timeout_secs = secs;
            }
            if api_base_url.is_some() {
                config.mast.api_base_url = api_base_url;
            }

            let ids = with_prompt(|prompt| {
                commands::read_identifiers(&config.input, &config.column, prompt)
            })?;

            let archive: Arc<dyn Archive> = Arc::new(MastArchive::new(config.mast_config()));
            let observer = ProgressObserver::new(!no_progress);

            commands::fetch::run(archive, &config, ids, limit, &observer, &mut stdout).await?;
            Ok(())
        }
        Command::Status {
            summary,
            output_dir,
            workers,
        } => {
            if let Some(output_dir) = output_dir {
                config.output_dir = output_dir;
            }
            if summary.is_some() {
                config.summary = summary;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            commands::status::run(&config, &mut stdout)?;
            Ok(())
        }
        Command::Pending { paths, list } => {
            paths.apply(&mut config);
            let ids = with_prompt(|prompt| {
                commands::read_identifiers(&config.input, &config.column, prompt)
            })?;
            commands::pending::run(&config, ids, list, &mut stdout)?;
            Ok(())
        }
    }
}
