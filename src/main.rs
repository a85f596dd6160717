//! tabstore command-line shell
//!
//! ```bash
//! # Interactive shell over ./data
//! tabstore --data-dir ./data
//!
//! # Run one command and exit
//! tabstore -c "select from users where age = 30"
//! ```

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::Parser;
use tabstore::{Config, IdentifierPolicy};
use tracing_subscriber::EnvFilter;

use crate::cli::repl::{Flow, Repl};

/// File-persisted tabular data store
#[derive(Parser, Debug)]
#[command(name = "tabstore", version, about)]
struct Args {
    /// Directory holding the metadata file and table files
    #[arg(short = 'd', long, default_value = ".", env = "TABSTORE_DATA_DIR")]
    data_dir: PathBuf,

    /// Metadata file name inside the data directory
    #[arg(long, default_value = tabstore::storage::DEFAULT_METADATA_FILE)]
    metadata_file: String,

    /// Bound the query cache to this many entries (unbounded by default)
    #[arg(long, env = "TABSTORE_CACHE_CAPACITY")]
    cache_capacity: Option<usize>,

    /// Column name normalization: legacy or strict
    #[arg(long, default_value = "legacy")]
    id_policy: IdentifierPolicy,

    /// Do not ask before deleting rows
    #[arg(short = 'y', long)]
    yes: bool,

    /// Do not print command timings
    #[arg(long)]
    no_timing: bool,

    /// Execute a single command and exit
    #[arg(short = 'c', long)]
    command: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = Config::new(&self.data_dir)
            .metadata_file(&self.metadata_file)
            .id_policy(self.id_policy)
            .confirm_deletes(!self.yes)
            .show_timing(!self.no_timing);
        if let Some(capacity) = self.cache_capacity {
            config = config.cache_capacity(capacity);
        }
        config.validate().map_err(|e| anyhow!(e))?;
        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TABSTORE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let mut args = Args::parse();
    let command = args.command.take();
    let mut repl = Repl::new(args.into_config()?)?;

    if let Some(line) = command {
        let code = match repl.execute_line(&line) {
            Flow::Failed => ExitCode::FAILURE,
            Flow::Continue | Flow::Exit => ExitCode::SUCCESS,
        };
        return Ok(code);
    }

    repl.print_banner();
    repl.run()?;
    Ok(ExitCode::SUCCESS)
}
