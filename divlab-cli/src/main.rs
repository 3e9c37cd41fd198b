//! divlab CLI — fetch historical dividends and export them as CSV.
//!
//! Commands:
//! - `fetch` — one asset id to one CSV file; any failure exits non-zero
//! - `batch` — a table of assets to per-asset CSVs plus an optional combined
//!   file; failed assets are reported and skipped, exit code stays 0

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use divlab_core::batch::{run_batch, BatchOptions};
use divlab_core::config::Config;
use divlab_core::data::{DividendProvider, InvestingProvider, StdoutProgress};
use divlab_core::export::{write_dividends_csv, Layout};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "divlab",
    about = "Fetch historical dividends from Investing.com and save them as CSV"
)]
struct Cli {
    /// TOML config file with a [client] table (endpoint, timeout_secs).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch dividends for a single asset and save them as a CSV.
    Fetch {
        /// The asset ID to fetch dividend data for.
        asset_id: String,

        /// The CSV file to save dividend data to.
        output_file: PathBuf,
    },
    /// Fetch dividends for every asset listed in a CSV file.
    Batch {
        /// CSV file containing asset IDs and tickers (columns: id,ticker).
        input_file: PathBuf,

        /// Directory to save dividend CSV files (created if missing).
        output_dir: PathBuf,

        /// File name for a combined output inside the output directory.
        #[arg(long)]
        combined: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let provider = InvestingProvider::new(&config.client)?;

    match cli.command {
        Commands::Fetch {
            asset_id,
            output_file,
        } => run_fetch(&provider, &asset_id, &output_file),
        Commands::Batch {
            input_file,
            output_dir,
            combined,
        } => run_batch_cmd(&provider, input_file, output_dir, combined),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => {
            Config::from_file(p).with_context(|| format!("loading config {}", p.display()))
        }
        None => Ok(Config::default()),
    }
}

fn run_fetch(provider: &dyn DividendProvider, asset_id: &str, output_file: &Path) -> Result<()> {
    // Fetch fully before touching the output file so a failed request leaves no file.
    let dividends = provider
        .fetch_dividends(asset_id)
        .with_context(|| format!("fetching dividends for asset {asset_id}"))?;

    write_dividends_csv(&dividends, output_file, Layout::Plain)?;
    println!("Data saved to {}", output_file.display());
    Ok(())
}

fn run_batch_cmd(
    provider: &dyn DividendProvider,
    input_file: PathBuf,
    output_dir: PathBuf,
    combined: Option<String>,
) -> Result<()> {
    let options = BatchOptions {
        input_file,
        output_dir,
        combined,
    };

    run_batch(provider, &options, &StdoutProgress)?;
    Ok(())
}
