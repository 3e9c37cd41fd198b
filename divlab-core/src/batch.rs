//! Batch driver — fetches dividends for every asset in an input table.
//!
//! Rows are processed sequentially in input order. A row whose fetch or
//! per-asset file write fails is reported and skipped; it adds nothing to
//! the combined output. Structural failures (unreadable input, missing `id`
//! column, output directory, combined file) abort the whole run.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::data::provider::{BatchProgress, DataError, DividendProvider};
use crate::domain::{AssetRef, DividendRecord};
use crate::export::{write_dividends_csv, ExportError, Layout};

/// Errors that abort a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("input format: {0}")]
    InputFormat(String),

    #[error("export: {0}")]
    Export(#[from] ExportError),
}

/// Failure of a single row. Reported and skipped, never fatal.
#[derive(Debug, Error)]
pub enum RowError {
    #[error(transparent)]
    Fetch(#[from] DataError),

    #[error(transparent)]
    Write(#[from] ExportError),
}

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// CSV with an `id` column and an optional `ticker` column.
    pub input_file: PathBuf,
    /// Created with parents if missing.
    pub output_dir: PathBuf,
    /// File name for the combined CSV inside `output_dir`.
    pub combined: Option<String>,
}

/// Summary of a batch run.
#[derive(Debug)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// (ticker, error) for each failed row, in row order.
    pub errors: Vec<(String, RowError)>,
    pub records_fetched: usize,
    pub combined_path: Option<PathBuf>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Read the asset table.
///
/// The header must contain `id`; `ticker` is optional. Blank lines are
/// skipped and short rows are read with empty trailing cells.
pub fn read_assets(path: &Path) -> Result<Vec<AssetRef>, BatchError> {
    let file = std::fs::File::open(path).map_err(|source| BatchError::Io {
        context: format!("open input file {}", path.display()),
        source,
    })?;
    read_assets_from(file)
}

/// Read the asset table from any reader.
pub fn read_assets_from<R: std::io::Read>(reader: R) -> Result<Vec<AssetRef>, BatchError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| BatchError::InputFormat(format!("cannot read header: {e}")))?
        .clone();
    let id_col = headers
        .iter()
        .position(|h| h == "id")
        .ok_or_else(|| BatchError::InputFormat("missing required column `id`".into()))?;
    let ticker_col = headers.iter().position(|h| h == "ticker");

    let mut assets = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row.map_err(|e| BatchError::InputFormat(format!("row {}: {e}", i + 1)))?;
        let id = row.get(id_col).unwrap_or("");
        let ticker = ticker_col.and_then(|c| row.get(c));
        assets.push(AssetRef::new(id, ticker));
    }

    Ok(assets)
}

/// Fetch, stamp and write every asset in `assets`.
///
/// Writes `<output_dir>/<ticker>_dividends.csv` per successful asset and,
/// when `combined` is set, `<output_dir>/<combined>` with all records in
/// row order. The output directory must already exist.
pub fn process_assets(
    provider: &dyn DividendProvider,
    assets: &[AssetRef],
    output_dir: &Path,
    combined: Option<&str>,
    progress: &dyn BatchProgress,
) -> Result<BatchSummary, BatchError> {
    let total = assets.len();
    let mut succeeded = 0;
    let mut errors: Vec<(String, RowError)> = Vec::new();
    let mut all_dividends: Vec<DividendRecord> = Vec::new();

    for (i, asset) in assets.iter().enumerate() {
        progress.on_start(&asset.ticker, &asset.id, i, total);

        let path = output_dir.join(asset.output_file_name());
        let dividends = match fetch_and_write(provider, asset, &path) {
            Ok(dividends) => dividends,
            Err(e) => {
                debug!(ticker = %asset.ticker, asset_id = %asset.id, error = %e, "asset skipped");
                progress.on_failed(&asset.ticker, &asset.id, &e);
                errors.push((asset.ticker.clone(), e));
                continue;
            }
        };
        progress.on_saved(&asset.ticker, dividends.len(), &path);

        all_dividends.extend(dividends);
        succeeded += 1;
    }

    let combined_path = match combined {
        Some(name) => {
            let path = output_dir.join(name);
            write_dividends_csv(&all_dividends, &path, Layout::Tagged)?;
            progress.on_combined(&path, all_dividends.len());
            Some(path)
        }
        None => None,
    };

    debug!(total, succeeded, failed = errors.len(), "batch finished");

    Ok(BatchSummary {
        total,
        succeeded,
        failed: errors.len(),
        errors,
        records_fetched: all_dividends.len(),
        combined_path,
    })
}

/// Fetch one asset, stamp its ticker and write its per-asset file.
fn fetch_and_write(
    provider: &dyn DividendProvider,
    asset: &AssetRef,
    path: &Path,
) -> Result<Vec<DividendRecord>, RowError> {
    let dividends: Vec<DividendRecord> = provider
        .fetch_dividends(&asset.id)?
        .into_iter()
        .map(|r| r.with_ticker(&asset.ticker))
        .collect();
    write_dividends_csv(&dividends, path, Layout::Tagged)?;
    Ok(dividends)
}

/// Run a full batch: read the input table, prepare the output directory,
/// then process every row.
pub fn run_batch(
    provider: &dyn DividendProvider,
    options: &BatchOptions,
    progress: &dyn BatchProgress,
) -> Result<BatchSummary, BatchError> {
    let assets = read_assets(&options.input_file)?;

    std::fs::create_dir_all(&options.output_dir).map_err(|source| BatchError::Io {
        context: format!("create output directory {}", options.output_dir.display()),
        source,
    })?;

    debug!(
        provider = provider.name(),
        assets = assets.len(),
        output_dir = %options.output_dir.display(),
        "starting batch"
    );

    process_assets(
        provider,
        &assets,
        &options.output_dir,
        options.combined.as_deref(),
        progress,
    )
}
