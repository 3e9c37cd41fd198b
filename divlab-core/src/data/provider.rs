//! Data provider trait, batch progress reporting and structured error types.
//!
//! The DividendProvider trait abstracts over the remote service so the batch
//! driver can be exercised against scripted providers in tests.

use crate::batch::RowError;
use crate::domain::DividendRecord;
use thiserror::Error;

/// Structured error types for fetching one asset's dividends.
///
/// Every variant is contained per row by the batch driver; single-asset
/// mode lets them reach the process boundary.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from dividend endpoint")]
    Http { status: u16 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("asset id is empty")]
    EmptyAssetId,

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Trait for dividend sources.
pub trait DividendProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the first page of dividend records for an asset id, in the
    /// order the source returns them.
    fn fetch_dividends(&self, asset_id: &str) -> Result<Vec<DividendRecord>, DataError>;
}

/// Progress callback for batch runs.
pub trait BatchProgress {
    /// Called before fetching an asset.
    fn on_start(&self, ticker: &str, asset_id: &str, index: usize, total: usize);

    /// Called after an asset's file has been written.
    fn on_saved(&self, ticker: &str, count: usize, path: &std::path::Path);

    /// Called when fetching or writing an asset failed. The batch continues.
    fn on_failed(&self, ticker: &str, asset_id: &str, error: &RowError);

    /// Called after the combined file has been written.
    fn on_combined(&self, path: &std::path::Path, total_records: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl BatchProgress for StdoutProgress {
    fn on_start(&self, ticker: &str, asset_id: &str, _index: usize, _total: usize) {
        println!("Fetching dividends for {ticker} (ID: {asset_id})...");
    }

    fn on_saved(&self, _ticker: &str, count: usize, path: &std::path::Path) {
        println!("Saved {count} dividends to {}", path.display());
    }

    fn on_failed(&self, ticker: &str, asset_id: &str, error: &RowError) {
        println!("Error processing {ticker} (ID: {asset_id}): {error}");
    }

    fn on_combined(&self, path: &std::path::Path, total_records: usize) {
        println!("\nCombined data saved to {}", path.display());
        println!("Total dividends fetched: {total_records}");
    }
}
