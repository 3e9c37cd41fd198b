use serde::{Deserialize, Serialize};

/// An asset to fetch dividends for.
///
/// `id` is the opaque identifier in the remote namespace. `ticker` is the
/// display name used for file names and the `ticker` column; it falls back
/// to the id when the input carries none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetRef {
    pub id: String,
    pub ticker: String,
}

impl AssetRef {
    /// Build an asset reference, using the id as ticker when `ticker` is
    /// absent or blank.
    pub fn new(id: impl Into<String>, ticker: Option<&str>) -> Self {
        let id = id.into();
        let ticker = match ticker {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => id.clone(),
        };
        Self { id, ticker }
    }

    /// File name of the per-asset CSV.
    pub fn output_file_name(&self) -> String {
        format!("{}_dividends.csv", self.ticker)
    }
}
