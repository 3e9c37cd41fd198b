//! Dividend data retrieval

pub mod investing;
pub mod provider;
pub mod query;

pub use investing::InvestingProvider;
pub use provider::{BatchProgress, DataError, DividendProvider, StdoutProgress};
pub use query::{build_request, extract_dividends, DividendPage, GraphQlRequest};
