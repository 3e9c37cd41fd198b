//! divlab core — historical dividend retrieval and CSV export.
//!
//! This crate contains the whole pipeline:
//! - Domain types (assets, dividend records)
//! - GraphQL request construction and response extraction
//! - Blocking HTTP provider for the Investing.com endpoint
//! - CSV export with plain and ticker-tagged layouts
//! - Batch driver with per-row error containment
//! - TOML client configuration

pub mod batch;
pub mod config;
pub mod data;
pub mod domain;
pub mod export;

pub use batch::{run_batch, BatchError, BatchOptions, BatchSummary, RowError};
pub use config::{ClientConfig, Config, ConfigError};
pub use data::{DataError, DividendProvider, InvestingProvider, StdoutProgress};
pub use export::{write_dividends_csv, ExportError, Layout};
