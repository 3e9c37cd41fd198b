//! Domain types: assets and the dividend records fetched for them.

pub mod asset;
pub mod dividend;

pub use asset::AssetRef;
pub use dividend::DividendRecord;
