//! CSV export of dividend records.
//!
//! Two fixed layouts:
//! - **Plain**: `div_date,div_amount,div_payment_type,pay_date,yield`
//! - **Tagged**: the same columns preceded by `ticker`
//!
//! Rows are written in input order. Every column in the header must be
//! supplied by every record; a record without a ticker cannot be written
//! in the tagged layout.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::domain::DividendRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("record #{index} has no `{field}` value")]
    MissingField { index: usize, field: &'static str },
}

/// Column layout of a dividend CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Single-asset output, no ticker column.
    Plain,
    /// Batch and combined output, ticker first.
    Tagged,
}

const DIVIDEND_COLUMNS: [&str; 5] = ["div_date", "div_amount", "div_payment_type", "pay_date", "yield"];

impl Layout {
    pub fn header(self) -> Vec<&'static str> {
        match self {
            Layout::Plain => DIVIDEND_COLUMNS.to_vec(),
            Layout::Tagged => std::iter::once("ticker").chain(DIVIDEND_COLUMNS).collect(),
        }
    }
}

fn check_fields(records: &[DividendRecord], layout: Layout) -> Result<(), ExportError> {
    if layout == Layout::Tagged {
        if let Some(index) = records.iter().position(|r| r.ticker.is_none()) {
            return Err(ExportError::MissingField {
                index,
                field: "ticker",
            });
        }
    }
    Ok(())
}

/// Write header and rows to any writer. Returns the number of rows written.
pub fn write_dividends<W: Write>(
    writer: W,
    records: &[DividendRecord],
    layout: Layout,
) -> Result<usize, ExportError> {
    check_fields(records, layout)?;

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(layout.header())?;

    for r in records {
        let cells = [
            r.div_date.as_str(),
            r.div_amount.as_str(),
            r.div_payment_type.as_str(),
            r.pay_date.as_str(),
            r.yield_pct.as_str(),
        ];
        match (layout, r.ticker.as_deref()) {
            (Layout::Tagged, Some(ticker)) => {
                wtr.write_record(std::iter::once(ticker).chain(cells))?
            }
            _ => wtr.write_record(cells)?,
        }
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(records.len())
}

/// Create or truncate `path` and write the records to it.
///
/// Fields are checked before the file is touched, so a rejected record set
/// leaves no file behind.
pub fn write_dividends_csv(
    records: &[DividendRecord],
    path: &Path,
    layout: Layout,
) -> Result<usize, ExportError> {
    check_fields(records, layout)?;
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_dividends(file, records, layout)
}

/// Render the records as a CSV string.
pub fn dividends_to_csv_string(
    records: &[DividendRecord],
    layout: Layout,
) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_dividends(&mut buf, records, layout)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
