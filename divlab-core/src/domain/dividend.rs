use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One dividend distribution as reported by the remote service.
///
/// Field values are kept as the text the service sent so the CSV output
/// reproduces them exactly: strings verbatim, numbers in their JSON form,
/// `null` as an empty cell. Every field must be present in the response
/// element; unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DividendRecord {
    #[serde(deserialize_with = "cell")]
    pub div_date: String,
    #[serde(deserialize_with = "cell")]
    pub div_amount: String,
    #[serde(deserialize_with = "cell")]
    pub div_payment_type: String,
    #[serde(deserialize_with = "cell")]
    pub pay_date: String,
    #[serde(rename = "yield", deserialize_with = "cell")]
    pub yield_pct: String,
    /// Source ticker, stamped by the batch driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
}

impl DividendRecord {
    /// Attach the source ticker to this record.
    pub fn with_ticker(mut self, ticker: &str) -> Self {
        self.ticker = Some(ticker.to_string());
        self
    }
}

/// Render any JSON scalar as a CSV cell.
fn cell<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
