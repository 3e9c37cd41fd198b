//! GraphQL payload for the `HistoricalDividends` operation and extraction
//! of dividend records from its response.
//!
//! Only the first page is requested. The response cursor is surfaced in
//! [`DividendPage`] but never followed.

use super::provider::DataError;
use crate::domain::DividendRecord;
use serde::Serialize;
use serde_json::Value;

pub const OPERATION_NAME: &str = "HistoricalDividends";

/// Remote id scheme for `investingAssetId`.
pub const ID_TYPE: &str = "INVESTING";

/// Page size of the single request made per asset.
pub const PAGE_LIMIT: u32 = 50;

const QUERY: &str = "query HistoricalDividends($investingAssetId:ID!,$idType:AssetIDType,$cursor:String,$limit:Int){\
investingAsset(id:$investingAssetId,idType:$idType){\
dividends{\
dividends(cursor:$cursor,limit:$limit){\
cursor \
data{div_date div_amount div_payment_type pay_date yield}\
}\
}\
}\
}";

/// Keys from the response root down to the dividend array.
const DATA_PATH: [&str; 5] = ["data", "investingAsset", "dividends", "dividends", "data"];

/// JSON body of the POST request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: &'static str,
    pub variables: Variables,
    pub operation_name: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variables {
    pub investing_asset_id: String,
    pub id_type: &'static str,
    pub limit: u32,
}

/// Build the request for the first page of an asset's dividend history.
pub fn build_request(asset_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        query: QUERY,
        variables: Variables {
            investing_asset_id: asset_id.to_string(),
            id_type: ID_TYPE,
            limit: PAGE_LIMIT,
        },
        operation_name: OPERATION_NAME,
    }
}

/// One page of dividend records.
#[derive(Debug, Clone, PartialEq)]
pub struct DividendPage {
    pub records: Vec<DividendRecord>,
    /// Cursor for the next page, if the service reported one.
    pub cursor: Option<String>,
}

/// Walk `data.investingAsset.dividends.dividends.data` and parse each
/// element into a [`DividendRecord`].
///
/// Any missing or null segment is an error rather than an empty list, and
/// a single bad element fails the whole page.
pub fn extract_dividends(body: &Value) -> Result<DividendPage, DataError> {
    let mut node = body;
    let mut walked: Vec<&str> = Vec::with_capacity(DATA_PATH.len());
    let mut page: Option<&Value> = None;

    for key in DATA_PATH {
        walked.push(key);
        page = Some(node);
        node = match node.get(key) {
            Some(v) if !v.is_null() => v,
            _ => return Err(missing_segment(body, &walked)),
        };
    }

    let items = node.as_array().ok_or_else(|| {
        DataError::MalformedResponse(format!("`{}` is not an array", walked.join(".")))
    })?;

    let records = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<DividendRecord>(item.clone()).map_err(|e| {
                DataError::MalformedResponse(format!("dividend #{i}: {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let cursor = match page.and_then(|p| p.get("cursor")) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(DividendPage { records, cursor })
}

fn missing_segment(body: &Value, walked: &[&str]) -> DataError {
    let path = walked.join(".");
    let graphql_error = body
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errs| errs.first())
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str);

    match graphql_error {
        Some(msg) => DataError::MalformedResponse(format!("missing `{path}` (server said: {msg})")),
        None => DataError::MalformedResponse(format!("missing `{path}`")),
    }
}
