//! Investing.com dividend provider.
//!
//! Posts the `HistoricalDividends` GraphQL query to the gql endpoint and
//! extracts the first page of results. One request per asset, no retries.
//!
//! The endpoint is not a published API. It rejects requests that do not
//! look like they come from the investing.com web app, so the client sends
//! a fixed browser header set.

use super::provider::{DataError, DividendProvider};
use super::query::{build_request, extract_dividends, DividendPage, GraphQlRequest};
use crate::config::ClientConfig;
use crate::domain::DividendRecord;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, DNT, ORIGIN, REFERER,
    TE,
};
use serde_json::Value;
use tracing::debug;

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:137.0) Gecko/20100101 Firefox/137.0";

/// Browser headers sent with every request. Accept-Encoding is left to the
/// client, which advertises and decodes gzip, deflate, brotli and zstd.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/graphql-response+json, application/json"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.investing.com/"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://www.investing.com"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-site"),
    );
    headers.insert(HeaderName::from_static("sec-gpc"), HeaderValue::from_static("1"));
    headers.insert(HeaderName::from_static("priority"), HeaderValue::from_static("u=4"));
    headers.insert(TE, HeaderValue::from_static("trailers"));
    headers
}

/// Investing.com GraphQL dividend provider.
pub struct InvestingProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl InvestingProvider {
    pub fn new(config: &ClientConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .default_headers(browser_headers())
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Send one request and return the decoded JSON body.
    pub fn post(&self, request: &GraphQlRequest) -> Result<Value, DataError> {
        debug!(
            endpoint = %self.endpoint,
            asset_id = %request.variables.investing_asset_id,
            "posting {}",
            request.operation_name
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| DataError::Transport(e.to_string()))?;

        let status = resp.status();
        debug!(status = status.as_u16(), "dividend endpoint responded");
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
            });
        }

        resp.json::<Value>().map_err(|e| {
            if e.is_decode() {
                DataError::MalformedResponse(format!("body is not JSON: {e}"))
            } else {
                DataError::Transport(e.to_string())
            }
        })
    }

    /// Fetch and extract the first page of dividends for an asset.
    pub fn fetch_page(&self, asset_id: &str) -> Result<DividendPage, DataError> {
        if asset_id.trim().is_empty() {
            return Err(DataError::EmptyAssetId);
        }

        let body = self.post(&build_request(asset_id))?;
        let page = extract_dividends(&body)?;

        if let Some(cursor) = &page.cursor {
            debug!(asset_id, cursor = %cursor, "further dividend pages available, not followed");
        }
        debug!(asset_id, count = page.records.len(), "extracted dividends");
        Ok(page)
    }
}

impl DividendProvider for InvestingProvider {
    fn name(&self) -> &str {
        "investing_graphql"
    }

    fn fetch_dividends(&self, asset_id: &str) -> Result<Vec<DividendRecord>, DataError> {
        Ok(self.fetch_page(asset_id)?.records)
    }
}
