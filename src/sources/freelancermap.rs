use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::json;

use crate::error::AppError;
use crate::models::fetch_config::FetchConfiguration;
use crate::models::listing::{Listing, SearchResponse};
use crate::sources::ListingSource;

/// Characters that encodeURIComponent does NOT encode.
/// RFC 3986 unreserved: A-Z a-z 0-9 - _ . ! ~ * ' ( )
const ENCODE_URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const BASE_URL: &str = "https://www.freelancermap.at";
const SEARCH_PATH: &str = "/project/search/ajax";

/// Filters the search form reports as touched. The endpoint ignores
/// query parameters for filters not listed here.
const CHANGED_FILTERS: [&str; 8] = [
    "query",
    "city",
    "radius",
    "states",
    "location",
    "countries",
    "continents",
    "sort",
];

pub struct FreelancerMap {
    client: reqwest::Client,
    base_url: String,
}

impl FreelancerMap {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        Self::with_base_url(BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36")
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, config: &FetchConfiguration) -> String {
        format!(
            "{}{SEARCH_PATH}?{}",
            self.base_url,
            encode_query(&config.search_params())
        )
    }
}

#[async_trait]
impl ListingSource for FreelancerMap {
    fn name(&self) -> &str {
        "freelancermap"
    }

    async fn fetch(&self, config: &FetchConfiguration) -> Result<Vec<Listing>, AppError> {
        let url = self.search_url(config);
        tracing::debug!("Fetcher '{}': fetching {url}", config.name);

        let resp = self
            .client
            .post(&url)
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9,de-DE;q=0.8,de;q=0.7")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Origin", BASE_URL)
            .header("Referer", format!("{BASE_URL}/projektboerse.html"))
            .json(&json!({ "changed": CHANGED_FILTERS }))
            .send()
            .await?;

        let status = resp.status();
        tracing::debug!("Fetcher '{}': response status {status}", config.name);
        if !status.is_success() {
            return Err(AppError::Fetch(format!("freelancermap returned {status}")));
        }

        let body = resp.text().await?;
        let listings = parse_results(&body)?;
        if listings.is_none() {
            tracing::warn!(
                "Fetcher '{}': response has no 'projects' array, treating as empty",
                config.name
            );
        }
        Ok(listings.unwrap_or_default())
    }
}

/// Serialize query parameters the way URLSearchParams would, with
/// encodeURIComponent escaping.
fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, ENCODE_URI_COMPONENT_SET),
                utf8_percent_encode(value, ENCODE_URI_COMPONENT_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse a search response body. `None` when the body has no `projects` array.
fn parse_results(body: &str) -> Result<Option<Vec<Listing>>, AppError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.projects)
}
