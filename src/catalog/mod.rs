//! Upstream catalog proxy.
//!
//! Forwards searches to the catalog API, normalizes the nested response into
//! flat [`BookRecord`]s and computes pagination state.

mod cache;

pub use cache::ResponseCache;

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{header, Client, Url};
use serde::{Deserialize, Serialize};

use crate::errors::{messages, AppError};
use crate::models::{BookRecord, VolumeItem, VolumesResponse};

/// Largest page the upstream catalog will serve.
pub const MAX_PAGE_SIZE: u32 = 40;

const USER_AGENT: &str = "BookSearchApp/1.0";

/// One normalized page of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub books: Vec<BookRecord>,
    pub total_items: u64,
    pub query: String,
    pub start_index: u32,
    pub max_results: u32,
    pub has_more: bool,
    /// Upstream offset of the page after this one.
    pub next_start_index: u32,
}

/// Client for the upstream catalog search endpoint.
pub struct CatalogClient {
    http: Client,
    base_url: String,
    cache: ResponseCache,
}

impl CatalogClient {
    pub fn new(base_url: &str, timeout: Duration, cache_ttl: Duration) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: ResponseCache::new(cache_ttl),
        })
    }

    /// Search the catalog.
    ///
    /// A blank query is rejected before any request is made. Titleless items
    /// are dropped and repeated ids keep their first occurrence.
    pub async fn search(
        &self,
        query: &str,
        start_index: u32,
        max_results: u32,
    ) -> Result<SearchPage, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidQuery(messages::QUERY_REQUIRED.to_string()));
        }
        if max_results == 0 || max_results > MAX_PAGE_SIZE {
            return Err(AppError::InvalidQuery(format!(
                "maxResults must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let url = self.volumes_url(query, start_index, max_results)?;
        if let Some(page) = self.cache.get(url.as_str()).await {
            tracing::debug!("Cache hit for {}", url);
            return Ok(page);
        }

        tracing::info!(
            "Searching catalog for {:?} (startIndex={}, maxResults={})",
            query,
            start_index,
            max_results
        );

        let response = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Catalog API error: {} for query {:?}", status, query);
            return Err(AppError::Upstream {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let volumes: VolumesResponse = serde_json::from_slice(&body)?;
        let page = normalize(volumes, query, start_index, max_results);

        self.cache.insert(url.to_string(), page.clone()).await;
        Ok(page)
    }

    fn volumes_url(&self, query: &str, start_index: u32, max_results: u32) -> Result<Url, AppError> {
        let mut url = Url::parse(&format!("{}/volumes", self.base_url))
            .map_err(|e| AppError::Unknown(format!("Invalid catalog URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("startIndex", &start_index.to_string())
            .append_pair("maxResults", &max_results.to_string())
            .append_pair("printType", "books")
            .append_pair("orderBy", "relevance");
        Ok(url)
    }
}

/// Turn a raw catalog response into a [`SearchPage`].
///
/// `hasMore` requires both a full page of returned books (counted after
/// filtering) and a reported total beyond this page; a short page always ends
/// pagination. `nextStartIndex` advances by the raw upstream item count so
/// that filtered items are not requested again.
pub fn normalize(
    response: VolumesResponse,
    query: &str,
    start_index: u32,
    max_results: u32,
) -> SearchPage {
    let items = response.items.unwrap_or_default();
    let received = items.len() as u32;
    let total_items = response.total_items.unwrap_or(0);

    let mut seen = HashSet::new();
    let books: Vec<BookRecord> = items
        .into_iter()
        .filter_map(VolumeItem::from_value)
        .filter_map(BookRecord::from_volume)
        .filter(|book| seen.insert(book.id.clone()))
        .collect();

    let has_more = books.len() as u32 == max_results
        && total_items > u64::from(start_index) + u64::from(max_results);

    SearchPage {
        books,
        total_items,
        query: query.to_string(),
        start_index,
        max_results,
        has_more,
        next_start_index: start_index.saturating_add(received),
    }
}
