//! Book search endpoint.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::catalog::SearchPage;
use crate::errors::{messages, AppError};
use crate::AppState;

/// Raw query parameters. Numbers are parsed by hand so that malformed values
/// still produce the JSON failure envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooksQuery {
    pub q: Option<String>,
    pub start_index: Option<String>,
    pub max_results: Option<String>,
}

/// GET /api/books - Search the upstream catalog.
pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<BooksQuery>,
) -> ApiResult<SearchPage> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::InvalidQuery(messages::QUERY_REQUIRED.to_string()))?;

    let start_index = parse_param(params.start_index.as_deref(), "startIndex")?.unwrap_or(0);
    let max_results = parse_param(params.max_results.as_deref(), "maxResults")?
        .unwrap_or(state.config.default_page_size);

    success(state.catalog.search(query, start_index, max_results).await?)
}

fn parse_param(raw: Option<&str>, name: &str) -> Result<Option<u32>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            AppError::InvalidQuery(format!("{} must be a non-negative integer", name))
        }),
    }
}
