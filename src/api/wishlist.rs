//! Wishlist API endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{BookRecord, MembershipInfo, WishlistEntry};
use crate::wishlist::WishlistStore;
use crate::AppState;

/// Run a wishlist operation off the async runtime; the store does blocking I/O.
async fn with_wishlist<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&WishlistStore) -> T + Send + 'static,
{
    let wishlist = Arc::clone(&state.wishlist);
    tokio::task::spawn_blocking(move || op(&wishlist))
        .await
        .map_err(|e| {
            tracing::error!("Wishlist task failed: {}", e);
            AppError::Unknown(format!("Wishlist task failed: {}", e))
        })
}

/// GET /api/wishlist - List saved books, newest first.
pub async fn list_wishlist(State(state): State<AppState>) -> ApiResult<Vec<WishlistEntry>> {
    success(with_wishlist(&state, |w| w.list()).await?)
}

/// GET /api/wishlist/ids - Saved ids, newest first.
pub async fn wishlist_ids(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    success(with_wishlist(&state, |w| w.ids()).await?)
}

/// GET /api/wishlist/:id - Check whether a book is saved.
pub async fn wishlist_membership(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MembershipInfo> {
    let lookup = id.clone();
    let in_wishlist = with_wishlist(&state, move |w| w.contains(&lookup)).await?;
    success(MembershipInfo { id, in_wishlist })
}

/// POST /api/wishlist - Save a book (upsert by id).
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    body: Result<Json<BookRecord>, JsonRejection>,
) -> ApiResult<Vec<WishlistEntry>> {
    let Json(book) = body?;
    if book.id.trim().is_empty() {
        return Err(AppError::BadRequest("Book id is required".to_string()));
    }
    if book.title.trim().is_empty() {
        return Err(AppError::BadRequest("Book title is required".to_string()));
    }

    let entries = with_wishlist(&state, move |w| {
        w.add(&book);
        w.list()
    })
    .await?;
    success(entries)
}

/// DELETE /api/wishlist/:id - Remove a saved book.
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<WishlistEntry>> {
    let entries = with_wishlist(&state, move |w| {
        w.remove(&id);
        w.list()
    })
    .await?;
    success(entries)
}
