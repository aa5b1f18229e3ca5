//! Book Finder Backend
//!
//! Proxies searches to an upstream book catalog, normalizes the results and
//! keeps a persisted wishlist of saved books.

pub mod api;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod format;
pub mod models;
pub mod session;
pub mod wishlist;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use catalog::CatalogClient;
use config::Config;
use errors::AppError;
use wishlist::{FileStore, KeyValueStore, WishlistStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogClient>,
    pub wishlist: Arc<WishlistStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state with a file-backed wishlist under `config.wishlist_dir`.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.wishlist_dir));
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: Config, storage: Arc<dyn KeyValueStore>) -> Result<Self, AppError> {
        let catalog =
            CatalogClient::new(&config.upstream_url, config.upstream_timeout, config.cache_ttl)?;

        Ok(Self {
            catalog: Arc::new(catalog),
            wishlist: Arc::new(WishlistStore::new(storage)),
            config: Arc::new(config),
        })
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Search
        .route("/books", get(api::search_books))
        // Wishlist
        .route("/wishlist", get(api::list_wishlist))
        .route("/wishlist", post(api::add_to_wishlist))
        .route("/wishlist/ids", get(api::wishlist_ids))
        .route(
            "/wishlist/{id}",
            get(api::wishlist_membership).delete(api::remove_from_wishlist),
        );

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
