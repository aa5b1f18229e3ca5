use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookfinder_backend::config::Config;
use bookfinder_backend::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Book Finder Backend");
    tracing::info!("Upstream catalog: {}", config.upstream_url);
    tracing::info!("Wishlist directory: {:?}", config.wishlist_dir);
    tracing::info!("Response cache TTL: {:?}", config.cache_ttl);

    let bind_addr = config.bind_addr;
    let state = AppState::from_config(config)?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
