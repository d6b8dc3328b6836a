//! Reviewdash server binary.
//!
//! # Endpoints
//!
//! - `GET /` - The dashboard page
//! - `GET /api/countries` - Country catalog
//! - `POST /api/sessions` - Start a session
//! - `POST /api/sessions/:id/fetch` - Fetch reviews for selected countries
//! - `GET /api/sessions/:id/...` - Dashboard views and CSV export
//! - `GET /health` - Health check

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use reviewdash::api::{AppState, router};
use reviewdash::config::Config;
use reviewdash::data_sources::PlayStoreClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("reviewdash=info".parse()?))
        .init();

    let config = Config::from_env()?;

    info!(
        port = config.port,
        app_id = %config.app_id,
        cache_ttl_secs = config.cache_ttl_secs,
        max_reviews_per_country = ?config.max_reviews_per_country,
        "Starting reviewdash"
    );

    let source = PlayStoreClient::new(&config.app_id)
        .with_max_reviews(config.max_reviews_per_country)
        .with_page_delay(config.page_delay_ms.clone());

    let state = AppState::new(&config, Arc::new(source));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Dashboard is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
