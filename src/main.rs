use std::sync::Arc;

use istanbul_guide_api::{
    config::{Config, StoreBackend},
    create_router,
    db::{self, InMemoryVenueStore, PgVenueStore, VenueStore},
    services::images::UnsplashProvider,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "istanbul_guide_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn VenueStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database_url).await?;
            tracing::info!("Connected to PostgreSQL, migrations applied");
            Arc::new(PgVenueStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory venue store; data will not survive a restart");
            Arc::new(InMemoryVenueStore::new())
        }
    };

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = db::Cache::connect(redis_client).await?;
    tracing::info!("Connected to Redis");

    let images = Arc::new(UnsplashProvider::new(
        cache,
        config.unsplash_access_key.clone(),
        config.unsplash_api_url.clone(),
    ));

    let state = Arc::new(AppState::new(store, images, &config));
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
