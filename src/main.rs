use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use edutube_api::{
    api::{create_router, AppState},
    config::Config,
    services::providers::YouTubeProvider,
    storage::{create_redis_client, Storage},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("edutube_api=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let redis_client = create_redis_client(&config.storage_url)?;
    let (storage, writer_handle) = Storage::new(redis_client);

    let provider = Arc::new(YouTubeProvider::new(config.youtube_api_url.clone()));
    let state = AppState::load(storage, provider).await;

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    // Flush pending snapshots before exit
    writer_handle.shutdown().await;

    Ok(())
}
