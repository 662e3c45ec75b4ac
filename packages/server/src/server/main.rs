// Main entry point for the scoring pipeline server

use std::sync::Arc;

use anyhow::{Context, Result};
use gemini_client::GeminiClient;
use sdg_core::kernel::{
    BaseTokenProvider, FirestoreContentStore, GcsBlobStore, GeminiVisionModel,
    MetadataTokenProvider, ServerDeps, StaticTokenProvider,
};
use sdg_core::server::build_app;
use sdg_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sdg_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SDG scoring pipeline");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Token source: static for local development, metadata server on Cloud Run
    let token_provider: Arc<dyn BaseTokenProvider> = match &config.google_access_token {
        Some(token) => Arc::new(StaticTokenProvider::new(token)),
        None => Arc::new(MetadataTokenProvider::new()),
    };

    // Wire up dependencies
    let content_store = Arc::new(FirestoreContentStore::new(
        &config.google_project_id,
        token_provider.clone(),
    ));
    let blob_store = Arc::new(GcsBlobStore::new(token_provider));
    let vision_model = Arc::new(GeminiVisionModel::new(GeminiClient::new(
        &config.gemini_api_key,
    )));
    let deps = Arc::new(ServerDeps::new(content_store, blob_store, vision_model));

    // Build application
    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Storage webhook: http://localhost:{}/events/storage", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
