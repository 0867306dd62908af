use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cvforge_api::ai_client::AiClient;
use cvforge_api::config::Config;
use cvforge_api::layout::FitConfig;
use cvforge_api::routes::build_router;
use cvforge_api::state::AppState;
use cvforge_api::storage::connect_storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CVForge API v{}", env!("CARGO_PKG_VERSION"));

    // Drafts and application log: Redis when configured, process memory otherwise
    let storage = connect_storage(config.redis_url.as_deref()).await?;

    let ai = AiClient::new(
        config.ai_gateway_api_key.clone(),
        config.ai_gateway_url.clone(),
        config.ai_model.clone(),
    );
    info!("AI client initialized (model: {})", ai.model());

    let fit = FitConfig::with_min_scale(config.fit_min_scale)?;
    info!(
        "Fit engine: target {:.0}px, min scale {}",
        fit.target_height_px(),
        fit.min_scale()
    );

    let state = AppState {
        storage,
        ai,
        fit,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
