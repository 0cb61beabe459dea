mod config;
mod errors;
mod intake;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::intake::extractor::HeuristicExtractor;
use crate::intake::fallback::TextFallbackExtractor;
use crate::intake::pipeline::Pipeline;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so logging picks up RUST_LOG from .env too
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.rust_log.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Intake API v{}", env!("CARGO_PKG_VERSION"));

    // Wire the extraction pipeline: heuristic primary, pattern-based text
    // fallback, both bounded by the configured timeout.
    let pipeline = Arc::new(Pipeline::new(
        Arc::new(HeuristicExtractor),
        Arc::new(TextFallbackExtractor),
        Duration::from_secs(config.extractor_timeout_secs),
    ));
    info!(
        "Intake pipeline initialized (extractor timeout: {}s)",
        config.extractor_timeout_secs
    );

    let state = AppState {
        config: config.clone(),
        pipeline,
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
