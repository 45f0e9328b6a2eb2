use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use presence_client::{ReqwestFetcher, web_aggregator};
use presence_core::PipelineConfig;
use presence_server::cors::cors_layer;
use presence_server::rate_limit::RateLimit;
use presence_server::routes;
use presence_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("presence=info".parse()?))
        .with_target(false)
        .init();

    let config = PipelineConfig::from_env().context("Invalid PRESENCE_* configuration")?;
    let port = std::env::var("PRESENCE_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    // Callers choose the targets, so private addresses stay blocked.
    let fetcher =
        ReqwestFetcher::new(config.fetch_timeout).context("Failed to create HTTP client")?;
    let state = Arc::new(AppState::new(web_aggregator(fetcher), config)?);

    let mut app = routes::router(state);
    match RateLimit::from_env().context("Invalid rate limit configuration")? {
        Some(limit) => {
            tracing::info!(
                max_requests = limit.max_requests,
                window_secs = limit.window.as_secs(),
                "Rate limiting enabled"
            );
            app = limit.apply(app)?;
        }
        None => tracing::warn!("Rate limiting disabled"),
    }

    let origins = std::env::var("PRESENCE_ALLOWED_ORIGINS").ok();
    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(origins.as_deref())?);

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    // The rate limiter keys clients by peer address.
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
