// Entry point for the persona ad targeting service

use persona_ads::{build_model, build_router, core::Config, AppState, Metrics, VisionModel};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Arc::new(Config::new().context("Failed to load configuration")?);

    // Initialize logging
    use tracing_subscriber::EnvFilter;

    let level = config.log_level().to_string().to_lowercase();
    let filter = EnvFilter::new(format!("persona_ads={level},tower_http={level},hyper=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("=== PERSONA ADS ===");
    info!(
        "Model: backend={} name={} timeout={}s parallel_questions={}",
        config.model.backend.as_str(),
        config.model.model_name,
        config.model_timeout().as_secs(),
        config.parallel_questions()
    );

    let metrics = Metrics::new();

    // The model client is built once and shared read-only by every request
    let model = build_model(&config, metrics.clone()).context("Failed to initialize vision model client")?;
    info!("Vision model client ready: {}", model.describe());

    let state = AppState::new(config.clone(), model, metrics);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server_host(), config.server_port());
    info!("{}", "=".repeat(60));
    info!("Server starting on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /               - Upload page");
    info!("  GET  /health         - Health check");
    info!("  GET  /metrics        - Prometheus metrics");
    info!("  GET  /stats          - JSON statistics");
    info!("  POST /process_image  - Segment photo and render ads (multipart field 'image')");
    info!("{}", "=".repeat(60));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
