// HTTP surface: router and handlers

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::core::config::Config;
use crate::core::errors::ApiError;
use crate::core::types::{AppState, ProcessImageResponse};
use crate::services::ads::AdSelector;
use crate::services::rendering::render_results;
use crate::services::segmentation::SegmentationPipeline;
use crate::services::vlm::VisionModel;
use crate::utils::{load_rgb_image_async, Metrics};

/// Multipart field carrying the photo
pub const IMAGE_FIELD: &str = "image";

const INDEX_HTML: &str = include_str!("../templates/index.html");

impl AppState {
    /// Wire the service object from config and a model client
    pub fn new(config: Arc<Config>, model: Arc<dyn VisionModel>, metrics: Metrics) -> Self {
        let pipeline = SegmentationPipeline::from_config(&config, model, metrics.clone());
        let selector = AdSelector::new(config.ad_image_url());
        Self {
            config,
            pipeline: Arc::new(pipeline),
            selector: Arc::new(selector),
            metrics,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/stats", get(stats_endpoint))
        .route("/process_image", post(process_image))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "model_backend": state.config.model.backend.as_str(),
        "model": state.pipeline.model_description(),
    }))
}

/// Prometheus metrics endpoint
async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

async fn stats_endpoint(State(state): State<AppState>) -> Json<crate::utils::MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Classify the uploaded photo and render matching ads
///
/// # Request Format:
/// - multipart/form-data with an `image` file field
///
/// # Response:
/// - 200 `{"html": ...}` once rendering is reached, even if some categories are "N/A"
/// - 400 `{"error": "No image uploaded"}` without an image field
/// - 500 `{"error": ...}` if the image cannot be decoded
async fn process_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProcessImageResponse>, ApiError> {
    let start_time = Instant::now();
    state.metrics.record_request();

    let bytes = match read_image_field(multipart).await {
        Some(bytes) => bytes,
        None => {
            state.metrics.record_missing_image();
            return Err(ApiError::NoImage);
        }
    };

    let image = load_rgb_image_async(bytes).await.map_err(|e| {
        error!("Error reading image: {:#}", e);
        state.metrics.record_decode_failure();
        ApiError::ImageDecode(format!("{:#}", e))
    })?;
    info!("Received image of size: {}x{}", image.width(), image.height());

    let segmentation = state.pipeline.segment(&image).await;
    let ads = state.selector.select(&segmentation);
    let html = render_results(&segmentation, &ads);

    info!(
        "Request completed in {:.2}s ({} categories fell back)",
        start_time.elapsed().as_secs_f64(),
        segmentation.failed_categories().len()
    );

    Ok(Json(ProcessImageResponse { html }))
}

/// Bytes of the first `image` file field, or None if the body has none
///
/// A plain form value named `image` (no filename) is not an upload.
async fn read_image_field(multipart: Result<Multipart, MultipartRejection>) -> Option<Vec<u8>> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(e) => {
            warn!("Request is not a multipart upload: {}", e);
            return None;
        }
    };

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some(IMAGE_FIELD) {
                    continue;
                }
                if field.file_name().is_none() {
                    warn!("Field '{}' is not a file upload, ignoring", IMAGE_FIELD);
                    continue;
                }
                return match field.bytes().await {
                    Ok(data) => Some(data.to_vec()),
                    Err(e) => {
                        warn!("Failed to read image field: {}", e);
                        None
                    }
                };
            }
            Ok(None) => return None,
            Err(e) => {
                warn!("Multipart error: {}", e);
                return None;
            }
        }
    }
}
