// Vision-language model clients
//
// The rest of the service only sees the VisionModel trait: one image, one question,
// raw text back. Backends are picked at startup from MODEL_BACKEND.

pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use image::DynamicImage;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::core::config::{Config, ModelBackend};
use crate::core::errors::{ModelError, ModelResult};
use crate::middleware::CircuitBreaker;
use crate::utils::{encode_png_async, Metrics};

pub use gemini::GeminiVisionClient;
pub use openai::OpenAiVisionClient;

/// `generate(image, prompt) -> text` capability of a pretrained multimodal model.
///
/// Implementations must be safe to call concurrently; the service shares one
/// instance across all requests.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(&self, image: &DynamicImage, prompt: &str) -> ModelResult<String>;

    /// Human-readable backend/model identifier for logs and /health
    fn describe(&self) -> String;
}

/// Build the configured model client
pub fn build_model(config: &Config, metrics: Metrics) -> anyhow::Result<Arc<dyn VisionModel>> {
    let breaker = CircuitBreaker::from_config(&config.circuit);
    let http_client = build_http_client(config.model_timeout())?;

    let model: Arc<dyn VisionModel> = match config.model.backend {
        ModelBackend::Gemini => Arc::new(GeminiVisionClient::new(
            http_client,
            &config.model,
            breaker,
            Some(metrics),
        )),
        ModelBackend::OpenAi => Arc::new(OpenAiVisionClient::new(
            http_client,
            &config.model,
            breaker,
            Some(metrics),
        )),
    };
    Ok(model)
}

fn build_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(8)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .context("Failed to create HTTP client")
}

/// PNG-encode and base64 the image for inline transport
pub(crate) async fn image_to_base64_png(image: &DynamicImage) -> ModelResult<String> {
    let png = encode_png_async(image)
        .await
        .map_err(|e| ModelError::EncodingFailed(e.to_string()))?;
    Ok(general_purpose::STANDARD.encode(png))
}

/// Run a model call behind the circuit breaker. No retries.
pub(crate) async fn call_guarded<F>(
    breaker: &CircuitBreaker,
    metrics: Option<&Metrics>,
    call: F,
) -> ModelResult<String>
where
    F: Future<Output = ModelResult<String>>,
{
    if !breaker.allow_request() {
        return Err(ModelError::CircuitOpen);
    }

    match call.await {
        Ok(text) => {
            breaker.record_success();
            Ok(text)
        }
        Err(e) => {
            if breaker.record_failure() {
                warn!("Model circuit breaker opened after error: {}", e);
                if let Some(m) = metrics {
                    m.record_circuit_breaker_trip();
                }
            }
            Err(e)
        }
    }
}

/// Turn a non-2xx response into a ModelError carrying the body
pub(crate) async fn check_status(response: reqwest::Response) -> ModelResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ModelError::BadStatus {
        status: status.as_u16(),
        body,
    })
}
