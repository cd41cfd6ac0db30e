use async_trait::async_trait;
use image::DynamicImage;
use tracing::{debug, instrument};

use super::{call_guarded, check_status, image_to_base64_png, VisionModel};
use crate::core::config::ModelConfig;
use crate::core::errors::{ModelError, ModelResult};
use crate::middleware::CircuitBreaker;
use crate::utils::Metrics;

/// Gemini `generateContent` client
pub struct GeminiVisionClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    circuit_breaker: CircuitBreaker,
    metrics: Option<Metrics>,
}

impl GeminiVisionClient {
    pub fn new(
        http_client: reqwest::Client,
        config: &ModelConfig,
        circuit_breaker: CircuitBreaker,
        metrics: Option<Metrics>,
    ) -> Self {
        Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model_name.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            max_tokens: config.max_tokens,
            circuit_breaker,
            metrics,
        }
    }

    fn request_body(&self, image_b64: String, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": "image/png",
                            "data": image_b64
                        }
                    },
                    { "text": prompt }
                ]
            }],
            "generationConfig": {
                "temperature": 0.0,
                "maxOutputTokens": self.max_tokens,
                "thinkingConfig": { "thinking_budget": 0 }
            }
        })
    }

    async fn send(&self, image: &DynamicImage, prompt: &str) -> ModelResult<String> {
        let body = self.request_body(image_to_base64_png(image).await?, prompt);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let response: serde_json::Value = check_status(response).await?.json().await?;

        if let Some(ref m) = self.metrics {
            let (input_tokens, output_tokens) = extract_token_usage(&response);
            m.record_token_usage(input_tokens, output_tokens);
        }

        extract_text(&response)
    }
}

#[async_trait]
impl VisionModel for GeminiVisionClient {
    #[instrument(skip(self, image), fields(model = %self.model))]
    async fn generate(&self, image: &DynamicImage, prompt: &str) -> ModelResult<String> {
        let text = call_guarded(&self.circuit_breaker, self.metrics.as_ref(), self.send(image, prompt)).await?;
        debug!("Gemini answered: {:?}", text);
        Ok(text)
    }

    fn describe(&self) -> String {
        format!("gemini/{}", self.model)
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: &serde_json::Value) -> ModelResult<String> {
    let parts = response["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| ModelError::InvalidResponse("missing candidates[0].content.parts".into()))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect();

    if text.is_empty() {
        let reason = response["candidates"][0]["finishReason"]
            .as_str()
            .unwrap_or("no text parts");
        return Err(ModelError::InvalidResponse(format!("empty answer ({})", reason)));
    }
    Ok(text)
}

fn extract_token_usage(response: &serde_json::Value) -> (u64, u64) {
    let usage_metadata = &response["usageMetadata"];
    let input_tokens = usage_metadata["promptTokenCount"].as_u64().unwrap_or(0);
    let output_tokens = usage_metadata["candidatesTokenCount"].as_u64().unwrap_or(0);
    (input_tokens, output_tokens)
}
