use async_trait::async_trait;
use image::DynamicImage;
use tracing::{debug, instrument};

use super::{call_guarded, check_status, image_to_base64_png, VisionModel};
use crate::core::config::ModelConfig;
use crate::core::errors::{ModelError, ModelResult};
use crate::middleware::CircuitBreaker;
use crate::utils::Metrics;

/// Client for OpenAI-compatible chat completion servers.
///
/// This is how small local models (SmolVLM and friends) are usually served,
/// e.g. through vLLM or llama.cpp's server.
pub struct OpenAiVisionClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
    circuit_breaker: CircuitBreaker,
    metrics: Option<Metrics>,
}

impl OpenAiVisionClient {
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
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
            circuit_breaker,
            metrics,
        }
    }

    fn request_body(&self, image_b64: String, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": 0.0,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/png;base64,{}", image_b64) }
                    },
                    { "type": "text", "text": prompt }
                ]
            }]
        })
    }

    async fn send(&self, image: &DynamicImage, prompt: &str) -> ModelResult<String> {
        let body = self.request_body(image_to_base64_png(image).await?, prompt);
        let url = format!("{}/chat/completions", self.base_url);

        let mut request = self.http_client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response: serde_json::Value = check_status(request.send().await?).await?.json().await?;

        if let Some(ref m) = self.metrics {
            let usage = &response["usage"];
            m.record_token_usage(
                usage["prompt_tokens"].as_u64().unwrap_or(0),
                usage["completion_tokens"].as_u64().unwrap_or(0),
            );
        }

        extract_text(&response)
    }
}

#[async_trait]
impl VisionModel for OpenAiVisionClient {
    #[instrument(skip(self, image), fields(model = %self.model))]
    async fn generate(&self, image: &DynamicImage, prompt: &str) -> ModelResult<String> {
        let text = call_guarded(&self.circuit_breaker, self.metrics.as_ref(), self.send(image, prompt)).await?;
        debug!("Chat completion answered: {:?}", text);
        Ok(text)
    }

    fn describe(&self) -> String {
        format!("openai/{}", self.model)
    }
}

fn extract_text(response: &serde_json::Value) -> ModelResult<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ModelError::InvalidResponse("missing choices[0].message.content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, ModelBackend};
    use serde_json::json;

    fn client() -> OpenAiVisionClient {
        let mut config = Config::default();
        config.model.backend = ModelBackend::OpenAi;
        config.model.model_name = "smolvlm".into();
        config.model.base_url = "http://localhost:8000/v1/".into();
        OpenAiVisionClient::new(reqwest::Client::new(), &config.model, CircuitBreaker::default(), None)
    }

    #[test]
    fn test_extract_text() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": " Female<end_of_utterance>" } }]
        });
        assert_eq!(extract_text(&response).unwrap(), " Female<end_of_utterance>");
        assert!(extract_text(&json!({ "choices": [] })).is_err());
    }

    #[test]
    fn test_request_body_uses_data_url() {
        let body = client().request_body("QUJD".into(), "Which style?");
        assert_eq!(body["model"], "smolvlm");
        assert_eq!(
            body["messages"][0]["content"][0]["image_url"]["url"],
            "data:image/png;base64,QUJD"
        );
        assert_eq!(body["messages"][0]["content"][1]["text"], "Which style?");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(client().base_url, "http://localhost:8000/v1");
        assert_eq!(client().describe(), "openai/smolvlm");
    }
}
