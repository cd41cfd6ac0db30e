use crate::core::errors::ConfigError;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Placeholder image shown on every ad card
pub const DEFAULT_AD_IMAGE_URL: &str =
    "https://blog.udemy.com/wp-content/uploads/2014/05/bigstock-Vector-Promotion-Concept-Fla-57726575.jpg";

/// Which vision model API the service talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    /// Google Gemini `generateContent`
    Gemini,
    /// Any OpenAI-compatible `/v1/chat/completions` server (vLLM, llama.cpp, ...)
    OpenAi,
}

impl ModelBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelBackend::Gemini => "gemini",
            ModelBackend::OpenAi => "openai",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ModelBackend::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ModelBackend::OpenAi => "http://127.0.0.1:8000/v1",
        }
    }
}

impl FromStr for ModelBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ModelBackend::Gemini),
            "openai" | "openai-compatible" => Ok(ModelBackend::OpenAi),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub log_level: Level,
    pub max_upload_mb: usize,
}

/// Vision model configuration
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub backend: ModelBackend,
    pub model_name: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub max_tokens: u32,
}

/// Segmentation pipeline configuration
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    /// Ask the four questions concurrently instead of one after another
    pub parallel_questions: bool,
}

/// Ad catalog configuration
#[derive(Debug, Clone)]
pub struct AdsConfig {
    pub image_url: String,
}

/// Circuit breaker configuration for model calls
#[derive(Debug, Clone)]
pub struct CircuitConfig {
    pub failure_threshold: usize,
    pub reset_after: Duration,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub segmentation: SegmentationConfig,
    pub ads: AdsConfig,
    pub circuit: CircuitConfig,
}

impl Default for Config {
    fn default() -> Self {
        let backend = ModelBackend::Gemini;
        Self {
            server: ServerConfig {
                port: 5000,
                host: "0.0.0.0".to_string(),
                log_level: Level::INFO,
                max_upload_mb: 16,
            },
            model: ModelConfig {
                backend,
                model_name: "gemini-2.5-flash".to_string(),
                api_key: None,
                base_url: backend.default_base_url().to_string(),
                timeout: Duration::from_secs(30),
                max_tokens: 32,
            },
            segmentation: SegmentationConfig {
                parallel_questions: false,
            },
            ads: AdsConfig {
                image_url: DEFAULT_AD_IMAGE_URL.to_string(),
            },
            circuit: CircuitConfig {
                failure_threshold: 5,
                reset_after: Duration::from_secs(60),
            },
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Unset or empty means `default`; anything unrecognized is an error
fn env_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env_string(key) {
        None => Ok(default),
        Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidBool { key, value }),
    }
}

fn parse_log_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = match env_string("MODEL_BACKEND") {
            Some(s) => s.parse()?,
            None => defaults.model.backend,
        };

        let model_name = env_string("MODEL_NAME").unwrap_or_else(|| match backend {
            ModelBackend::Gemini => defaults.model.model_name.clone(),
            ModelBackend::OpenAi => "HuggingFaceTB/SmolVLM-256M-Instruct".to_string(),
        });

        Ok(Self {
            server: ServerConfig {
                port: env_parse("SERVER_PORT").unwrap_or(defaults.server.port),
                host: env_string("SERVER_HOST").unwrap_or(defaults.server.host),
                log_level: env::var("LOG_LEVEL")
                    .ok()
                    .and_then(|s| parse_log_level(&s))
                    .unwrap_or(defaults.server.log_level),
                max_upload_mb: env_parse("MAX_UPLOAD_MB").unwrap_or(defaults.server.max_upload_mb),
            },
            model: ModelConfig {
                backend,
                model_name,
                api_key: env_string("MODEL_API_KEY").or_else(|| env_string("GEMINI_API_KEY")),
                base_url: env_string("MODEL_BASE_URL")
                    .unwrap_or_else(|| backend.default_base_url().to_string()),
                timeout: env_parse("MODEL_TIMEOUT_SECONDS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.model.timeout),
                max_tokens: env_parse("MODEL_MAX_TOKENS").unwrap_or(defaults.model.max_tokens),
            },
            segmentation: SegmentationConfig {
                parallel_questions: env_bool(
                    "PARALLEL_QUESTIONS",
                    defaults.segmentation.parallel_questions,
                )?,
            },
            ads: AdsConfig {
                image_url: env_string("AD_IMAGE_URL").unwrap_or(defaults.ads.image_url),
            },
            circuit: CircuitConfig {
                failure_threshold: env_parse("CIRCUIT_FAILURE_THRESHOLD")
                    .unwrap_or(defaults.circuit.failure_threshold),
                reset_after: env_parse("CIRCUIT_RESET_SECONDS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.circuit.reset_after),
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        if self.server.max_upload_mb == 0 {
            return Err(ConfigError::InvalidUploadLimit);
        }

        if self.circuit.failure_threshold == 0 {
            return Err(ConfigError::InvalidCircuitBreaker(
                "failure threshold must be > 0".to_string(),
            ));
        }

        if !self.model.base_url.starts_with("http://") && !self.model.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(self.model.base_url.clone()));
        }

        // Local OpenAI-compatible servers usually run without a key
        if self.model.backend == ModelBackend::Gemini && self.model.api_key.is_none() {
            return Err(ConfigError::MissingApiKey("gemini"));
        }

        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.server.port
    }

    pub fn server_host(&self) -> &str {
        &self.server.host
    }

    pub fn log_level(&self) -> Level {
        self.server.log_level
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb * 1024 * 1024
    }

    pub fn model_timeout(&self) -> Duration {
        self.model.timeout
    }

    pub fn parallel_questions(&self) -> bool {
        self.segmentation.parallel_questions
    }

    pub fn ad_image_url(&self) -> &str {
        &self.ads.image_url
    }
}
