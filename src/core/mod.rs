pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items for convenience
pub use config::{Config, ModelBackend};
pub use errors::{ApiError, ConfigError, ModelError};
pub use types::{
    Advertisement, AppState, Category, ProcessImageResponse, Segmentation, SelectedAds,
    NOT_AVAILABLE,
};
