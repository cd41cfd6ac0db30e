// Library exports for the persona ad targeting service
//
// upload -> segmentation (vision model) -> ad selection -> HTML rendering

pub mod core;
pub mod middleware;
pub mod server;
pub mod services;
pub mod utils;

pub use crate::core::{
    config::Config,
    errors::{ApiError, ConfigError, ModelError},
    types::{Advertisement, AppState, Category, Segmentation, SelectedAds, NOT_AVAILABLE},
};

pub use middleware::{CircuitBreaker, CircuitState};

pub use server::build_router;

pub use services::{
    build_model, normalize_answer, render_results, AdSelector, SegmentationPipeline, VisionModel,
};

pub use utils::{load_rgb_image_async, Metrics};
