pub mod image_ops;
pub mod metrics;

pub use image_ops::{encode_png, encode_png_async, load_rgb_image_async};
pub use metrics::{Metrics, MetricsSnapshot};
