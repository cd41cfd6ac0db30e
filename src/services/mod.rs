pub mod ads;
pub mod rendering;
pub mod segmentation;
pub mod vlm;

// Re-export commonly used services
pub use ads::{AdSelector, Catalog};
pub use rendering::render_results;
pub use segmentation::{normalize_answer, SegmentationPipeline};
pub use vlm::{build_model, VisionModel};
