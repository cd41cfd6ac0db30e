// Segmentation pipeline: four multiple-choice questions about the person in the photo

pub mod normalizer;

use futures::future::join_all;
use image::DynamicImage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

use crate::core::config::Config;
use crate::core::errors::ModelError;
use crate::core::types::{Category, Segmentation, NOT_AVAILABLE};
use crate::services::vlm::VisionModel;
use crate::utils::Metrics;

pub use normalizer::{normalize_answer, title_case, END_OF_UTTERANCE};

/// Asks the vision model one question per category and normalizes the answers.
///
/// A failing or slow category is recorded as "N/A" and never affects the others.
pub struct SegmentationPipeline {
    model: Arc<dyn VisionModel>,
    timeout: Duration,
    parallel: bool,
    metrics: Metrics,
}

impl SegmentationPipeline {
    pub fn new(model: Arc<dyn VisionModel>, timeout: Duration, parallel: bool, metrics: Metrics) -> Self {
        Self {
            model,
            timeout,
            parallel,
            metrics,
        }
    }

    pub fn from_config(config: &Config, model: Arc<dyn VisionModel>, metrics: Metrics) -> Self {
        Self::new(model, config.model_timeout(), config.parallel_questions(), metrics)
    }

    pub fn model_description(&self) -> String {
        self.model.describe()
    }

    /// Classify the image along all four categories
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height(), parallel = self.parallel))]
    pub async fn segment(&self, image: &DynamicImage) -> Segmentation {
        let start = Instant::now();

        let answers: Vec<(Category, String)> = if self.parallel {
            join_all(
                Category::ALL
                    .iter()
                    .map(|&category| async move { (category, self.classify(image, category).await) }),
            )
            .await
        } else {
            let mut answers = Vec::with_capacity(Category::ALL.len());
            for category in Category::ALL {
                answers.push((category, self.classify(image, category).await));
            }
            answers
        };

        let mut segmentation = Segmentation::default();
        for (category, label) in answers {
            segmentation.set(category, label);
        }

        info!(
            "Segmentation finished in {:.2}s: age={} gender={} mood={} style={}",
            start.elapsed().as_secs_f64(),
            segmentation.age,
            segmentation.gender,
            segmentation.mood,
            segmentation.style
        );
        segmentation
    }

    /// One model call for one category, with timeout and "N/A" fallback
    async fn classify(&self, image: &DynamicImage, category: Category) -> String {
        let question = category.question();
        info!("Segmenting for {} using question: {}", category, question);

        let start = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, self.model.generate(image, question)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(self.timeout)),
        };
        let elapsed = start.elapsed();

        match outcome {
            Ok(raw) => {
                self.metrics.record_model_call(true, elapsed);
                let label = normalize_answer(&raw);
                if !category.allowed_labels().contains(&label.as_str()) {
                    warn!(
                        "Answer for {} is outside the prompted set: {:?} (raw {:?})",
                        category, label, raw
                    );
                    self.metrics.record_off_list_label(category);
                }
                info!("Segmentation result for {}: {}", category, label);
                label
            }
            Err(e) => {
                self.metrics.record_model_call(false, elapsed);
                if e.is_timeout() {
                    self.metrics.record_model_timeout();
                }
                self.metrics.record_category_fallback(category);
                error!("Error during segmentation for {}: {}", category, e);
                NOT_AVAILABLE.to_string()
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{StubAnswer, StubModel};
    use super::*;
    use std::sync::atomic::Ordering;

    fn pipeline(model: Arc<StubModel>, parallel: bool) -> (SegmentationPipeline, Metrics) {
        let metrics = Metrics::new();
        let pipeline = SegmentationPipeline::new(model, Duration::from_millis(200), parallel, metrics.clone());
        (pipeline, metrics)
    }

    fn image() -> DynamicImage {
        DynamicImage::new_rgb8(8, 8)
    }

    #[tokio::test]
    async fn test_failed_category_becomes_not_available() {
        let model = Arc::new(StubModel::new(&[
            (Category::Age, StubAnswer::Text("30-40")),
            (Category::Gender, StubAnswer::Text("male.")),
            (Category::Mood, StubAnswer::Fail),
            (Category::Style, StubAnswer::Text(" Casual<end_of_utterance>")),
        ]));
        let (pipeline, metrics) = pipeline(model.clone(), false);

        let seg = pipeline.segment(&image()).await;

        assert_eq!(seg.age, "30-40");
        assert_eq!(seg.gender, "Male");
        assert_eq!(seg.mood, NOT_AVAILABLE);
        assert_eq!(seg.style, "Casual");
        assert_eq!(model.calls.load(Ordering::SeqCst), 4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.model_calls_failed, 1);
        assert_eq!(snapshot.category_fallbacks.get("mood"), Some(&1));
    }

    #[tokio::test]
    async fn test_all_failures_still_cover_every_category() {
        let model = Arc::new(StubModel::new(&[]));
        let (pipeline, _) = pipeline(model, false);

        let seg = pipeline.segment(&image()).await;
        assert_eq!(seg, Segmentation::default());
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let model = Arc::new(StubModel::new(&[
            (Category::Age, StubAnswer::Hang),
            (Category::Gender, StubAnswer::Text("Female")),
            (Category::Mood, StubAnswer::Text("Sad")),
            (Category::Style, StubAnswer::Text("Formal")),
        ]));
        let (pipeline, metrics) = pipeline(model, true);

        let seg = pipeline.segment(&image()).await;

        assert_eq!(seg.age, NOT_AVAILABLE);
        assert_eq!(seg.gender, "Female");
        assert_eq!(seg.mood, "Sad");
        assert_eq!(seg.style, "Formal");
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.model_calls_timed_out, 1);
        assert_eq!(snapshot.model_calls_failed, 1);
        assert_eq!(snapshot.category_fallbacks.get("age"), Some(&1));
    }

    #[tokio::test]
    async fn test_parallel_and_sequential_agree() {
        let model = Arc::new(StubModel::answering("50+", "Female", "Neutral", "Vintage"));

        let (sequential, _) = pipeline(model.clone(), false);
        let (parallel, _) = pipeline(model, true);

        let a = sequential.segment(&image()).await;
        let b = parallel.segment(&image()).await;
        assert_eq!(a, b);
        assert_eq!(a.style, "Vintage");
    }

    #[tokio::test]
    async fn test_off_list_answer_is_kept_and_counted() {
        let model = Arc::new(StubModel::answering("30-40", "Male", "ecstatic", "Casual"));
        let (pipeline, metrics) = pipeline(model, false);

        let seg = pipeline.segment(&image()).await;
        assert_eq!(seg.mood, "Ecstatic");
        assert_eq!(metrics.snapshot().off_list_labels.get("mood"), Some(&1));
    }
}
