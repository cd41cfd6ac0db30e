// Shared types for the segmentation -> ad selection -> rendering flow

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::core::config::Config;
use crate::services::ads::AdSelector;
use crate::services::segmentation::SegmentationPipeline;
use crate::utils::Metrics;

/// Label recorded for a category whose model call failed
pub const NOT_AVAILABLE: &str = "N/A";

/// Application state shared across handlers.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<SegmentationPipeline>,
    pub selector: Arc<AdSelector>,
    pub metrics: Metrics,
}

/// One of the four dimensions the uploaded photo is classified along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Age,
    Gender,
    Mood,
    Style,
}

impl Category {
    /// All categories in rendering order
    pub const ALL: [Category; 4] = [Category::Age, Category::Gender, Category::Mood, Category::Style];

    pub fn index(self) -> usize {
        match self {
            Category::Age => 0,
            Category::Gender => 1,
            Category::Mood => 2,
            Category::Style => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Age => "age",
            Category::Gender => "gender",
            Category::Mood => "mood",
            Category::Style => "style",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Age => "Age",
            Category::Gender => "Gender",
            Category::Mood => "Mood",
            Category::Style => "Style",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::Age => "🎯",
            Category::Gender => "👤",
            Category::Mood => "😊",
            Category::Style => "👔",
        }
    }

    /// Labels the model is asked to choose from; these are also the catalog keys
    pub fn allowed_labels(self) -> &'static [&'static str] {
        match self {
            Category::Age => &["20-30", "30-40", "40-50", "50+"],
            Category::Gender => &["Male", "Female"],
            Category::Mood => &["Happy", "Neutral", "Sad"],
            Category::Style => &["Sporty", "Casual", "Formal", "Vintage"],
        }
    }

    /// The fixed question sent to the vision model
    pub fn question(self) -> &'static str {
        match self {
            Category::Age => "Based on the person's facial features, what is the age range? Answer with one of: '20-30', '30-40', '40-50', '50+'.",
            Category::Gender => "Based on the person's appearance, what is their likely gender? Answer with 'Male' or 'Female'.",
            Category::Mood => "How would you describe the person's mood based on their expression? Answer with 'Happy', 'Neutral', or 'Sad'.",
            Category::Style => "Based on the person's style, what fashion category do they belong to? Answer with 'Sporty', 'Casual', 'Formal', or 'Vintage'.",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-request mapping from category to canonical label (or "N/A").
///
/// Every category always has a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segmentation {
    pub age: String,
    pub gender: String,
    pub mood: String,
    pub style: String,
}

impl Default for Segmentation {
    fn default() -> Self {
        Self {
            age: NOT_AVAILABLE.to_string(),
            gender: NOT_AVAILABLE.to_string(),
            mood: NOT_AVAILABLE.to_string(),
            style: NOT_AVAILABLE.to_string(),
        }
    }
}

impl Segmentation {
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Age => &self.age,
            Category::Gender => &self.gender,
            Category::Mood => &self.mood,
            Category::Style => &self.style,
        }
    }

    pub fn set(&mut self, category: Category, label: String) {
        match category {
            Category::Age => self.age = label,
            Category::Gender => self.gender = label,
            Category::Mood => self.mood = label,
            Category::Style => self.style = label,
        }
    }

    /// Categories whose model call failed
    pub fn failed_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.get(*c) == NOT_AVAILABLE)
            .collect()
    }
}

/// A single advertisement from a static catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advertisement {
    pub title: String,
    pub description: String,
    pub price: String,
    pub rating: f32,
    pub image_url: String,
}

impl Advertisement {
    pub fn new(title: &str, description: &str, price: &str, rating: f32, image_url: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            price: price.to_string(),
            rating,
            image_url: image_url.to_string(),
        }
    }
}

/// Exactly one advertisement per category
#[derive(Debug, Clone, Copy)]
pub struct SelectedAds<'a> {
    ads: [&'a Advertisement; 4],
}

impl<'a> SelectedAds<'a> {
    pub fn new(ads: [&'a Advertisement; 4]) -> Self {
        Self { ads }
    }

    pub fn get(&self, category: Category) -> &'a Advertisement {
        self.ads[category.index()]
    }

    /// Ads in rendering order (age, gender, mood, style)
    pub fn iter(&self) -> impl Iterator<Item = &'a Advertisement> + '_ {
        self.ads.iter().copied()
    }
}

/// Successful `/process_image` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessImageResponse {
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segmentation_defaults_to_not_available() {
        let seg = Segmentation::default();
        for category in Category::ALL {
            assert_eq!(seg.get(category), NOT_AVAILABLE);
        }
        assert_eq!(seg.failed_categories().len(), 4);
    }

    #[test]
    fn test_segmentation_set_get() {
        let mut seg = Segmentation::default();
        seg.set(Category::Mood, "Happy".to_string());
        assert_eq!(seg.get(Category::Mood), "Happy");
        assert_eq!(
            seg.failed_categories(),
            vec![Category::Age, Category::Gender, Category::Style]
        );
    }

    #[test]
    fn test_questions_embed_allowed_labels() {
        for category in Category::ALL {
            let question = category.question();
            for label in category.allowed_labels() {
                assert!(
                    question.contains(&format!("'{}'", label)),
                    "{} question is missing {}",
                    category,
                    label
                );
            }
        }
    }

    #[test]
    fn test_category_indices_match_order() {
        for (i, category) in Category::ALL.into_iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }
}
