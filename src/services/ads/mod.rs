// Ad selection: one random catalog entry per segmented category

pub mod catalog;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::core::types::{Advertisement, Category, Segmentation, SelectedAds};

pub use catalog::Catalog;

/// Owns the four read-only catalogs
pub struct AdSelector {
    catalogs: [Catalog; 4],
}

impl AdSelector {
    pub fn new(image_url: &str) -> Self {
        Self {
            catalogs: Category::ALL.map(|category| Catalog::new(category, image_url)),
        }
    }

    pub fn catalog(&self, category: Category) -> &Catalog {
        &self.catalogs[category.index()]
    }

    /// Pick one ad per category using the thread-local RNG
    pub fn select(&self, segmentation: &Segmentation) -> SelectedAds<'_> {
        self.select_with(segmentation, &mut rand::thread_rng())
    }

    /// Pick one ad per category, uniformly from the label's candidates
    pub fn select_with<R: Rng + ?Sized>(&self, segmentation: &Segmentation, rng: &mut R) -> SelectedAds<'_> {
        SelectedAds::new(Category::ALL.map(|category| {
            let catalog = self.catalog(category);
            let label = segmentation.get(category);
            let candidates = catalog.candidates(label);
            let ad = pick(candidates, rng).unwrap_or_else(|| catalog.fallback_ad());
            debug!("Selected ad for {}={}: {}", category, label, ad.title);
            ad
        }))
    }
}

fn pick<'a, R: Rng + ?Sized>(candidates: &'a [Advertisement], rng: &mut R) -> Option<&'a Advertisement> {
    candidates.choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_AD_IMAGE_URL;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn segmentation(age: &str, gender: &str, mood: &str, style: &str) -> Segmentation {
        Segmentation {
            age: age.into(),
            gender: gender.into(),
            mood: mood.into(),
            style: style.into(),
        }
    }

    #[test]
    fn test_known_label_draws_from_catalog() {
        let selector = AdSelector::new(DEFAULT_AD_IMAGE_URL);
        let seg = segmentation("30-40", "Male", "Happy", "Casual");
        let happy = selector.catalog(Category::Mood).get("Happy").unwrap();

        for _ in 0..50 {
            let selected = selector.select(&seg);
            assert!(happy.contains(selected.get(Category::Mood)));
        }
    }

    #[test]
    fn test_unknown_label_always_gets_default() {
        let selector = AdSelector::new(DEFAULT_AD_IMAGE_URL);
        let seg = segmentation("N/A", "Robot", "Ecstatic", "");

        for _ in 0..10 {
            let selected = selector.select(&seg);
            let mood = selected.get(Category::Mood);
            assert_eq!(mood.title, "Default Mood Ad");
            assert_eq!(mood.price, "$0.00");
            assert_eq!(selected.get(Category::Age).title, "Default Age Ad");
            assert_eq!(selected.get(Category::Gender).title, "Default Gender Ad");
            assert_eq!(selected.get(Category::Style).title, "Default Style Ad");
        }
    }

    #[test]
    fn test_selection_covers_all_candidates() {
        let selector = AdSelector::new(DEFAULT_AD_IMAGE_URL);
        let seg = segmentation("50+", "Female", "Sad", "Formal");
        let mut rng = StdRng::seed_from_u64(7);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(selector.select_with(&seg, &mut rng).get(Category::Style).title.clone());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_selection_order_matches_categories() {
        let selector = AdSelector::new(DEFAULT_AD_IMAGE_URL);
        let selected = selector.select(&Segmentation::default());
        let titles: Vec<&str> = selected.iter().map(|ad| ad.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Default Age Ad", "Default Gender Ad", "Default Mood Ad", "Default Style Ad"]
        );
    }
}
