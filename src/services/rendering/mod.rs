// HTML fragment rendering for segmentation results and selected ads
//
// Catalog text and normalized model output are interpolated as-is. Model-influenced
// labels are the only dynamic input; escape them here if that ever changes.

use crate::core::types::{Advertisement, Category, Segmentation, SelectedAds};

const FULL_STAR: char = '★';
const HALF_STAR: char = '½';

const RESULTS_STYLE: &str = r#"
    <style>
        .results-container {
            font-family: Arial, sans-serif;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
        }

        .segmentation-card {
            background: white;
            border-radius: 8px;
            padding: 15px;
            margin-bottom: 20px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }

        .segmentation-grid {
            display: grid;
            grid-template-columns: repeat(4, 1fr);
            gap: 15px;
        }

        .segmentation-item {
            display: flex;
            align-items: center;
            gap: 8px;
        }

        .ads-grid {
            display: grid;
            grid-template-columns: repeat(4, 1fr);
            gap: 20px;
        }

        .ad-card {
            background: white;
            border-radius: 8px;
            overflow: hidden;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
            transition: transform 0.2s;
        }

        .ad-card:hover {
            transform: translateY(-5px);
        }

        .ad-image {
            width: 100%;
            height: 200px;
            object-fit: cover;
        }

        .ad-content {
            padding: 15px;
        }

        .ad-title {
            margin: 0 0 10px 0;
            font-size: 16px;
            font-weight: bold;
            color: #333;
        }

        .ad-description {
            font-size: 14px;
            color: #666;
            margin-bottom: 15px;
            line-height: 1.4;
        }

        .ad-footer {
            display: flex;
            justify-content: space-between;
            align-items: center;
        }

        .ad-price {
            color: #2ecc71;
            font-weight: bold;
            font-size: 18px;
        }

        .ad-rating {
            color: #f1c40f;
            font-size: 14px;
        }

        @media (max-width: 1024px) {
            .ads-grid {
                grid-template-columns: repeat(2, 1fr);
            }
        }

        @media (max-width: 640px) {
            .ads-grid {
                grid-template-columns: 1fr;
            }
            .segmentation-grid {
                grid-template-columns: repeat(2, 1fr);
            }
        }
    </style>
"#;

/// One filled star per whole point, plus a half star if the fraction is >= 0.5
pub fn format_stars(rating: f32) -> String {
    let rating = rating.max(0.0);
    let full = rating.trunc() as usize;
    let mut stars: String = std::iter::repeat(FULL_STAR).take(full).collect();
    if rating - rating.trunc() >= 0.5 {
        stars.push(HALF_STAR);
    }
    stars
}

/// Numeric rating as shown next to the stars ("4.8", "5.0")
pub fn format_rating(rating: f32) -> String {
    format!("{:.1}", rating)
}

pub fn format_ad_card(ad: &Advertisement) -> String {
    format!(
        r#"
        <div class="ad-card">
            <img src="{image}" alt="{title}" class="ad-image">
            <div class="ad-content">
                <h3 class="ad-title">{title}</h3>
                <p class="ad-description">{description}</p>
                <div class="ad-footer">
                    <span class="ad-price">{price}</span>
                    <span class="ad-rating">{stars} ({rating})</span>
                </div>
            </div>
        </div>
        "#,
        image = ad.image_url,
        title = ad.title,
        description = ad.description,
        price = ad.price,
        stars = format_stars(ad.rating),
        rating = format_rating(ad.rating),
    )
}

fn format_segmentation_item(category: Category, label: &str) -> String {
    format!(
        r#"
                <div class="segmentation-item">
                    <span>{icon}</span>
                    <span>{name}: {label}</span>
                </div>"#,
        icon = category.icon(),
        name = category.display_name(),
        label = label,
    )
}

/// Render the full results fragment: labels card followed by four ad cards
pub fn render_results(segmentation: &Segmentation, ads: &SelectedAds<'_>) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str(RESULTS_STYLE);

    html.push_str(
        r#"
    <div class="results-container">
        <div class="segmentation-card">
            <div class="segmentation-grid">"#,
    );
    for category in Category::ALL {
        html.push_str(&format_segmentation_item(category, segmentation.get(category)));
    }
    html.push_str(
        r#"
            </div>
        </div>

        <div class="ads-grid">"#,
    );
    for ad in ads.iter() {
        html.push_str(&format_ad_card(ad));
    }
    html.push_str(
        r#"
        </div>
    </div>
    "#,
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_AD_IMAGE_URL;
    use crate::services::ads::AdSelector;

    #[test]
    fn test_format_stars() {
        assert_eq!(format_stars(4.8), "★★★★½");
        assert_eq!(format_stars(5.0), "★★★★★");
        assert_eq!(format_stars(4.4), "★★★★");
        assert_eq!(format_stars(4.5), "★★★★½");
        assert_eq!(format_stars(0.0), "");
    }

    #[test]
    fn test_format_rating_keeps_one_decimal() {
        assert_eq!(format_rating(5.0), "5.0");
        assert_eq!(format_rating(4.7), "4.7");
    }

    #[test]
    fn test_ad_card_contents() {
        let ad = Advertisement::new("Pro Athletic Wear", "High-performance gear", "$199.99", 4.8, "https://x/y.jpg");
        let card = format_ad_card(&ad);
        assert!(card.contains(r#"<img src="https://x/y.jpg" alt="Pro Athletic Wear""#));
        assert!(card.contains(r#"<h3 class="ad-title">Pro Athletic Wear</h3>"#));
        assert!(card.contains("$199.99"));
        assert!(card.contains("★★★★½ (4.8)"));
    }

    #[test]
    fn test_render_results() {
        let selector = AdSelector::new(DEFAULT_AD_IMAGE_URL);
        let segmentation = Segmentation {
            age: "30-40".into(),
            gender: "Male".into(),
            mood: "N/A".into(),
            style: "Casual".into(),
        };
        let ads = selector.select(&segmentation);
        let html = render_results(&segmentation, &ads);

        assert!(html.contains("Age: 30-40"));
        assert!(html.contains("Gender: Male"));
        assert!(html.contains("Mood: N/A"));
        assert!(html.contains("Style: Casual"));
        assert!(html.contains("🎯") && html.contains("👔"));
        assert_eq!(html.matches(r#"<div class="ad-card">"#).count(), 4);
        assert!(html.contains("Default Mood Ad"));
        assert!(html.contains("★★★★★ (5.0)"));
    }
}
