// Static ad catalogs, one per segmentation category

use std::collections::HashMap;

use crate::core::types::{Advertisement, Category};

/// (title, description, price, rating)
type AdSpec = (&'static str, &'static str, &'static str, f32);

const AGE_ADS: &[(&str, &[AdSpec])] = &[
    ("20-30", &[
        ("Ultra Boost X Sneakers", "Limited edition sneakers with cutting-edge comfort technology", "$199.99", 4.8),
        ("Smart Fitness Watch Pro", "Track your workouts, sleep, and lifestyle with AI-powered insights", "$299.99", 4.7),
        ("Urban Streetwear Collection", "Express yourself with our latest street-inspired fashion drops", "$149.99", 4.6),
    ]),
    ("30-40", &[
        ("Premium Coffee Maker Plus", "Barista-quality coffee at home with smart temperature control", "$399.99", 4.9),
        ("Professional Series Smartwatch", "Elegant timepiece with advanced productivity features", "$449.99", 4.8),
        ("Home Automation Starter Kit", "Transform your space with intelligent lighting and security", "$299.99", 4.7),
    ]),
    ("40-50", &[
        ("Artisanal Wine Selection", "Curated collection of premium wines from renowned vineyards", "$599.99", 4.9),
        ("Luxury Watch Collection", "Timeless elegance meets modern craftsmanship", "$1999.99", 4.8),
        ("Executive Wardrobe Essentials", "Premium suits and accessories for the distinguished professional", "$899.99", 4.7),
    ]),
    ("50+", &[
        ("Wellness Supplement Bundle", "Comprehensive nutrition support for active aging", "$129.99", 4.8),
        ("Comfort-Tech Footwear", "Advanced ergonomic design for all-day comfort", "$159.99", 4.7),
        ("Luxury Travel Experiences", "Curated adventures with premium accommodations and service", "$2999.99", 4.9),
    ]),
];

const GENDER_ADS: &[(&str, &[AdSpec])] = &[
    ("Male", &[
        ("Premium Grooming Kit", "Complete care collection with precision trimmer and luxurious skincare", "$199.99", 4.7),
        ("Modern Menswear Essentials", "Versatile pieces for the contemporary gentleman", "$299.99", 4.6),
        ("Sports Performance Collection", "Advanced gear for your active lifestyle", "$249.99", 4.8),
    ]),
    ("Female", &[
        ("Luxury Beauty Collection", "Premium skincare and makeup for radiant beauty", "$299.99", 4.9),
        ("Designer Handbag Selection", "Exclusive bags from world-renowned fashion houses", "$999.99", 4.8),
        ("Jewelry & Accessories Edit", "Timeless pieces to elevate every outfit", "$499.99", 4.7),
    ]),
];

const MOOD_ADS: &[(&str, &[AdSpec])] = &[
    ("Happy", &[
        ("Party Planning Bundle", "Everything you need for your next celebration", "$199.99", 4.7),
        ("Adventure Gear Set", "Premium outdoor equipment for your next expedition", "$399.99", 4.8),
        ("Entertainment Package Plus", "Stream, game, and enjoy with our premium entertainment system", "$599.99", 4.6),
    ]),
    ("Neutral", &[
        ("Home Essentials Collection", "Quality basics for everyday living", "$249.99", 4.5),
        ("Smart Kitchen Appliances", "Efficient cooking with innovative technology", "$699.99", 4.7),
        ("Casual Dining Experience", "Discover local restaurants with exclusive offers", "$99.99", 4.6),
    ]),
    ("Sad", &[
        ("Wellness Retreat Package", "Rejuvenating spa experiences for mind and body", "$399.99", 4.9),
        ("Comfort Food Delivery", "Gourmet comfort meals delivered to your door", "$79.99", 4.7),
        ("Self-Care Collection", "Premium products for relaxation and wellness", "$199.99", 4.8),
    ]),
];

const STYLE_ADS: &[(&str, &[AdSpec])] = &[
    ("Sporty", &[
        ("Pro Athletic Wear", "High-performance gear for serious athletes", "$199.99", 4.8),
        ("Premium Running Shoes", "Advanced cushioning and support for every run", "$179.99", 4.7),
        ("Sports Tech Bundle", "Track and improve your performance with smart devices", "$299.99", 4.6),
    ]),
    ("Casual", &[
        ("Essential Comfort Collection", "Effortless style for everyday wear", "$149.99", 4.5),
        ("Lifestyle Sneaker Edit", "Trendy and comfortable footwear for any occasion", "$129.99", 4.6),
        ("Casual Basics Bundle", "Build your perfect everyday wardrobe", "$199.99", 4.7),
    ]),
    ("Formal", &[
        ("Luxury Suit Collection", "Bespoke tailoring with premium fabrics", "$999.99", 4.9),
        ("Executive Accessories", "Fine watches and leather goods for professionals", "$499.99", 4.8),
        ("Premium Business Wear", "Sophisticated attire for the modern executive", "$799.99", 4.7),
    ]),
    ("Vintage", &[
        ("Classic Collection Pieces", "Timeless fashion with a modern twist", "$299.99", 4.7),
        ("Retro-Inspired Accessories", "Vintage-style pieces for unique charm", "$199.99", 4.6),
        ("Heritage Fashion Edit", "Contemporary takes on classic designs", "$399.99", 4.8),
    ]),
];

fn raw_catalog(category: Category) -> &'static [(&'static str, &'static [AdSpec])] {
    match category {
        Category::Age => AGE_ADS,
        Category::Gender => GENDER_ADS,
        Category::Mood => MOOD_ADS,
        Category::Style => STYLE_ADS,
    }
}

fn fallback_description(category: Category) -> &'static str {
    match category {
        Category::Age => "Personalized recommendations for you",
        Category::Gender => "Curated selections for you",
        Category::Mood => "Special picks for your mood",
        Category::Style => "Trending items for your style",
    }
}

/// Label -> candidate ads for one category, plus that category's default ad
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: HashMap<String, Vec<Advertisement>>,
    fallback: Vec<Advertisement>,
}

impl Catalog {
    pub fn new(category: Category, image_url: &str) -> Self {
        let entries: HashMap<String, Vec<Advertisement>> = raw_catalog(category)
            .iter()
            .map(|(label, ads)| {
                let ads: Vec<Advertisement> = ads
                    .iter()
                    .map(|(title, description, price, rating)| {
                        Advertisement::new(title, description, price, *rating, image_url)
                    })
                    .collect();
                (label.to_string(), ads)
            })
            .collect();

        let fallback = vec![Advertisement::new(
            &format!("Default {} Ad", category.display_name()),
            fallback_description(category),
            "$0.00",
            5.0,
            image_url,
        )];

        Self { entries, fallback }
    }

    /// Exact-match lookup
    pub fn get(&self, label: &str) -> Option<&[Advertisement]> {
        self.entries.get(label).map(Vec::as_slice)
    }

    /// Lookup with the single-ad default list for unknown labels (including "N/A")
    pub fn candidates(&self, label: &str) -> &[Advertisement] {
        self.get(label).unwrap_or(self.fallback.as_slice())
    }

    pub fn fallback_ad(&self) -> &Advertisement {
        &self.fallback[0]
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
