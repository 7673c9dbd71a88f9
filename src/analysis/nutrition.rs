use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

/// Reference nutrition data for one food keyword.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFact {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub serving_size: String,
    pub nutritional_info: String,
    pub health_benefits: Vec<String>,
    #[serde(default)]
    pub disadvantages: Vec<String>,
    pub recommendations: String,
}

/// Ordered, read-only keyword table. Lookup order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct NutritionTable {
    entries: Vec<(String, NutritionFact)>,
}

impl NutritionTable {
    pub fn new(entries: Vec<(String, NutritionFact)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, f)| (k.trim().to_lowercase(), f))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
        }
    }

    /// Reads a JSON array of `{ "key": .., <fact fields> }` objects.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read nutrition table {}", path.display()))?;
        let table = Self::from_json_str(&raw)
            .with_context(|| format!("parse nutrition table {}", path.display()))?;
        info!(path = %path.display(), entries = table.len(), "nutrition table loaded");
        Ok(table)
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let objects: Vec<Map<String, Value>> = serde_json::from_str(raw)?;
        let mut entries = Vec::with_capacity(objects.len());
        for (i, mut obj) in objects.into_iter().enumerate() {
            let key = match obj.remove("key") {
                Some(Value::String(k)) => k,
                _ => anyhow::bail!("entry {i} has no string key"),
            };
            let fact: NutritionFact = serde_json::from_value(Value::Object(obj))
                .with_context(|| format!("entry {i} ({key})"))?;
            entries.push((key, fact));
        }
        Ok(Self::new(entries))
    }

    /// First key that occurs inside the lowercased name wins.
    pub fn lookup(&self, food_name: &str) -> Option<(&str, &NutritionFact)> {
        let name = food_name.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| name.contains(key.as_str()))
            .map(|(key, fact)| (key.as_str(), fact))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn builtin() -> Self {
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self::new(vec![
            (
                "apple".into(),
                NutritionFact {
                    calories: 95.0,
                    protein: 0.5,
                    carbs: 25.0,
                    fat: 0.3,
                    serving_size: "1 medium apple (182g)".into(),
                    nutritional_info: "Rich in fiber, vitamin C, and various antioxidants. Contains natural sugars and pectin.".into(),
                    health_benefits: strings(&[
                        "Supports heart health",
                        "May lower risk of type 2 diabetes",
                        "Promotes good gut bacteria",
                        "Contains powerful antioxidants",
                    ]),
                    disadvantages: strings(&["Natural sugars add up when juiced"]),
                    recommendations: "Best eaten fresh with skin on. Can be included in breakfast or as a healthy snack.".into(),
                },
            ),
            (
                "banana".into(),
                NutritionFact {
                    calories: 105.0,
                    protein: 1.3,
                    carbs: 27.0,
                    fat: 0.4,
                    serving_size: "1 medium banana (118g)".into(),
                    nutritional_info: "Excellent source of vitamin B6, potassium, and fiber. Natural energy booster.".into(),
                    health_benefits: strings(&[
                        "Supports digestive health",
                        "Good for heart health",
                        "Provides sustained energy",
                        "Helps in muscle recovery",
                    ]),
                    disadvantages: strings(&["Higher in sugar as it ripens"]),
                    recommendations: "Perfect pre or post-workout snack. Ripe bananas are easier to digest.".into(),
                },
            ),
            (
                "rice".into(),
                NutritionFact {
                    calories: 130.0,
                    protein: 2.7,
                    carbs: 28.0,
                    fat: 0.3,
                    serving_size: "1 cup cooked (158g)".into(),
                    nutritional_info: "Primary source of complex carbohydrates. Contains essential minerals and B vitamins.".into(),
                    health_benefits: strings(&[
                        "Provides sustained energy",
                        "Gluten-free grain option",
                        "Easy to digest",
                        "Versatile ingredient",
                    ]),
                    disadvantages: strings(&["White rice has a high glycemic index"]),
                    recommendations: "Choose brown rice for more fiber and nutrients. Portion control is important for weight management.".into(),
                },
            ),
            (
                "chicken".into(),
                NutritionFact {
                    calories: 165.0,
                    protein: 31.0,
                    carbs: 0.0,
                    fat: 3.6,
                    serving_size: "100g (3.5 oz)".into(),
                    nutritional_info: "High-quality protein source, rich in essential amino acids. Contains B vitamins and minerals.".into(),
                    health_benefits: strings(&[
                        "Supports muscle growth and repair",
                        "Helps maintain healthy bones",
                        "Good for weight management",
                        "Rich in essential nutrients",
                    ]),
                    disadvantages: strings(&["Fried or skin-on preparations add saturated fat"]),
                    recommendations: "Best grilled or baked. Remove skin to reduce fat content. Pair with vegetables for a balanced meal.".into(),
                },
            ),
            (
                "salad".into(),
                NutritionFact {
                    calories: 100.0,
                    protein: 2.0,
                    carbs: 12.0,
                    fat: 7.0,
                    serving_size: "2 cups (100g)".into(),
                    nutritional_info: "Mix of fresh vegetables providing various vitamins, minerals, and fiber. Healthy fats from dressing.".into(),
                    health_benefits: strings(&[
                        "Rich in antioxidants",
                        "Supports digestive health",
                        "Helps with hydration",
                        "Low in calories, high in nutrients",
                    ]),
                    disadvantages: strings(&["Creamy dressings can double the calories"]),
                    recommendations: "Use light dressing to keep calories in check. Add protein for a complete meal.".into(),
                },
            ),
        ])
    }
}
