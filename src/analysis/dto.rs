use serde::{Deserialize, Serialize};
use std::fmt;

/// One recognized food entry. Only `name` and `calories` are guaranteed;
/// the rest is layered on from the nutrition table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub name: String,
    pub calories: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>, // grams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>, // grams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>, // grams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_benefits: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disadvantages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
}

impl FoodItem {
    pub fn minimal(name: impl Into<String>, calories: f64) -> Self {
        Self {
            name: name.into(),
            calories,
            ..Default::default()
        }
    }
}

/// Time-of-day label attached to a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
    #[serde(rename = "Late Night Meal")]
    LateNight,
}

impl MealType {
    pub fn label(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Snack => "Snack",
            MealType::Dinner => "Dinner",
            MealType::LateNight => "Late Night Meal",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final result of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub foods: Vec<FoodItem>,
    pub total_calories: f64,
    pub meal_type: MealType,
    pub health_score: u8,
}

impl AnalysisResult {
    /// Valid parse with nothing recognized; the caller should ask for another photo.
    pub fn no_foods_detected(&self) -> bool {
        self.foods.is_empty()
    }
}

/// Body of `POST /analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub image_b64: String,
}
