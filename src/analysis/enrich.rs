use tracing::debug;

use super::dto::{AnalysisResult, FoodItem, MealType};
use super::nutrition::NutritionTable;

pub const BASE_HEALTH_SCORE: i32 = 70;
const HIGH_CALORIE_MEAL: f64 = 800.0;

impl MealType {
    /// Local hour (0-23) to label, half-open ranges.
    pub fn for_hour(hour: u8) -> Self {
        match hour {
            5..=10 => MealType::Breakfast,
            11..=14 => MealType::Lunch,
            15..=17 => MealType::Snack,
            18..=21 => MealType::Dinner,
            _ => MealType::LateNight,
        }
    }
}

impl AnalysisResult {
    pub fn empty(hour: u8) -> Self {
        Self {
            foods: Vec::new(),
            total_calories: 0.0,
            meal_type: MealType::for_hour(hour),
            health_score: BASE_HEALTH_SCORE as u8,
        }
    }
}

/// Merges table data onto normalized items and derives the aggregate metrics.
#[derive(Debug, Clone)]
pub struct Enricher {
    table: NutritionTable,
}

impl Enricher {
    pub fn new(table: NutritionTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &NutritionTable {
        &self.table
    }

    pub fn enrich_item(&self, item: FoodItem) -> FoodItem {
        let Some((key, fact)) = self.table.lookup(&item.name) else {
            return item;
        };
        debug!(food = %item.name, key, "nutrition match");
        let calories = if item.calories != 0.0 {
            item.calories
        } else {
            fact.calories
        };
        FoodItem {
            name: item.name,
            calories,
            protein: Some(fact.protein),
            carbs: Some(fact.carbs),
            fat: Some(fact.fat),
            serving_size: Some(fact.serving_size.clone()),
            nutritional_info: Some(fact.nutritional_info.clone()),
            health_benefits: Some(fact.health_benefits.clone()),
            disadvantages: (!fact.disadvantages.is_empty()).then(|| fact.disadvantages.clone()),
            recommendations: Some(fact.recommendations.clone()),
        }
    }

    /// Builds the final result; the model's own total is never consulted.
    pub fn finalize(&self, foods: Vec<FoodItem>, hour: u8) -> AnalysisResult {
        if foods.is_empty() {
            return AnalysisResult::empty(hour);
        }
        let foods: Vec<FoodItem> = foods.into_iter().map(|f| self.enrich_item(f)).collect();
        let total_calories = foods.iter().map(|f| f.calories).sum();
        let health_score = health_score(&foods, total_calories);
        AnalysisResult {
            foods,
            total_calories,
            meal_type: MealType::for_hour(hour),
            health_score,
        }
    }
}

/// Base 70, +10 for each threshold any single item meets, -20 above 800 kcal.
///
/// The fat bonus fires when one item is under 15g regardless of the others.
pub fn health_score(foods: &[FoodItem], total_calories: f64) -> u8 {
    let has_protein = foods.iter().any(|f| f.protein.is_some_and(|p| p > 5.0));
    let has_low_fat = foods.iter().any(|f| f.fat.is_some_and(|g| g < 15.0));
    let has_moderate_carbs = foods.iter().any(|f| f.carbs.is_some_and(|c| c < 50.0));

    let mut score = BASE_HEALTH_SCORE;
    for bonus in [has_protein, has_low_fat, has_moderate_carbs] {
        if bonus {
            score += 10;
        }
    }
    if total_calories > HIGH_CALORIE_MEAL {
        score -= 20;
    }
    score.clamp(0, 100) as u8
}
