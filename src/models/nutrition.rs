//! Recipe nutrition aggregation
//!
//! Ingredient values are stored per 100g, so only lines whose unit converts to a
//! mass can contribute. Volume, count and free-text units are counted but skipped.

use serde::{Deserialize, Serialize};

use crate::constants::NUTRIENT_BASIS_GRAMS;
use crate::models::ingredient::{IngredientRecord, calories_from_macros};

const GRAMS_PER_OUNCE: f64 = 28.35;
const GRAMS_PER_POUND: f64 = 453.6;

/// Convert an amount in `unit` to grams, if `unit` is a mass unit
pub fn to_grams(amount: f64, unit: &str) -> Option<f64> {
    let factor = match unit.trim().to_ascii_lowercase().as_str() {
        "g" | "gram" | "grams" => 1.0,
        "kg" | "kilogram" | "kilograms" => 1000.0,
        "mg" | "milligram" | "milligrams" => 0.001,
        "oz" | "ounce" | "ounces" => GRAMS_PER_OUNCE,
        "lb" | "lbs" | "pound" | "pounds" => GRAMS_PER_POUND,
        _ => return None,
    };
    Some(amount * factor)
}

/// Aggregated nutrition of a recipe (display only, never persisted)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeNutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub calories_from_macros: i64,
    /// Lines excluded from the totals (non-mass unit or missing ingredient)
    pub unconverted_lines: u32,
}

impl RecipeNutrition {
    /// Sum the contribution of every line
    ///
    /// `None` for an ingredient means the link points at a record that no longer exists.
    pub fn aggregate<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (f64, &'a str, Option<&'a IngredientRecord>)>,
    {
        let mut totals = Self::default();

        for (amount, unit, ingredient) in lines {
            match (to_grams(amount, unit), ingredient) {
                (Some(grams), Some(ingredient)) => {
                    let scale = grams / NUTRIENT_BASIS_GRAMS;
                    totals.calories += ingredient.calories * scale;
                    totals.protein += ingredient.protein * scale;
                    totals.carbs += ingredient.carbs * scale;
                    totals.fat += ingredient.fat * scale;
                    totals.fiber += ingredient.fiber * scale;
                }
                _ => totals.unconverted_lines += 1,
            }
        }

        totals.calories_from_macros =
            calories_from_macros(totals.protein, totals.carbs, totals.fat);
        totals
    }
}
