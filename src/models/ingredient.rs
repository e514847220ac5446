use serde::{Deserialize, Serialize};

use crate::constants::{
    ERR_CALORIES_POSITIVE, ERR_NAME_REQUIRED, KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT,
    KCAL_PER_GRAM_PROTEIN, MAX_NUTRIENT_VALUE,
};
use crate::error::{AppError, Result};

/// Ingredient record stored in redb
/// Nutrient values are per 100g
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientRecord {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    /// Blob storage id of the ingredient photo
    pub image: Option<String>,
    pub created_by: String,
    /// Creation time (Unix milliseconds)
    pub created_at: i64,
}

impl IngredientRecord {
    /// Atwater estimate for this ingredient's macros
    pub fn calories_from_macros(&self) -> i64 {
        calories_from_macros(self.protein, self.carbs, self.fat)
    }
}

/// Ingredient model for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: u64,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub image: Option<String>,
    /// Fetchable URL for `image`, absent when no image is attached
    pub image_url: Option<String>,
    /// Display-only cross-check against `calories`
    pub calories_from_macros: i64,
    pub created_by: String,
    pub created_at: i64,
}

impl Ingredient {
    pub fn from_record(id: u64, record: IngredientRecord, image_url: Option<String>) -> Self {
        let calories_from_macros = record.calories_from_macros();
        Self {
            id,
            name: record.name,
            calories: record.calories,
            protein: record.protein,
            carbs: record.carbs,
            fat: record.fat,
            fiber: record.fiber,
            image: record.image,
            image_url,
            calories_from_macros,
            created_by: record.created_by,
            created_at: record.created_at,
        }
    }
}

/// Request body for creating an ingredient
#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewIngredient {
    /// Validate the submitted values and build the record to store
    ///
    /// The name is stored trimmed and a missing fiber value becomes 0.
    pub fn into_record(self, owner: &str, now: i64) -> Result<IngredientRecord> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationFailed(ERR_NAME_REQUIRED.to_string()));
        }

        if !self.calories.is_finite() || self.calories <= 0.0 {
            return Err(AppError::ValidationFailed(
                ERR_CALORIES_POSITIVE.to_string(),
            ));
        }
        if self.calories > MAX_NUTRIENT_VALUE {
            return Err(AppError::ValidationFailed(format!(
                "calories must not exceed {}",
                MAX_NUTRIENT_VALUE
            )));
        }

        Ok(IngredientRecord {
            name: name.to_string(),
            calories: self.calories,
            protein: non_negative("protein", self.protein)?,
            carbs: non_negative("carbs", self.carbs)?,
            fat: non_negative("fat", self.fat)?,
            fiber: non_negative("fiber", self.fiber.unwrap_or(0.0))?,
            image: self.image.filter(|image| !image.trim().is_empty()),
            created_by: owner.to_string(),
            created_at: now,
        })
    }
}

fn non_negative(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::ValidationFailed(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    if value > MAX_NUTRIENT_VALUE {
        return Err(AppError::ValidationFailed(format!(
            "{} must not exceed {}",
            field, MAX_NUTRIENT_VALUE
        )));
    }
    Ok(value)
}

/// Atwater estimate of calories from macro grams (4/4/9 kcal per gram)
pub fn calories_from_macros(protein: f64, carbs: f64, fat: f64) -> i64 {
    (protein * KCAL_PER_GRAM_PROTEIN + carbs * KCAL_PER_GRAM_CARBS + fat * KCAL_PER_GRAM_FAT)
        .round() as i64
}
