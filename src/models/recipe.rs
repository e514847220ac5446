use serde::{Deserialize, Serialize};

use crate::constants::{ERR_TITLE_REQUIRED, MAX_LINE_AMOUNT};
use crate::error::{AppError, Result};
use crate::models::nutrition::RecipeNutrition;

/// Recipe record stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_by: String,
    /// Creation time (Unix milliseconds)
    pub created_at: i64,
}

/// Junction record linking a recipe to one of its ingredients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientRecord {
    pub recipe_id: u64,
    pub ingredient_id: u64,
    pub amount: f64,
    pub unit: String,
}

/// Recipe model for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub created_by: String,
    pub created_at: i64,
}

impl Recipe {
    pub fn from_record(id: u64, record: RecipeRecord, image_url: Option<String>) -> Self {
        Self {
            id,
            title: record.title,
            description: record.description,
            image: record.image,
            image_url,
            created_by: record.created_by,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub id: u64,
    pub recipe_id: u64,
    pub ingredient_id: u64,
    pub amount: f64,
    pub unit: String,
    /// Name of the linked ingredient, if it still exists
    pub ingredient_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStep {
    pub recipe_id: u64,
    pub step_number: u32,
    pub instruction: String,
}

/// Recipe with its ingredient links, ordered steps and nutrition summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
    pub nutrition: RecipeNutrition,
}

/// One ingredient line of a recipe creation request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipeIngredient {
    pub ingredient_id: u64,
    pub amount: f64,
    pub unit: String,
}

/// Request body for creating a recipe
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<NewRecipeIngredient>,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl NewRecipe {
    /// Check everything that can be checked without touching the database
    ///
    /// Ingredient existence and ownership are verified inside the write transaction.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::ValidationFailed(ERR_TITLE_REQUIRED.to_string()));
        }

        for (index, line) in self.ingredients.iter().enumerate() {
            if !line.amount.is_finite() || line.amount <= 0.0 {
                return Err(AppError::ValidationFailed(format!(
                    "Ingredient line {} must have a positive amount",
                    index + 1
                )));
            }
            if line.amount > MAX_LINE_AMOUNT {
                return Err(AppError::ValidationFailed(format!(
                    "Ingredient line {} amount must not exceed {}",
                    index + 1,
                    MAX_LINE_AMOUNT
                )));
            }
            if line.unit.trim().is_empty() {
                return Err(AppError::ValidationFailed(format!(
                    "Ingredient line {} must have a unit",
                    index + 1
                )));
            }
        }

        if let Some(position) = self.steps.iter().position(|s| s.trim().is_empty()) {
            return Err(AppError::ValidationFailed(format!(
                "Step {} must not be empty",
                position + 1
            )));
        }

        Ok(())
    }

    /// Build the recipe record. Call after `validate`
    pub fn to_record(&self, owner: &str, now: i64) -> RecipeRecord {
        RecipeRecord {
            title: self.title.trim().to_string(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            image: self.image.clone().filter(|image| !image.trim().is_empty()),
            created_by: owner.to_string(),
            created_at: now,
        }
    }

    /// Steps paired with their 1-based step numbers, in submission order
    pub fn numbered_steps(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        (1u32..).zip(self.steps.iter().map(|s| s.trim()))
    }
}
