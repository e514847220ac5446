use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};

use super::CreatedResponse;
use crate::AppState;
use crate::error::Result;
use crate::models::{Ingredient, NewIngredient, Principal};

/// Add an ingredient to the caller's pantry
///
/// Nutrient values are per 100g. Calories must be positive; protein, carbs
/// and fat non-negative; fiber defaults to 0.
pub async fn create_ingredient(
    State(state): State<AppState>,
    principal: Principal,
    payload: std::result::Result<Json<NewIngredient>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let Json(input) = payload?;

    let id = state.store.create_ingredient(&principal, input).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// List the caller's ingredients
pub async fn list_ingredients(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<Ingredient>>> {
    Ok(Json(state.store.list_ingredients(&principal).await?))
}
