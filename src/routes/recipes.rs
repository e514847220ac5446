use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;

use super::CreatedResponse;
use crate::AppState;
use crate::error::{AppError, Result};
use crate::models::{NewRecipe, Principal, Recipe, RecipeDetail};

#[derive(Debug, Serialize)]
pub struct DeleteRecipeResponse {
    pub success: bool,
}

/// Create a recipe with its ingredient lines and steps
///
/// Every referenced ingredient must exist and belong to the caller. Nothing is
/// stored unless the whole recipe is.
pub async fn create_recipe(
    State(state): State<AppState>,
    principal: Principal,
    payload: std::result::Result<Json<NewRecipe>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let Json(input) = payload?;

    let id = state.store.create_recipe(&principal, input).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// List the caller's recipes
pub async fn list_user_recipes(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<Recipe>>> {
    Ok(Json(state.store.list_user_recipes(&principal).await?))
}

/// Fetch a recipe with its ingredients, steps and nutrition summary
pub async fn get_recipe(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<RecipeDetail>> {
    let id = parse_recipe_id(&id)?;

    Ok(Json(state.store.get_recipe(&principal, id).await?))
}

/// Delete a recipe along with its ingredient lines and steps
///
/// The ingredients themselves are left alone.
pub async fn delete_recipe(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<DeleteRecipeResponse>> {
    let id = parse_recipe_id(&id)?;

    state.store.delete_recipe(&principal, id).await?;

    Ok(Json(DeleteRecipeResponse { success: true }))
}

// A malformed id can't name any recipe
fn parse_recipe_id(raw: &str) -> Result<u64> {
    raw.parse().map_err(|_| AppError::NotFound("Recipe"))
}
