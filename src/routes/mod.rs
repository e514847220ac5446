pub mod auth;
pub mod health;
pub mod images;
pub mod ingredients;
pub mod recipes;

use serde::Serialize;

pub use auth::{sign_in, sign_up};
pub use health::health_check;
pub use images::{get_image, upload_image};
pub use ingredients::{create_ingredient, list_ingredients};
pub use recipes::{create_recipe, delete_recipe, get_recipe, list_user_recipes};

/// Response for endpoints that create a record
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: u64,
}
