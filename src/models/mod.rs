pub mod blob;
pub mod ingredient;
pub mod nutrition;
pub mod recipe;
pub mod user;

pub use blob::{BlobRecord, UploadedImage};
pub use ingredient::{Ingredient, IngredientRecord, NewIngredient};
pub use nutrition::RecipeNutrition;
pub use recipe::{
    NewRecipe, NewRecipeIngredient, Recipe, RecipeDetail, RecipeIngredient,
    RecipeIngredientRecord, RecipeRecord, RecipeStep,
};
pub use user::{Credentials, Principal, Session, UserRecord};
