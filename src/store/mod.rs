//! Recipe/ingredient store
//!
//! Every operation runs one redb transaction on the blocking pool. Compound
//! writes (a recipe with its links and steps, or its cascade delete) share a
//! single write transaction, so readers see all of it or none of it.

pub mod ingredients;
pub mod recipes;
pub mod users;

use crate::blobs::ImageUrls;
use crate::db::Db;

const SEQ_INGREDIENTS: &str = "ingredients";
const SEQ_RECIPES: &str = "recipes";
const SEQ_RECIPE_INGREDIENTS: &str = "recipe_ingredients";

/// Handle to the record store, cheap to clone into handlers
#[derive(Clone)]
pub struct Store {
    db: Db,
    urls: ImageUrls,
    user_id_pepper: String,
}

impl Store {
    pub fn new(db: Db, urls: ImageUrls, user_id_pepper: impl Into<String>) -> Self {
        Self {
            db,
            urls,
            user_id_pepper: user_id_pepper.into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::open_database;
    use crate::models::{NewIngredient, Principal};
    use tempfile::TempDir;

    pub fn test_store(temp_dir: &TempDir) -> Store {
        let db = open_database(temp_dir.path().join("store.db")).unwrap();
        Store::new(db, ImageUrls::new("http://localhost:8080"), "test-pepper")
    }

    pub fn new_ingredient(name: &str, calories: f64) -> NewIngredient {
        NewIngredient {
            name: name.to_string(),
            calories,
            protein: 10.0,
            carbs: 20.0,
            fat: 5.0,
            fiber: None,
            image: None,
        }
    }

    pub async fn add_ingredient(store: &Store, owner: &Principal, name: &str) -> u64 {
        store
            .create_ingredient(owner, new_ingredient(name, 150.0))
            .await
            .unwrap()
    }
}
