use chrono::Utc;
use redb::{ReadableDatabase, ReadableMultimapTable, ReadableTable};

use super::{SEQ_RECIPE_INGREDIENTS, SEQ_RECIPES, Store};
use crate::blobs;
use crate::db::{self, tables};
use crate::error::{AppError, Result};
use crate::models::{
    IngredientRecord, NewRecipe, Principal, Recipe, RecipeDetail, RecipeIngredient,
    RecipeIngredientRecord, RecipeNutrition, RecipeRecord, RecipeStep,
};

impl Store {
    /// Create a recipe together with its ingredient links and numbered steps
    ///
    /// Everything is written in one transaction. Any invalid line (unknown
    /// ingredient, or one owned by someone else) aborts the whole recipe.
    pub async fn create_recipe(&self, principal: &Principal, input: NewRecipe) -> Result<u64> {
        input.validate()?;
        let record = input.to_record(&principal.user_id, Utc::now().timestamp_millis());
        let line_count = input.ingredients.len();
        let step_count = input.steps.len();

        let db = self.db.clone();
        let recipe_id = tokio::task::spawn_blocking(move || -> Result<u64> {
            let write_txn = db.begin_write()?;
            let recipe_id = {
                let blob_table = write_txn.open_table(tables::BLOBS)?;
                blobs::ensure_exists(&blob_table, record.image.as_deref())?;
                drop(blob_table);

                // 1. Every line must reference one of the caller's ingredients
                let ingredients = write_txn.open_table(tables::INGREDIENTS)?;
                for line in &input.ingredients {
                    let owned = match ingredients.get(line.ingredient_id)? {
                        Some(bytes) => {
                            let ingredient: IngredientRecord = db::decode(bytes.value())?;
                            ingredient.created_by == record.created_by
                        }
                        None => false,
                    };
                    if !owned {
                        tracing::warn!(
                            "Recipe references unknown ingredient {} (user {})",
                            line.ingredient_id,
                            record.created_by
                        );
                        return Err(AppError::ValidationFailed(format!(
                            "Ingredient {} does not exist",
                            line.ingredient_id
                        )));
                    }
                }
                drop(ingredients);

                // 2. Recipe record and its indexes
                let recipe_id = db::next_id(&write_txn, SEQ_RECIPES)?;
                let mut recipes = write_txn.open_table(tables::RECIPES)?;
                recipes.insert(recipe_id, db::encode(&record)?.as_slice())?;

                let mut by_user = write_txn.open_multimap_table(tables::RECIPES_BY_USER)?;
                by_user.insert(record.created_by.as_str(), recipe_id)?;

                let mut by_title = write_txn.open_multimap_table(tables::RECIPES_BY_TITLE)?;
                by_title.insert(record.title.as_str(), recipe_id)?;

                // 3. Ingredient links
                let mut links = write_txn.open_table(tables::RECIPE_INGREDIENTS)?;
                let mut links_by_recipe =
                    write_txn.open_multimap_table(tables::RECIPE_INGREDIENTS_BY_RECIPE)?;
                let mut links_by_ingredient =
                    write_txn.open_multimap_table(tables::RECIPE_INGREDIENTS_BY_INGREDIENT)?;
                for line in &input.ingredients {
                    let link_id = db::next_id(&write_txn, SEQ_RECIPE_INGREDIENTS)?;
                    let link = RecipeIngredientRecord {
                        recipe_id,
                        ingredient_id: line.ingredient_id,
                        amount: line.amount,
                        unit: line.unit.trim().to_string(),
                    };
                    links.insert(link_id, db::encode(&link)?.as_slice())?;
                    links_by_recipe.insert(recipe_id, link_id)?;
                    links_by_ingredient.insert(line.ingredient_id, link_id)?;
                }

                // 4. Steps, numbered 1..N in submission order
                let mut steps = write_txn.open_table(tables::RECIPE_STEPS)?;
                for (step_number, instruction) in input.numbered_steps() {
                    steps.insert((recipe_id, step_number), instruction)?;
                }

                recipe_id
            };
            write_txn.commit()?;
            Ok(recipe_id)
        })
        .await??;

        tracing::info!(
            "Recipe {} created for user {}: {} ingredients, {} steps",
            recipe_id,
            principal.user_id,
            line_count,
            step_count
        );

        Ok(recipe_id)
    }

    /// A recipe with its links, ordered steps and nutrition summary
    ///
    /// Recipes are private to their owner: someone else's recipe reads as missing.
    pub async fn get_recipe(
        &self,
        principal: &Principal,
        recipe_id: u64,
    ) -> Result<RecipeDetail> {
        let db = self.db.clone();
        let urls = self.urls.clone();
        let user_id = principal.user_id.clone();

        tokio::task::spawn_blocking(move || -> Result<RecipeDetail> {
            let read_txn = db.begin_read()?;
            let recipes = read_txn.open_table(tables::RECIPES)?;

            let record: RecipeRecord = recipes
                .get(recipe_id)?
                .map(|b| db::decode(b.value()))
                .transpose()?
                .ok_or(AppError::NotFound("Recipe"))?;

            if record.created_by != user_id {
                tracing::warn!(
                    "User {} requested recipe {} owned by another user",
                    user_id,
                    recipe_id
                );
                return Err(AppError::NotFound("Recipe"));
            }

            let blob_table = read_txn.open_table(tables::BLOBS)?;
            let image_url = urls.resolve(&blob_table, record.image.as_deref())?;

            // Links, with the ingredient each one points at
            let links_by_recipe =
                read_txn.open_multimap_table(tables::RECIPE_INGREDIENTS_BY_RECIPE)?;
            let links = read_txn.open_table(tables::RECIPE_INGREDIENTS)?;
            let ingredients = read_txn.open_table(tables::INGREDIENTS)?;

            let mut lines: Vec<(u64, RecipeIngredientRecord, Option<IngredientRecord>)> =
                Vec::new();
            for link_id in links_by_recipe.get(recipe_id)? {
                let link_id = link_id?.value();
                let Some(bytes) = links.get(link_id)? else {
                    continue;
                };
                let link: RecipeIngredientRecord = db::decode(bytes.value())?;
                let ingredient = ingredients
                    .get(link.ingredient_id)?
                    .map(|b| db::decode::<IngredientRecord>(b.value()))
                    .transpose()?;
                lines.push((link_id, link, ingredient));
            }

            // Steps come back ordered by the (recipe, step number) key
            let step_table = read_txn.open_table(tables::RECIPE_STEPS)?;
            let mut steps = Vec::new();
            for entry in step_table.range((recipe_id, 0u32)..=(recipe_id, u32::MAX))? {
                let (key, instruction) = entry?;
                let (_, step_number) = key.value();
                steps.push(RecipeStep {
                    recipe_id,
                    step_number,
                    instruction: instruction.value().to_string(),
                });
            }

            let nutrition = RecipeNutrition::aggregate(lines.iter().map(|(_, link, ingredient)| {
                (link.amount, link.unit.as_str(), ingredient.as_ref())
            }));

            let ingredients = lines
                .into_iter()
                .map(|(id, link, ingredient)| RecipeIngredient {
                    id,
                    recipe_id: link.recipe_id,
                    ingredient_id: link.ingredient_id,
                    amount: link.amount,
                    unit: link.unit,
                    ingredient_name: ingredient.map(|i| i.name),
                })
                .collect();

            Ok(RecipeDetail {
                recipe: Recipe::from_record(recipe_id, record, image_url),
                ingredients,
                steps,
                nutrition,
            })
        })
        .await?
    }

    /// The caller's recipes in insertion order
    pub async fn list_user_recipes(&self, principal: &Principal) -> Result<Vec<Recipe>> {
        let db = self.db.clone();
        let urls = self.urls.clone();
        let user_id = principal.user_id.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<Recipe>> {
            let read_txn = db.begin_read()?;
            let by_user = read_txn.open_multimap_table(tables::RECIPES_BY_USER)?;
            let recipes = read_txn.open_table(tables::RECIPES)?;
            let blob_table = read_txn.open_table(tables::BLOBS)?;

            let mut result = Vec::new();
            for id in by_user.get(user_id.as_str())? {
                let id = id?.value();
                let Some(bytes) = recipes.get(id)? else {
                    tracing::warn!("Recipe index points at missing record {}", id);
                    continue;
                };
                let record: RecipeRecord = db::decode(bytes.value())?;
                let image_url = urls.resolve(&blob_table, record.image.as_deref())?;
                result.push(Recipe::from_record(id, record, image_url));
            }

            Ok(result)
        })
        .await?
    }

    /// Delete one of the caller's recipes with all of its links and steps
    ///
    /// Ingredients are left untouched.
    pub async fn delete_recipe(&self, principal: &Principal, recipe_id: u64) -> Result<()> {
        let db = self.db.clone();
        let user_id = principal.user_id.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let write_txn = db.begin_write()?;
            {
                // 1. Verify the recipe exists and belongs to the caller
                let mut recipes = write_txn.open_table(tables::RECIPES)?;
                let record: RecipeRecord = recipes
                    .get(recipe_id)?
                    .map(|b| db::decode(b.value()))
                    .transpose()?
                    .ok_or(AppError::NotFound("Recipe"))?;

                if record.created_by != user_id {
                    tracing::warn!(
                        "User {} tried to delete recipe {} owned by another user",
                        user_id,
                        recipe_id
                    );
                    return Err(AppError::NotFound("Recipe"));
                }

                // 2. Recipe record and its indexes
                recipes.remove(recipe_id)?;
                drop(recipes);

                let mut by_user = write_txn.open_multimap_table(tables::RECIPES_BY_USER)?;
                by_user.remove(user_id.as_str(), recipe_id)?;
                drop(by_user);

                let mut by_title = write_txn.open_multimap_table(tables::RECIPES_BY_TITLE)?;
                by_title.remove(record.title.as_str(), recipe_id)?;
                drop(by_title);

                // 3. Ingredient links (cascade)
                let mut links_by_recipe =
                    write_txn.open_multimap_table(tables::RECIPE_INGREDIENTS_BY_RECIPE)?;
                let link_ids = links_by_recipe
                    .get(recipe_id)?
                    .map(|id| id.map(|id| id.value()))
                    .collect::<std::result::Result<Vec<u64>, _>>()?;
                links_by_recipe.remove_all(recipe_id)?;
                drop(links_by_recipe);

                let mut links = write_txn.open_table(tables::RECIPE_INGREDIENTS)?;
                let mut links_by_ingredient =
                    write_txn.open_multimap_table(tables::RECIPE_INGREDIENTS_BY_INGREDIENT)?;
                for link_id in &link_ids {
                    let removed = links
                        .remove(*link_id)?
                        .map(|b| db::decode::<RecipeIngredientRecord>(b.value()))
                        .transpose()?;
                    if let Some(link) = removed {
                        links_by_ingredient.remove(link.ingredient_id, *link_id)?;
                    }
                }
                drop(links);
                drop(links_by_ingredient);

                // 4. Steps (cascade)
                let mut steps = write_txn.open_table(tables::RECIPE_STEPS)?;
                let step_numbers = steps
                    .range((recipe_id, 0u32)..=(recipe_id, u32::MAX))?
                    .map(|entry| entry.map(|(key, _)| key.value().1))
                    .collect::<std::result::Result<Vec<u32>, _>>()?;
                for step_number in step_numbers {
                    steps.remove((recipe_id, step_number))?;
                }

                tracing::info!(
                    "Recipe {} deleted for user {}: {} ingredients, cascade complete",
                    recipe_id,
                    user_id,
                    link_ids.len()
                );
            }
            write_txn.commit()?;

            Ok(())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::models::{NewRecipe, NewRecipeIngredient, Principal};
    use crate::store::test_support::*;
    use tempfile::TempDir;

    fn recipe(title: &str, lines: Vec<(u64, f64, &str)>, steps: &[&str]) -> NewRecipe {
        NewRecipe {
            title: title.to_string(),
            description: None,
            image: None,
            ingredients: lines
                .into_iter()
                .map(|(ingredient_id, amount, unit)| NewRecipeIngredient {
                    ingredient_id,
                    amount,
                    unit: unit.to_string(),
                })
                .collect(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");
        let ing1 = add_ingredient(&store, &cook, "Spaghetti").await;

        let id = store
            .create_recipe(&cook, recipe("X", vec![(ing1, 100.0, "g")], &["A", "B"]))
            .await
            .unwrap();
        let detail = store.get_recipe(&cook, id).await.unwrap();

        assert_eq!(detail.recipe.title, "X");
        assert_eq!(detail.steps.len(), 2);
        assert_eq!(detail.steps[0].instruction, "A");
        assert_eq!(detail.steps[1].instruction, "B");
        assert_eq!(detail.ingredients.len(), 1);
        assert_eq!(detail.ingredients[0].ingredient_id, ing1);
        assert_eq!(detail.ingredients[0].amount, 100.0);
        assert_eq!(detail.ingredients[0].unit, "g");
        assert_eq!(
            detail.ingredients[0].ingredient_name.as_deref(),
            Some("Spaghetti")
        );
    }

    #[tokio::test]
    async fn test_steps_are_numbered_in_submission_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");

        let id = store
            .create_recipe(
                &cook,
                recipe("Pasta", vec![], &["Boil water", "Add pasta", "Drain"]),
            )
            .await
            .unwrap();
        let steps = store.get_recipe(&cook, id).await.unwrap().steps;

        let numbered: Vec<_> = steps
            .iter()
            .map(|s| (s.step_number, s.instruction.as_str()))
            .collect();
        assert_eq!(
            numbered,
            vec![(1, "Boil water"), (2, "Add pasta"), (3, "Drain")]
        );
    }

    #[tokio::test]
    async fn test_steps_sort_numerically_past_nine() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");

        let instructions: Vec<String> = (1..=12).map(|n| format!("step {}", n)).collect();
        let refs: Vec<&str> = instructions.iter().map(String::as_str).collect();
        let id = store
            .create_recipe(&cook, recipe("Long", vec![], &refs))
            .await
            .unwrap();

        let numbers: Vec<u32> = store
            .get_recipe(&cook, id)
            .await
            .unwrap()
            .steps
            .iter()
            .map(|s| s.step_number)
            .collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_missing_ingredient_leaves_nothing_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");
        let real = add_ingredient(&store, &cook, "Rice").await;

        let result = store
            .create_recipe(
                &cook,
                recipe(
                    "Broken",
                    vec![(real, 100.0, "g"), (9_999, 1.0, "cup")],
                    &["Cook"],
                ),
            )
            .await;

        assert!(matches!(result, Err(AppError::ValidationFailed(_))));
        assert!(store.list_user_recipes(&cook).await.unwrap().is_empty());

        // The aborted transaction consumed no recipe id, so the next one is 1
        let id = store
            .create_recipe(&cook, recipe("Fixed", vec![(real, 100.0, "g")], &["Cook"]))
            .await
            .unwrap();
        assert_eq!(id, 1);
        let detail = store.get_recipe(&cook, id).await.unwrap();
        assert_eq!(detail.ingredients.len(), 1);
        assert_eq!(detail.steps.len(), 1);
    }

    #[tokio::test]
    async fn test_other_users_ingredient_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");
        let baker = Principal::new("baker");
        let flour = add_ingredient(&store, &baker, "Flour").await;

        let result = store
            .create_recipe(&cook, recipe("Bread", vec![(flour, 500.0, "g")], &[]))
            .await;

        assert!(matches!(result, Err(AppError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_get_recipe_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        assert!(matches!(
            store.get_recipe(&Principal::new("cook"), 42).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_recipe_is_owner_scoped() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");

        let id = store
            .create_recipe(&cook, recipe("Secret sauce", vec![], &["Stir"]))
            .await
            .unwrap();

        assert!(matches!(
            store.get_recipe(&Principal::new("baker"), id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_user_recipes_owner_scoped_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");
        let baker = Principal::new("baker");

        store.create_recipe(&cook, recipe("First", vec![], &[])).await.unwrap();
        store.create_recipe(&baker, recipe("Bread", vec![], &[])).await.unwrap();
        store.create_recipe(&cook, recipe("Second", vec![], &[])).await.unwrap();

        let titles: Vec<_> = store
            .list_user_recipes(&cook)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_nutrition_summary() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");
        // 150 kcal, 10/20/5 per 100g
        let ing = add_ingredient(&store, &cook, "Base").await;

        let id = store
            .create_recipe(
                &cook,
                recipe("Bowl", vec![(ing, 200.0, "g"), (ing, 1.0, "cup")], &[]),
            )
            .await
            .unwrap();
        let nutrition = store.get_recipe(&cook, id).await.unwrap().nutrition;

        assert!((nutrition.calories - 300.0).abs() < 1e-9);
        assert!((nutrition.protein - 20.0).abs() < 1e-9);
        assert_eq!(nutrition.calories_from_macros, 330);
        assert_eq!(nutrition.unconverted_lines, 1);
    }

    #[tokio::test]
    async fn test_delete_recipe_cascades() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");
        let ing = add_ingredient(&store, &cook, "Rice").await;

        let doomed = store
            .create_recipe(&cook, recipe("Doomed", vec![(ing, 50.0, "g")], &["A", "B"]))
            .await
            .unwrap();
        let kept = store
            .create_recipe(&cook, recipe("Kept", vec![(ing, 75.0, "g")], &["C"]))
            .await
            .unwrap();

        store.delete_recipe(&cook, doomed).await.unwrap();

        assert!(matches!(
            store.get_recipe(&cook, doomed).await,
            Err(AppError::NotFound(_))
        ));
        let remaining = store.list_user_recipes(&cook).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept);

        let kept_detail = store.get_recipe(&cook, kept).await.unwrap();
        assert_eq!(kept_detail.ingredients.len(), 1);
        assert_eq!(kept_detail.steps.len(), 1);

        assert_eq!(store.list_ingredients(&cook).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_recipe_requires_owner() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");

        let id = store
            .create_recipe(&cook, recipe("Mine", vec![], &["Eat"]))
            .await
            .unwrap();

        assert!(matches!(
            store.delete_recipe(&Principal::new("baker"), id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(store.get_recipe(&cook, id).await.is_ok());
    }
}
