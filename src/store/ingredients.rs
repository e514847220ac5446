use chrono::Utc;
use redb::ReadableDatabase;

use super::{SEQ_INGREDIENTS, Store};
use crate::blobs;
use crate::db::{self, tables};
use crate::error::Result;
use crate::models::{Ingredient, IngredientRecord, NewIngredient, Principal};

impl Store {
    /// Insert a new ingredient owned by `principal`
    pub async fn create_ingredient(
        &self,
        principal: &Principal,
        input: NewIngredient,
    ) -> Result<u64> {
        let record = input.into_record(&principal.user_id, Utc::now().timestamp_millis())?;

        let db = self.db.clone();
        let id = tokio::task::spawn_blocking(move || -> Result<u64> {
            let write_txn = db.begin_write()?;
            let id = {
                let blob_table = write_txn.open_table(tables::BLOBS)?;
                blobs::ensure_exists(&blob_table, record.image.as_deref())?;
                drop(blob_table);

                let id = db::next_id(&write_txn, SEQ_INGREDIENTS)?;

                let mut ingredients = write_txn.open_table(tables::INGREDIENTS)?;
                ingredients.insert(id, db::encode(&record)?.as_slice())?;

                let mut by_user = write_txn.open_multimap_table(tables::INGREDIENTS_BY_USER)?;
                by_user.insert(record.created_by.as_str(), id)?;

                let mut by_name = write_txn.open_multimap_table(tables::INGREDIENTS_BY_NAME)?;
                by_name.insert(record.name.as_str(), id)?;

                id
            };
            write_txn.commit()?;
            Ok(id)
        })
        .await??;

        tracing::info!("Ingredient {} created for user {}", id, principal.user_id);

        Ok(id)
    }

    /// The caller's ingredients in insertion order, with image URLs resolved
    pub async fn list_ingredients(&self, principal: &Principal) -> Result<Vec<Ingredient>> {
        let db = self.db.clone();
        let urls = self.urls.clone();
        let user_id = principal.user_id.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<Ingredient>> {
            let read_txn = db.begin_read()?;
            let by_user = read_txn.open_multimap_table(tables::INGREDIENTS_BY_USER)?;
            let ingredients = read_txn.open_table(tables::INGREDIENTS)?;
            let blob_table = read_txn.open_table(tables::BLOBS)?;

            let mut result = Vec::new();
            for id in by_user.get(user_id.as_str())? {
                let id = id?.value();
                let Some(bytes) = ingredients.get(id)? else {
                    tracing::warn!("Ingredient index points at missing record {}", id);
                    continue;
                };
                let record: IngredientRecord = db::decode(bytes.value())?;
                let image_url = urls.resolve(&blob_table, record.image.as_deref())?;
                result.push(Ingredient::from_record(id, record, image_url));
            }

            Ok(result)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use crate::store::test_support::*;
    use crate::error::AppError;
    use crate::models::Principal;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_then_list() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");

        let mut input = new_ingredient("  Lentils ", 116.0);
        input.fiber = None;
        let id = store.create_ingredient(&cook, input).await.unwrap();

        let listed = store.list_ingredients(&cook).await.unwrap();
        assert_eq!(listed.len(), 1);

        let lentils = &listed[0];
        assert_eq!(lentils.id, id);
        assert_eq!(lentils.name, "Lentils");
        assert_eq!(lentils.calories, 116.0);
        assert_eq!(lentils.fiber, 0.0);
        assert_eq!(lentils.created_by, "cook");
        assert_eq!(lentils.calories_from_macros, 165);
        assert!(lentils.image_url.is_none());
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_and_in_insertion_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");
        let baker = Principal::new("baker");

        add_ingredient(&store, &cook, "Rice").await;
        add_ingredient(&store, &baker, "Flour").await;
        add_ingredient(&store, &cook, "Beans").await;

        let names: Vec<_> = store
            .list_ingredients(&cook)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Rice", "Beans"]);

        let baker_items = store.list_ingredients(&baker).await.unwrap();
        assert_eq!(baker_items.len(), 1);
        assert!(baker_items.iter().all(|i| i.created_by == "baker"));
    }

    #[tokio::test]
    async fn test_negative_calories_rejected_and_nothing_stored() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");

        let result = store
            .create_ingredient(&cook, new_ingredient("Mystery", -5.0))
            .await;

        assert!(matches!(result, Err(AppError::ValidationFailed(_))));
        assert!(store.list_ingredients(&cook).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_image_reference_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let cook = Principal::new("cook");

        let mut input = new_ingredient("Kale", 49.0);
        input.image = Some("f".repeat(64));

        assert!(matches!(
            store.create_ingredient(&cook, input).await,
            Err(AppError::ValidationFailed(_))
        ));
    }
}
