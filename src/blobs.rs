//! Content-addressed image storage
//!
//! Images live in the `blobs` table keyed by the SHA-256 of their bytes. The
//! storage id is the opaque reference ingredients and recipes carry, and resolves
//! to a public URL served by `GET /api/images/:storage_id`.

use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};

use crate::db::{self, Db, tables};
use crate::error::{AppError, Result};
use crate::models::blob::validate_storage_id;
use crate::models::{BlobRecord, Principal, UploadedImage};
use crate::security::content_hash;

/// Turns storage ids into fetchable URLs
#[derive(Debug, Clone)]
pub struct ImageUrls {
    base_url: String,
}

impl ImageUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, storage_id: &str) -> String {
        format!("{}/api/images/{}", self.base_url, storage_id)
    }

    /// Resolve an optional reference, yielding `None` when unset or unknown
    pub fn resolve<T>(&self, blobs: &T, reference: Option<&str>) -> Result<Option<String>>
    where
        T: ReadableTable<&'static str, &'static [u8]>,
    {
        match reference {
            Some(id) if blobs.get(id)?.is_some() => Ok(Some(self.url_for(id))),
            _ => Ok(None),
        }
    }
}

/// Fail with `ValidationFailed` unless `reference` names a stored blob
pub fn ensure_exists<T>(blobs: &T, reference: Option<&str>) -> Result<()>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    if let Some(id) = reference
        && blobs.get(id)?.is_none()
    {
        return Err(AppError::ValidationFailed(
            crate::constants::ERR_UNKNOWN_IMAGE.to_string(),
        ));
    }
    Ok(())
}

/// Image upload and retrieval
#[derive(Clone)]
pub struct BlobStore {
    db: Db,
    urls: ImageUrls,
    max_bytes: usize,
}

impl BlobStore {
    pub fn new(db: Db, urls: ImageUrls, max_bytes: usize) -> Self {
        Self {
            db,
            urls,
            max_bytes,
        }
    }

    /// Store an image and return its storage id
    ///
    /// Identical bytes map to the same id; re-uploading keeps the first record.
    pub async fn upload(
        &self,
        principal: &Principal,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadedImage> {
        if data.is_empty() {
            return Err(AppError::ValidationFailed("Image is empty".to_string()));
        }

        if data.len() > self.max_bytes {
            tracing::warn!(
                "Image too large from user {}: {} bytes (max: {})",
                principal.user_id,
                data.len(),
                self.max_bytes
            );
            return Err(AppError::PayloadTooLarge);
        }

        if !content_type.starts_with("image/") {
            return Err(AppError::ValidationFailed(format!(
                "Unsupported content type: {}",
                content_type
            )));
        }

        let storage_id = content_hash(&data);
        let size = data.len();
        let record = BlobRecord {
            content_type: content_type.to_string(),
            data,
            uploaded_by: principal.user_id.clone(),
            created_at: Utc::now().timestamp_millis(),
        };

        let db = self.db.clone();
        let key = storage_id.clone();
        let stored = tokio::task::spawn_blocking(move || -> Result<bool> {
            let write_txn = db.begin_write()?;
            let stored = {
                let mut blobs = write_txn.open_table(tables::BLOBS)?;
                if blobs.get(key.as_str())?.is_some() {
                    false
                } else {
                    let bytes = db::encode(&record)?;
                    blobs.insert(key.as_str(), bytes.as_slice())?;
                    true
                }
            };
            write_txn.commit()?;
            Ok(stored)
        })
        .await??;

        if stored {
            tracing::info!(
                "Image stored for user {}: {} ({} bytes)",
                principal.user_id,
                storage_id,
                size
            );
        } else {
            tracing::debug!("Image {} already stored", storage_id);
        }

        Ok(UploadedImage {
            url: self.urls.url_for(&storage_id),
            storage_id,
        })
    }

    /// Fetch a stored image
    pub async fn get(&self, storage_id: &str) -> Result<BlobRecord> {
        if !validate_storage_id(storage_id) {
            return Err(AppError::NotFound("Image"));
        }

        let db = self.db.clone();
        let key = storage_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<BlobRecord> {
            let read_txn = db.begin_read()?;
            let blobs = read_txn.open_table(tables::BLOBS)?;

            blobs
                .get(key.as_str())?
                .map(|b| db::decode(b.value()))
                .transpose()?
                .ok_or(AppError::NotFound("Image"))
        })
        .await?
    }
}
