pub mod tables;

use bincode::error::{DecodeError, EncodeError};
use redb::{Database, Error as RedbError, ReadableTable, WriteTransaction};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> std::result::Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            tracing::error!("Failed to create database directory: {}", e);
            RedbError::Io(e)
        })?;
    }

    let db = Database::create(path)?;
    init_tables(&db)?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Create every table so read transactions never hit a missing one
#[allow(clippy::result_large_err)]
pub fn init_tables(db: &Database) -> std::result::Result<(), RedbError> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::SEQUENCES)?;
        let _ = write_txn.open_table(tables::USERS)?;
        let _ = write_txn.open_table(tables::USER_EMAILS)?;
        let _ = write_txn.open_table(tables::INGREDIENTS)?;
        let _ = write_txn.open_multimap_table(tables::INGREDIENTS_BY_USER)?;
        let _ = write_txn.open_multimap_table(tables::INGREDIENTS_BY_NAME)?;
        let _ = write_txn.open_table(tables::RECIPES)?;
        let _ = write_txn.open_multimap_table(tables::RECIPES_BY_USER)?;
        let _ = write_txn.open_multimap_table(tables::RECIPES_BY_TITLE)?;
        let _ = write_txn.open_table(tables::RECIPE_INGREDIENTS)?;
        let _ = write_txn.open_multimap_table(tables::RECIPE_INGREDIENTS_BY_RECIPE)?;
        let _ = write_txn.open_multimap_table(tables::RECIPE_INGREDIENTS_BY_INGREDIENT)?;
        let _ = write_txn.open_table(tables::RECIPE_STEPS)?;
        let _ = write_txn.open_table(tables::BLOBS)?;
    }
    write_txn.commit()?;
    Ok(())
}

/// Issue the next id of a collection inside the caller's write transaction
///
/// Ids start at 1 and only grow, so ascending id order is insertion order.
pub fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64> {
    let mut table = txn.open_table(tables::SEQUENCES)?;
    let next = table.get(sequence)?.map(|last| last.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

/// Serialize a record for storage
pub fn encode<T: Serialize>(record: &T) -> std::result::Result<Vec<u8>, EncodeError> {
    bincode::serde::encode_to_vec(record, BINCODE_CONFIG)
}

/// Deserialize a stored record
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> std::result::Result<T, DecodeError> {
    bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG).map(|(record, _)| record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_next_id_is_sequential_per_collection() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("seq.db")).unwrap();

        let write_txn = db.begin_write().unwrap();
        assert_eq!(next_id(&write_txn, "ingredients").unwrap(), 1);
        assert_eq!(next_id(&write_txn, "ingredients").unwrap(), 2);
        assert_eq!(next_id(&write_txn, "recipes").unwrap(), 1);
        write_txn.commit().unwrap();

        let write_txn = db.begin_write().unwrap();
        assert_eq!(next_id(&write_txn, "ingredients").unwrap(), 3);
    }

    #[test]
    fn test_aborted_transaction_does_not_consume_ids() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("seq.db")).unwrap();

        let write_txn = db.begin_write().unwrap();
        assert_eq!(next_id(&write_txn, "recipes").unwrap(), 1);
        write_txn.abort().unwrap();

        let write_txn = db.begin_write().unwrap();
        assert_eq!(next_id(&write_txn, "recipes").unwrap(), 1);
    }

    #[test]
    fn test_open_database_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("pantry.db");

        open_database(&path).unwrap();

        assert!(path.exists());
    }
}
