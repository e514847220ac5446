use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};

use super::Store;
use crate::db::{self, tables};
use crate::error::{AppError, Result};
use crate::models::user::normalize_email;
use crate::models::{Credentials, UserRecord};
use crate::security::{apply_pepper, dummy_password_hash, hash_password, verify_password};

impl Store {
    /// Register a new account and return its user id
    ///
    /// Returns `Conflict` if the email is already registered.
    pub async fn create_user(&self, credentials: Credentials) -> Result<String> {
        let email = credentials.validate_for_sign_up()?;
        let user_id = apply_pepper(&email, &self.user_id_pepper);

        let db = self.db.clone();
        let new_id = user_id.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let password_hash = hash_password(&credentials.password)?;

            let write_txn = db.begin_write()?;
            {
                let mut emails = write_txn.open_table(tables::USER_EMAILS)?;
                if emails.get(email.as_str())?.is_some() {
                    tracing::info!("Sign-up attempt for existing email");
                    return Err(AppError::Conflict);
                }
                emails.insert(email.as_str(), new_id.as_str())?;

                let record = UserRecord {
                    email,
                    password_hash,
                    created_at: Utc::now().timestamp_millis(),
                };
                let mut users = write_txn.open_table(tables::USERS)?;
                users.insert(new_id.as_str(), db::encode(&record)?.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await??;

        tracing::info!("New user registered: {}", user_id);

        Ok(user_id)
    }

    /// Check an email/password pair and return the user id
    ///
    /// Unknown emails and wrong passwords both yield `InvalidCredentials`.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<String> {
        let email = normalize_email(&credentials.email).map_err(|_| AppError::InvalidCredentials)?;

        let db = self.db.clone();
        let user_id = tokio::task::spawn_blocking(move || -> Result<String> {
            let read_txn = db.begin_read()?;
            let emails = read_txn.open_table(tables::USER_EMAILS)?;
            let users = read_txn.open_table(tables::USERS)?;

            let account = match emails.get(email.as_str())? {
                Some(id) => {
                    let user_id = id.value().to_string();
                    let record: Option<UserRecord> = users
                        .get(user_id.as_str())?
                        .map(|b| db::decode(b.value()))
                        .transpose()?;
                    record.map(|record| (user_id, record.password_hash))
                }
                None => None,
            };

            // Unknown emails still pay for one Argon2 verification
            let Some((user_id, password_hash)) = account else {
                verify_password(&credentials.password, dummy_password_hash());
                return Err(AppError::InvalidCredentials);
            };

            if !verify_password(&credentials.password, &password_hash) {
                return Err(AppError::InvalidCredentials);
            }

            Ok(user_id)
        })
        .await?;

        match &user_id {
            Ok(id) => tracing::info!("User signed in: {}", id),
            Err(_) => tracing::warn!("Failed sign-in attempt"),
        }

        user_id
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::models::Credentials;
    use crate::store::test_support::*;
    use tempfile::TempDir;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_authenticate() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        let user_id = store
            .create_user(credentials("cook@example.com", "simmer-slowly"))
            .await
            .unwrap();
        assert_eq!(user_id.len(), 64);

        let signed_in = store
            .authenticate(credentials(" COOK@example.com", "simmer-slowly"))
            .await
            .unwrap();
        assert_eq!(signed_in, user_id);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        store
            .create_user(credentials("cook@example.com", "simmer-slowly"))
            .await
            .unwrap();
        let again = store
            .create_user(credentials("Cook@Example.com", "another-password"))
            .await;

        assert!(matches!(again, Err(AppError::Conflict)));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        store
            .create_user(credentials("cook@example.com", "simmer-slowly"))
            .await
            .unwrap();

        assert!(matches!(
            store
                .authenticate(credentials("cook@example.com", "boil-quickly"))
                .await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            store
                .authenticate(credentials("nobody@example.com", "simmer-slowly"))
                .await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            store.authenticate(credentials("not-an-email", "x")).await,
            Err(AppError::InvalidCredentials)
        ));
    }
}
