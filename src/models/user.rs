use serde::{Deserialize, Serialize};

use crate::constants::{ERR_INVALID_EMAIL, ERR_PASSWORD_TOO_SHORT, MIN_PASSWORD_LEN};
use crate::error::{AppError, Result};

/// User record stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Normalized (trimmed, lower-case) email
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// When the user was created (Unix milliseconds)
    pub created_at: i64,
}

/// The authenticated caller of a request
///
/// Every store operation that is scoped to a user takes one of these explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}

impl Principal {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Email/password pair submitted to sign-up and sign-in
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Normalize the email and check both fields for sign-up
    pub fn validate_for_sign_up(&self) -> Result<String> {
        let email = normalize_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::ValidationFailed(
                ERR_PASSWORD_TOO_SHORT.to_string(),
            ));
        }
        Ok(email)
    }
}

/// Successful sign-up / sign-in response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub token: String,
    /// Token expiry (Unix seconds)
    pub expires_at: i64,
}

/// Trim and lower-case an email, rejecting obviously malformed addresses
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(AppError::ValidationFailed(ERR_INVALID_EMAIL.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Cook@Example.COM ").unwrap(),
            "cook@example.com"
        );
        assert!(normalize_email("").is_err());
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("cook@").is_err());
        assert!(normalize_email("a@b@c").is_err());
    }

    #[test]
    fn test_validate_for_sign_up_rejects_short_password() {
        let credentials = Credentials {
            email: "cook@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(matches!(
            credentials.validate_for_sign_up(),
            Err(AppError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_validate_for_sign_up_returns_normalized_email() {
        let credentials = Credentials {
            email: "Cook@Example.com".to_string(),
            password: "long enough".to_string(),
        };
        assert_eq!(
            credentials.validate_for_sign_up().unwrap(),
            "cook@example.com"
        );
    }
}
