//! Identity and credential management
//!
//! Owns everything credential-shaped: password policy, bcrypt hashing
//! and verification, and role membership. Services treat this as the
//! only way to create users or check passwords.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::data::{Database, EntityId, User};
use crate::error::AppError;

const MIN_PASSWORD_CHARS: usize = 8;
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Identity subsystem
///
/// Wraps the user table behind credential-aware operations.
pub struct Identity {
    db: Arc<Database>,
}

impl Identity {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a user with a hashed credential
    ///
    /// Collects every violated policy rule into one validation error
    /// rather than failing on the first.
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let email = email.trim();
        let mut errors = Vec::new();

        if !is_plausible_email(email) {
            errors.push(format!("'{email}' is not a valid email"));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            errors.push(format!(
                "Password must be at least {MIN_PASSWORD_CHARS} characters long"
            ));
        }
        if self.db.user_email_exists(email).await? {
            errors.push(format!("Email '{email}' is already taken"));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        // bcrypt is CPU-bound; keep the async executor free
        let password = password.to_string();
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
                .await
                .map_err(|e| AppError::Internal(e.into()))?
                .map_err(|e| AppError::Internal(anyhow::anyhow!("bcrypt hash failed: {e}")))?;

        let user = User {
            id: EntityId::new().0,
            email: email.to_string(),
            password_hash,
            name: name.to_string(),
            avatar_file_name: None,
            created_at: now,
        };

        if let Err(error) = self.db.insert_user(&user).await {
            // The unique index is the source of truth under a
            // concurrent registration race.
            if let AppError::Database(db_error) = &error {
                if crate::error::is_unique_violation(db_error) {
                    return Err(AppError::validation(format!(
                        "Email '{email}' is already taken"
                    )));
                }
            }
            return Err(error);
        }

        Ok(user)
    }

    /// Look up a user by login name (email).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.db.get_user_by_email(email.trim()).await
    }

    /// Verify a password against a user's stored hash
    ///
    /// Never errors on mismatch; an unreadable hash counts as a
    /// mismatch so login stays non-enumerating.
    pub async fn check_password(&self, user: &User, password: &str) -> Result<bool, AppError> {
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .unwrap_or(false);
        Ok(verified)
    }

    pub async fn add_to_role(&self, user_id: &str, role: &str) -> Result<(), AppError> {
        self.db.add_user_role(user_id, role).await
    }

    pub async fn get_roles(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        self.db.get_user_roles(user_id).await
    }
}

/// Minimal structural email check: one '@' with non-empty local part
/// and a dot-separated domain.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    domain.contains('.') && !email.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    async fn create_identity() -> (Identity, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("identity.db"))
            .await
            .unwrap();
        (Identity::new(Arc::new(db)), temp_dir)
    }

    #[test]
    fn plausible_email_accepts_and_rejects() {
        assert!(is_plausible_email("user@example.com"));
        assert!(is_plausible_email("user.name@sub.example.org"));
        assert!(!is_plausible_email("userexample.com"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("user@"));
        assert!(!is_plausible_email("user@nodot"));
        assert!(!is_plausible_email("user @example.com"));
    }

    #[tokio::test]
    async fn create_user_aggregates_all_policy_violations() {
        let (identity, _temp_dir) = create_identity().await;

        let error = identity
            .create_user("not-an-email", "Alice", "short", Utc::now())
            .await
            .unwrap_err();

        match error {
            AppError::Validation(messages) => {
                assert_eq!(messages.len(), 2);
                assert!(messages.iter().any(|m| m.contains("valid email")));
                assert!(messages.iter().any(|m| m.contains("at least 8")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_user_hashes_password_and_rejects_duplicates() {
        let (identity, _temp_dir) = create_identity().await;

        let user = identity
            .create_user("alice@example.com", "Alice", "correct horse", Utc::now())
            .await
            .unwrap();
        assert_ne!(user.password_hash, "correct horse");

        assert!(identity.check_password(&user, "correct horse").await.unwrap());
        assert!(!identity.check_password(&user, "wrong").await.unwrap());

        let error = identity
            .create_user("alice@example.com", "Other", "another pass", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }
}
