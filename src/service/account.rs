//! Account service
//!
//! Registration, login, and profile updates. Login failures are a
//! non-error result on purpose: the caller gets one generic message
//! whether the email is unknown or the password is wrong.

use std::sync::Arc;

use crate::auth::{Identity, TokenIssuer};
use crate::clock::Clock;
use crate::data::{Database, EntityId, RefreshToken, User, roles};
use crate::error::AppError;
use crate::service::TokenPair;
use crate::storage::MediaStorage;

const WRONG_EMAIL_OR_PASSWORD: &str = "Wrong email or password";

/// Registration input
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Login input
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login outcome
///
/// Failure is an expected result, not an error; it maps to a 400
/// with the generic message.
#[derive(Debug, Clone)]
pub enum LoginResult {
    Success(TokenPair),
    Failure { message: &'static str },
}

/// Profile update input
#[derive(Debug, Clone)]
pub struct UpdateUserInput {
    pub name: String,
    pub avatar_file_name: Option<String>,
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    identity: Arc<Identity>,
    tokens: Arc<TokenIssuer>,
    storage: Arc<MediaStorage>,
    clock: Arc<dyn Clock>,
    refresh_token_lifetime_days: i64,
}

impl AccountService {
    pub fn new(
        db: Arc<Database>,
        identity: Arc<Identity>,
        tokens: Arc<TokenIssuer>,
        storage: Arc<MediaStorage>,
        clock: Arc<dyn Clock>,
        refresh_token_lifetime_days: i64,
    ) -> Self {
        Self {
            db,
            identity,
            tokens,
            storage,
            clock,
            refresh_token_lifetime_days,
        }
    }

    /// Register a new user
    ///
    /// Input violations aggregate into one validation error; the
    /// identity layer adds its own policy failures the same way. The
    /// new user starts as a registered viewer.
    pub async fn register(&self, input: RegisterInput) -> Result<User, AppError> {
        let mut errors = Vec::new();
        if input.name.trim().is_empty() {
            errors.push("'name' must not be empty".to_string());
        }
        if input.email.trim().is_empty() {
            errors.push("'email' must not be empty".to_string());
        }
        if input.password.is_empty() {
            errors.push("'password' must not be empty".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let user = self
            .identity
            .create_user(
                &input.email,
                input.name.trim(),
                &input.password,
                self.clock.now(),
            )
            .await?;

        self.identity
            .add_to_role(&user.id, roles::REGISTERED_VIEWER)
            .await?;

        // TODO: Send email confirmation.

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Log a user in
    ///
    /// On success, persists a refresh token expiring after the
    /// configured number of days and issues an access token carrying
    /// the user's id, name, email, and roles.
    pub async fn login(&self, input: LoginInput) -> Result<LoginResult, AppError> {
        let Some(user) = self.identity.find_by_email(&input.email).await? else {
            return Ok(LoginResult::Failure {
                message: WRONG_EMAIL_OR_PASSWORD,
            });
        };
        if !self.identity.check_password(&user, &input.password).await? {
            return Ok(LoginResult::Failure {
                message: WRONG_EMAIL_OR_PASSWORD,
            });
        }

        let refresh_token = self.tokens.issue_refresh_token();
        self.db
            .insert_refresh_token(&RefreshToken {
                id: EntityId::new().0,
                user_id: user.id.clone(),
                token: refresh_token.clone(),
                expires_at: self.clock.now()
                    + chrono::Duration::days(self.refresh_token_lifetime_days),
            })
            .await?;

        let role_names = self.identity.get_roles(&user.id).await?;
        let access_token =
            self.tokens
                .issue_access_token(&user.id, &user.name, &user.email, role_names)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResult::Success(TokenPair {
            access_token,
            refresh_token,
        }))
    }

    /// Read a user's public details
    pub async fn get_details(&self, user_id: &str) -> Result<User, AppError> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User was not found"))
    }

    /// Update name and avatar, cascading onto an owned blog
    ///
    /// A newly supplied avatar must already exist in the media store;
    /// an unchanged or cleared avatar is accepted as-is.
    pub async fn update_details(
        &self,
        user_id: &str,
        input: UpdateUserInput,
    ) -> Result<User, AppError> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("'name' must not be empty"));
        }

        let mut user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User was not found"))?;

        if let Some(avatar) = input.avatar_file_name.as_deref() {
            let changed = user.avatar_file_name.as_deref() != Some(avatar);
            if changed && !avatar.is_empty() && !self.storage.exists(avatar).await? {
                return Err(AppError::validation(format!(
                    "Image with name {avatar} was not found"
                )));
            }
        }

        user.name = input.name.trim().to_string();
        user.avatar_file_name = input.avatar_file_name;

        let blog = match self.db.get_blog_by_user(&user.id).await? {
            Some(mut blog) => {
                blog.name = user.name.clone();
                blog.avatar_file_name = user.avatar_file_name.clone();
                Some(blog)
            }
            None => None,
        };

        self.db.update_user_with_blog(&user, blog.as_ref()).await?;

        tracing::info!(user_id = %user.id, "user details updated");
        Ok(user)
    }
}
