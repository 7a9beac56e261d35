//! Service layer
//!
//! One stateless service per bounded capability. Every operation runs
//! validate -> fetch -> check -> mutate -> persist and returns data
//! models; the API layer does all response shaping.

mod account;
mod blog;
mod comment;
mod image;
mod post;
mod token;

pub use account::{AccountService, LoginInput, LoginResult, RegisterInput, UpdateUserInput};
pub use blog::{BlogService, CreateBlogInput, UpdateBlogInput};
pub use comment::{CommentInput, CommentService};
pub use image::ImageService;
pub use post::{PostInput, PostItemInput, PostService};
pub use token::RefreshTokenService;

use crate::error::AppError;

/// An issued access/refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Pagination parameters, echoed back alongside each page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// 1-based page number
    pub page: i64,
    pub per_page: i64,
}

impl PageParams {
    /// Validate and derive the query window.
    ///
    /// Collects all violations into one validation error.
    pub fn window(&self) -> Result<(i64, i64), AppError> {
        let mut errors = Vec::new();
        if self.page < 1 {
            errors.push("'page' must be greater than or equal to 1".to_string());
        }
        if self.per_page < 1 {
            errors.push("'per_page' must be greater than or equal to 1".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok((self.per_page, (self.page - 1) * self.per_page))
    }
}

/// One page of results with the parameters that produced it
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub params: PageParams,
}

/// Ownership guard shared by every owner-scoped mutation
///
/// The same check recurs across blog, post, and comment updates; the
/// entity noun only changes the message.
pub(crate) fn check_ownership(
    owner_id: &str,
    caller_id: &str,
    entity: &'static str,
) -> Result<(), AppError> {
    if owner_id == caller_id {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "This {entity} belongs to another user"
        )))
    }
}

/// Shared fixtures for service tests
#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use crate::config::{JwtConfig, StorageConfig};
    use crate::storage::MediaStorage;

    pub(crate) fn test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-jwt-secret-at-least-32-bytes!!".to_string(),
            issuer: "rustscribe-test".to_string(),
            audience: "rustscribe-test".to_string(),
            access_token_lifetime_minutes: 15,
            refresh_token_lifetime_days: 7,
        }
    }

    /// Storage client with fake credentials; only usable on code
    /// paths that never reach the network.
    pub(crate) async fn test_storage() -> Arc<MediaStorage> {
        let config = StorageConfig {
            bucket: "test-media".to_string(),
            endpoint: "https://s3.test.example.com".to_string(),
            region: "auto".to_string(),
            access_key_id: "test-access-key".to_string(),
            secret_access_key: "test-secret-key".to_string(),
        };
        Arc::new(MediaStorage::new(&config).await.unwrap())
    }
}
