//! Refresh-token service
//!
//! Token rotation and revocation. Everything that goes wrong on the
//! refresh path — undecodable access token, unknown or expired
//! refresh token — collapses into one generic client-facing message
//! so the security layer leaks nothing.

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::clock::Clock;
use crate::data::Database;
use crate::error::AppError;
use crate::service::TokenPair;

const INVALID_CLIENT_REQUEST: &str = "Invalid client request";

/// Refresh-token service
pub struct RefreshTokenService {
    db: Arc<Database>,
    tokens: Arc<TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl RefreshTokenService {
    pub fn new(db: Arc<Database>, tokens: Arc<TokenIssuer>, clock: Arc<dyn Clock>) -> Self {
        Self { db, tokens, clock }
    }

    /// Exchange an expired access token plus refresh token for a new pair
    ///
    /// The stored row is rotated in place: the token value changes,
    /// the expiry does not. A token at or past its expiry is rejected.
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, AppError> {
        let claims = self.tokens.decode_expired(access_token).map_err(|error| {
            tracing::debug!(%error, "refresh rejected: access token did not decode");
            AppError::validation(INVALID_CLIENT_REQUEST)
        })?;

        if claims.sub.is_empty() {
            return Err(AppError::not_found("No info about user id in the token"));
        }

        let mut stored = self
            .db
            .get_refresh_token(&claims.sub, refresh_token)
            .await?
            .ok_or_else(|| AppError::validation(INVALID_CLIENT_REQUEST))?;

        if stored.expires_at <= self.clock.now() {
            return Err(AppError::validation(INVALID_CLIENT_REQUEST));
        }

        let new_access_token = self.tokens.reissue_access_token(&claims)?;
        let new_refresh_token = self.tokens.issue_refresh_token();
        stored.token = new_refresh_token.clone();
        self.db.update_refresh_token(&stored).await?;

        tracing::debug!(user_id = %claims.sub, "refresh token rotated");
        Ok(TokenPair {
            access_token: new_access_token,
            refresh_token: new_refresh_token,
        })
    }

    /// Revoke a refresh token
    pub async fn revoke(&self, user_id: &str, refresh_token: &str) -> Result<(), AppError> {
        let stored = self
            .db
            .get_refresh_token(user_id, refresh_token)
            .await?
            .ok_or_else(|| AppError::not_found("User or refresh token was not found"))?;

        self.db.delete_refresh_token(&stored.id).await
    }
}
