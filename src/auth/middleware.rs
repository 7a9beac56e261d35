//! Authentication middleware
//!
//! Bearer-token extraction for routes that require a signed-in user.

use axum::{
    RequestPartsExt, async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::AppState;
use crate::auth::jwt::Claims;
use crate::error::AppError;

/// Extractor for the current authenticated user
///
/// Verifies the access token (signature, issuer, audience, expiry)
/// and exposes its claims.
///
/// # Usage
/// ```ignore
/// async fn handler(user: CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", user.name())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.sub
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Require a role, failing with `Forbidden` when absent.
    pub fn require_role(&self, role: &str) -> Result<(), AppError> {
        if self.0.roles.iter().any(|r| r == role) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let state = AppState::from_ref(state);
        let claims = state.tokens.verify(bearer.token()).map_err(|error| {
            tracing::debug!(%error, "access token rejected");
            AppError::Unauthorized
        })?;

        Ok(CurrentUser(claims))
    }
}
