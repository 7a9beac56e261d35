//! Token issuing
//!
//! HS256 access tokens plus opaque refresh tokens. The refresh flow
//! needs to read claims out of an expired access token, so decoding
//! with expiry validation disabled is part of the public surface.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::JwtConfig;
use crate::error::AppError;

/// Claims embedded in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Display name
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Failure decoding or validating a token
///
/// Callers on the refresh path must catch this and re-signal it as a
/// generic validation failure; the detail stays in server-side logs.
#[derive(Debug, thiserror::Error)]
#[error("token rejected: {0}")]
pub struct TokenRejected(#[from] jsonwebtoken::errors::Error);

/// Issues and validates tokens
pub struct TokenIssuer {
    config: JwtConfig,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(config: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Issue a signed access token for the given user
    ///
    /// Lifetime, issuer, and audience come from configuration; `iat`
    /// and `exp` from the injected clock. Fails only on
    /// misconfiguration.
    pub fn issue_access_token(
        &self,
        user_id: &str,
        name: &str,
        email: &str,
        roles: Vec<String>,
    ) -> Result<String, AppError> {
        let now = self.clock.now();
        let expires = now + chrono::Duration::minutes(self.config.access_token_lifetime_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            roles,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        self.issue_from_claims(&claims)
    }

    /// Re-issue an access token from previously decoded claims
    ///
    /// Used by the refresh flow: identity claims carry over, the
    /// time-box is renewed.
    pub fn reissue_access_token(&self, claims: &Claims) -> Result<String, AppError> {
        let now = self.clock.now();
        let expires = now + chrono::Duration::minutes(self.config.access_token_lifetime_minutes);

        let renewed = Claims {
            iat: now.timestamp(),
            exp: expires.timestamp(),
            ..claims.clone()
        };
        self.issue_from_claims(&renewed)
    }

    fn issue_from_claims(&self, claims: &Claims) -> Result<String, AppError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| AppError::Config(format!("failed to sign access token: {e}")))
    }

    /// Issue an opaque refresh token
    ///
    /// 32 cryptographically random bytes, base64-encoded. Expiry is
    /// tracked in storage, not inside the token.
    pub fn issue_refresh_token(&self) -> String {
        use base64::{Engine as _, engine::general_purpose::STANDARD};
        use rand::RngCore;

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        STANDARD.encode(bytes)
    }

    /// Validate an access token and return its claims
    ///
    /// Full validation including expiry; used by the request
    /// authentication layer.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenRejected> {
        let data = decode::<Claims>(token, &self.decoding_key(), &self.validation(true))?;
        Ok(data.claims)
    }

    /// Decode a (possibly expired) access token for the refresh flow
    ///
    /// Signature, issuer, audience, and algorithm are still enforced;
    /// only the expiry check is skipped.
    pub fn decode_expired(&self, token: &str) -> Result<Claims, TokenRejected> {
        let data = decode::<Claims>(token, &self.decoding_key(), &self.validation(false))?;
        Ok(data.claims)
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.config.secret.as_bytes())
    }

    fn validation(&self, validate_exp: bool) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.validate_exp = validate_exp;
        validation
    }
}
