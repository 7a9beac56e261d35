//! Account endpoints

use axum::{
    extract::{Json, State},
    http::StatusCode,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::{
    AccountService, LoginInput, LoginResult, RefreshTokenService, RegisterInput, UpdateUserInput,
};

use super::converters::{tokens_to_response, user_to_response};
use super::dto::{
    LoginRequest, RegisterRequest, RevokeRequest, TokensRequest, TokensResponse, UpdateUserRequest,
    UserResponse,
};

fn account_service(state: &AppState) -> AccountService {
    AccountService::new(
        state.db.clone(),
        state.identity.clone(),
        state.tokens.clone(),
        state.storage.clone(),
        state.clock.clone(),
        state.config.jwt.refresh_token_lifetime_days,
    )
}

fn refresh_token_service(state: &AppState) -> RefreshTokenService {
    RefreshTokenService::new(state.db.clone(), state.tokens.clone(), state.clock.clone())
}

/// POST /api/account/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = account_service(&state)
        .register(RegisterInput {
            email: request.email,
            name: request.name,
            password: request.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user_to_response(&user))))
}

/// POST /api/account/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokensResponse>, AppError> {
    let result = account_service(&state)
        .login(LoginInput {
            email: request.email,
            password: request.password,
        })
        .await?;

    match result {
        LoginResult::Success(tokens) => Ok(Json(tokens_to_response(&tokens))),
        LoginResult::Failure { message } => Err(AppError::validation(message)),
    }
}

/// POST /api/account/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<TokensRequest>,
) -> Result<Json<TokensResponse>, AppError> {
    let tokens = refresh_token_service(&state)
        .refresh(&request.access_token, &request.refresh_token)
        .await?;

    Ok(Json(tokens_to_response(&tokens)))
}

/// POST /api/account/revoke
pub async fn revoke(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<RevokeRequest>,
) -> Result<StatusCode, AppError> {
    refresh_token_service(&state)
        .revoke(user.id(), &request.refresh_token)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/account
pub async fn get_details(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserResponse>, AppError> {
    let details = account_service(&state).get_details(user.id()).await?;
    Ok(Json(user_to_response(&details)))
}

/// PUT /api/account
pub async fn update_details(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = account_service(&state)
        .update_details(
            user.id(),
            UpdateUserInput {
                name: request.name,
                avatar_file_name: request.avatar_file_name,
            },
        )
        .await?;

    Ok(Json(user_to_response(&updated)))
}
