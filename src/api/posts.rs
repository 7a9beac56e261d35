//! Post endpoints

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::roles;
use crate::error::AppError;
use crate::service::PostService;

use super::converters::{
    page_query_to_params, page_to_response, post_request_to_input, post_summary_to_response,
    post_to_response,
};
use super::dto::{PageQuery, PagedResponse, PostRequest, PostResponse, PostTitleResponse};

fn post_service(state: &AppState) -> PostService {
    PostService::new(state.db.clone(), state.clock.clone())
}

/// GET /api/posts
pub async fn get_paged(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResponse<PostTitleResponse>>, AppError> {
    let page = post_service(&state)
        .get_paged(page_query_to_params(query))
        .await?;

    Ok(Json(page_to_response(page, post_summary_to_response)))
}

/// GET /api/posts/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let loaded = post_service(&state).get_by_id(&post_id).await?;
    Ok(Json(post_to_response(&loaded)))
}

/// PUT /api/posts/:id
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Json(request): Json<PostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    user.require_role(roles::AUTHOR)?;

    let updated = post_service(&state)
        .update(user.id(), &post_id, post_request_to_input(request))
        .await?;

    Ok(Json(post_to_response(&updated)))
}

/// DELETE /api/posts/:id
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> Result<StatusCode, AppError> {
    user.require_role(roles::AUTHOR)?;

    post_service(&state).delete(user.id(), &post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
