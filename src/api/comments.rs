//! Comment endpoints

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::{CommentInput, CommentService};

use super::converters::{comment_view_to_response, page_query_to_params, page_to_response};
use super::dto::{CommentRequest, CommentResponse, PageQuery, PagedResponse};

fn comment_service(state: &AppState) -> CommentService {
    CommentService::new(state.db.clone(), state.clock.clone())
}

/// POST /api/posts/:id/comments
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let view = comment_service(&state)
        .create(user.id(), &post_id, CommentInput { text: request.text })
        .await?;

    Ok((StatusCode::CREATED, Json(comment_view_to_response(&view))))
}

/// GET /api/posts/:id/comments
pub async fn get_paged_by_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResponse<CommentResponse>>, AppError> {
    let page = comment_service(&state)
        .get_paged_by_post(&post_id, page_query_to_params(query))
        .await?;

    Ok(Json(page_to_response(page, comment_view_to_response)))
}

/// PUT /api/comments/:id
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(comment_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let view = comment_service(&state)
        .update(user.id(), &comment_id, CommentInput { text: request.text })
        .await?;

    Ok(Json(comment_view_to_response(&view)))
}

/// DELETE /api/comments/:id
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, AppError> {
    comment_service(&state).delete(user.id(), &comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
