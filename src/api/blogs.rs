//! Blog endpoints

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::roles;
use crate::error::AppError;
use crate::service::{BlogService, CreateBlogInput, PostService, UpdateBlogInput};

use super::converters::{
    blog_to_response, page_query_to_params, page_to_response, post_request_to_input,
    post_summary_to_response, post_to_response,
};
use super::dto::{
    BlogResponse, CreateBlogRequest, PageQuery, PagedResponse, PostRequest, PostResponse,
    PostTitleResponse, UpdateBlogRequest,
};

fn blog_service(state: &AppState) -> BlogService {
    BlogService::new(
        state.db.clone(),
        state.identity.clone(),
        state.storage.clone(),
        state.clock.clone(),
    )
}

fn post_service(state: &AppState) -> PostService {
    PostService::new(state.db.clone(), state.clock.clone())
}

/// POST /api/blogs
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateBlogRequest>,
) -> Result<(StatusCode, Json<BlogResponse>), AppError> {
    let blog = blog_service(&state)
        .create(
            user.id(),
            CreateBlogInput {
                tag: request.tag,
                description: request.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(blog_to_response(&blog))))
}

/// PUT /api/blogs/:id
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(blog_id): Path<String>,
    Json(request): Json<UpdateBlogRequest>,
) -> Result<Json<BlogResponse>, AppError> {
    let blog = blog_service(&state)
        .update(
            user.id(),
            &blog_id,
            UpdateBlogInput {
                name: request.name,
                tag: request.tag,
                description: request.description,
                avatar_file_name: request.avatar_file_name,
            },
        )
        .await?;

    Ok(Json(blog_to_response(&blog)))
}

/// GET /api/blogs/:id (lookup by tag)
pub async fn get_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<BlogResponse>, AppError> {
    let blog = blog_service(&state).get_by_tag(&tag).await?;
    Ok(Json(blog_to_response(&blog)))
}

/// POST /api/blogs/:id/posts
pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(blog_id): Path<String>,
    Json(request): Json<PostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    user.require_role(roles::AUTHOR)?;

    let created = post_service(&state)
        .create(user.id(), &blog_id, post_request_to_input(request))
        .await?;

    Ok((StatusCode::CREATED, Json(post_to_response(&created))))
}

/// GET /api/blogs/:id/posts
pub async fn get_posts_paged(
    State(state): State<AppState>,
    Path(blog_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResponse<PostTitleResponse>>, AppError> {
    let page = post_service(&state)
        .get_paged_by_blog(&blog_id, page_query_to_params(query))
        .await?;

    Ok(Json(page_to_response(page, post_summary_to_response)))
}
