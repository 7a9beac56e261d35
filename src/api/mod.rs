//! API layer
//!
//! HTTP handlers for accounts, blogs, posts, comments, and images,
//! plus the Prometheus metrics endpoint. Every handler maps a request
//! to one service call and the result back to a response DTO.

mod account;
mod blogs;
mod comments;
mod converters;
mod dto;
mod images;
pub mod metrics;
mod posts;

pub use converters::*;
pub use dto::*;

pub use metrics::metrics_router;

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
};

use crate::AppState;

/// Create the `/api` router
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Account
        .route("/account/register", post(account::register))
        .route("/account/login", post(account::login))
        .route("/account/refresh", post(account::refresh))
        .route("/account/revoke", post(account::revoke))
        .route(
            "/account",
            get(account::get_details).put(account::update_details),
        )
        // Blogs (GET is a tag lookup)
        .route("/blogs", post(blogs::create))
        .route("/blogs/:id", get(blogs::get_by_tag).put(blogs::update))
        .route(
            "/blogs/:id/posts",
            post(blogs::create_post).get(blogs::get_posts_paged),
        )
        // Posts
        .route("/posts", get(posts::get_paged))
        .route(
            "/posts/:id",
            get(posts::get_by_id)
                .put(posts::update)
                .delete(posts::delete),
        )
        // Comments
        .route(
            "/posts/:id/comments",
            post(comments::create).get(comments::get_paged_by_post),
        )
        .route(
            "/comments/:id",
            put(comments::update).delete(comments::delete),
        )
        // Images
        .route("/images", post(images::upload))
        .route("/images/:file_name", get(images::download))
}

/// Record request count and duration for every handled request
pub async fn track_metrics(request: Request, next: Next) -> Response {
    use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};

    let start = std::time::Instant::now();
    let method = request.method().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), &path, response.status().as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method.as_str(), &path])
        .observe(start.elapsed().as_secs_f64());

    response
}
