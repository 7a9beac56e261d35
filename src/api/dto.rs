//! API request and response DTOs
//!
//! Wire shapes only; conversion to and from data models lives in
//! `converters`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Account
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub avatar_file_name: Option<String>,
}

/// Access + refresh token pair submitted to the refresh endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevokeRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar_file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
}

// =============================================================================
// Blog
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlogRequest {
    pub tag: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBlogRequest {
    pub name: String,
    pub tag: String,
    pub description: Option<String>,
    pub avatar_file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub tag: String,
    pub description: Option<String>,
    pub avatar_file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Post
// =============================================================================

/// Text style on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyleDto {
    Heading,
    Subheading,
    Paragraph,
}

/// Submitted post item, discriminated by `type`
///
/// `id` is omitted (or null) for new items; on update a present id
/// must refer to an item already on the post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PostItemRequest {
    Text {
        #[serde(default)]
        id: Option<String>,
        text: String,
        style: TextStyleDto,
    },
    Image {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        alt: Option<String>,
        #[serde(default)]
        description: Option<String>,
        file_name: String,
    },
}

/// Post content, used by both create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRequest {
    pub header: String,
    #[serde(default)]
    pub subheader: Option<String>,
    #[serde(default)]
    pub items: Vec<PostItemRequest>,
}

/// Stored post item, discriminated by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PostItemResponse {
    Text {
        id: String,
        text: String,
        style: TextStyleDto,
    },
    Image {
        id: String,
        alt: Option<String>,
        description: Option<String>,
        file_name: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub blog_id: String,
    pub header: String,
    pub subheader: Option<String>,
    pub is_modified: bool,
    pub created_at: DateTime<Utc>,
    /// Items in display order
    pub items: Vec<PostItemResponse>,
}

/// Post summary for paged listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostTitleResponse {
    pub id: String,
    pub header: String,
    pub subheader: Option<String>,
    pub is_modified: bool,
    pub created_at: DateTime<Utc>,
    pub blog_tag: String,
}

// =============================================================================
// Comment
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub text: String,
    pub is_modified: bool,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    /// Tag of the author's blog, when they have one
    pub user_blog_tag: Option<String>,
}

// =============================================================================
// Common
// =============================================================================

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    10
}

/// Pagination query parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

/// One page of results with echoed pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub per_page: i64,
}

/// Name of an uploaded image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub file_name: String,
}
