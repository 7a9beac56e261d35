//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user
///
/// The email doubles as the login name. Role membership lives in the
/// `user_roles` table, not on this struct.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    /// bcrypt hash of the credential
    pub password_hash: String,
    /// Display name
    pub name: String,
    /// Content-addressed name of the avatar in the media store
    pub avatar_file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Role names
pub mod roles {
    /// Granted at registration
    pub const REGISTERED_VIEWER: &str = "registered_viewer";
    /// Granted when the user creates a blog
    pub const AUTHOR: &str = "author";
}

// =============================================================================
// Blog
// =============================================================================

/// A user's blog (at most one per user)
///
/// Name and avatar mirror the owning user and are kept in sync by the
/// account and blog workflows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Blog {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Unique, trimmed, lower-cased handle
    pub tag: String,
    pub description: Option<String>,
    pub avatar_file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Post
// =============================================================================

/// A blog post
///
/// Content lives in an ordered collection of [`PostItem`]s, loaded
/// separately and ordered by their `ord` column.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub blog_id: String,
    pub header: String,
    pub subheader: Option<String>,
    /// true once the post has been updated after creation
    pub is_modified: bool,
    pub created_at: DateTime<Utc>,
}

/// A post together with its items in display order
#[derive(Debug, Clone)]
pub struct PostWithItems {
    pub post: Post,
    pub items: Vec<PostItem>,
}

/// Post summary row for paged listings (joined with the owning blog)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostSummary {
    pub id: String,
    pub header: String,
    pub subheader: Option<String>,
    pub is_modified: bool,
    pub created_at: DateTime<Utc>,
    pub blog_tag: String,
}

// =============================================================================
// Post items
// =============================================================================

/// Style of a text item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Heading,
    Subheading,
    Paragraph,
}

impl TextStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Subheading => "subheading",
            Self::Paragraph => "paragraph",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "heading" => Some(Self::Heading),
            "subheading" => Some(Self::Subheading),
            "paragraph" => Some(Self::Paragraph),
            _ => None,
        }
    }
}

/// One content item of a post
///
/// Exactly two shapes exist; every consumer matches exhaustively.
/// Position within the post is the item's index in the containing
/// `Vec`, written to the `ord` column on persist.
#[derive(Debug, Clone, PartialEq)]
pub enum PostItem {
    Text {
        id: String,
        text: String,
        style: TextStyle,
    },
    Image {
        id: String,
        alt: Option<String>,
        description: Option<String>,
        /// Content-addressed name in the media store
        file_name: String,
    },
}

impl PostItem {
    pub fn id(&self) -> &str {
        match self {
            Self::Text { id, .. } => id,
            Self::Image { id, .. } => id,
        }
    }
}

/// Raw post item row with the `kind` discriminator
///
/// Only the database layer sees this shape; it converts to and from
/// the [`PostItem`] sum type at the query boundary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostItemRow {
    pub id: String,
    pub post_id: String,
    pub ord: i64,
    pub kind: String,
    pub text: Option<String>,
    pub text_style: Option<String>,
    pub alt: Option<String>,
    pub description: Option<String>,
    pub file_name: Option<String>,
}

impl PostItemRow {
    /// Discriminator values
    pub const KIND_TEXT: &'static str = "text";
    pub const KIND_IMAGE: &'static str = "image";

    /// Flatten a domain item into a row at a given position.
    pub fn from_item(item: &PostItem, post_id: &str, ord: i64) -> Self {
        match item {
            PostItem::Text { id, text, style } => Self {
                id: id.clone(),
                post_id: post_id.to_string(),
                ord,
                kind: Self::KIND_TEXT.to_string(),
                text: Some(text.clone()),
                text_style: Some(style.as_str().to_string()),
                alt: None,
                description: None,
                file_name: None,
            },
            PostItem::Image {
                id,
                alt,
                description,
                file_name,
            } => Self {
                id: id.clone(),
                post_id: post_id.to_string(),
                ord,
                kind: Self::KIND_IMAGE.to_string(),
                text: None,
                text_style: None,
                alt: alt.clone(),
                description: description.clone(),
                file_name: Some(file_name.clone()),
            },
        }
    }

    /// Reconstruct the domain item from a stored row.
    ///
    /// Fails only on rows the application could not have written
    /// (unknown discriminator, missing variant fields).
    pub fn into_item(self) -> Result<PostItem, crate::error::AppError> {
        match self.kind.as_str() {
            Self::KIND_TEXT => {
                let text = self.text.unwrap_or_default();
                let style = self
                    .text_style
                    .as_deref()
                    .and_then(TextStyle::parse)
                    .ok_or_else(|| {
                        crate::error::AppError::Internal(anyhow::anyhow!(
                            "post item {} has invalid text style",
                            self.id
                        ))
                    })?;
                Ok(PostItem::Text {
                    id: self.id,
                    text,
                    style,
                })
            }
            Self::KIND_IMAGE => {
                let file_name = self.file_name.ok_or_else(|| {
                    crate::error::AppError::Internal(anyhow::anyhow!(
                        "post item {} has no file name",
                        self.id
                    ))
                })?;
                Ok(PostItem::Image {
                    id: self.id,
                    alt: self.alt,
                    description: self.description,
                    file_name,
                })
            }
            other => Err(crate::error::AppError::Internal(anyhow::anyhow!(
                "post item {} has unknown kind {other}",
                self.id
            ))),
        }
    }
}

// =============================================================================
// Comment
// =============================================================================

/// A comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub text: String,
    pub is_modified: bool,
    pub created_at: DateTime<Utc>,
}

/// Comment row joined with author display fields for listings
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub text: String,
    pub is_modified: bool,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    /// Tag of the author's blog, when the author has one
    pub user_blog_tag: Option<String>,
}

// =============================================================================
// Refresh token
// =============================================================================

/// A stored refresh token
///
/// Rotated in place on refresh (the token value changes, expiry does
/// not), deleted on revocation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
