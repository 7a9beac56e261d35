//! Comment service
//!
//! Comments hang off posts; only the author may change or remove one.

use std::sync::Arc;

use crate::clock::Clock;
use crate::data::{Comment, CommentView, Database, EntityId};
use crate::error::AppError;
use crate::service::{Page, PageParams, check_ownership};

const MAX_COMMENT_CHARS: usize = 2000;

/// Comment text, used by both create and update
#[derive(Debug, Clone)]
pub struct CommentInput {
    pub text: String,
}

/// Comment service
pub struct CommentService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Comment on a post
    ///
    /// The returned view denormalizes the author's name and blog tag
    /// for display.
    pub async fn create(
        &self,
        user_id: &str,
        post_id: &str,
        input: CommentInput,
    ) -> Result<CommentView, AppError> {
        validate_text(&input.text)?;

        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Post with id {post_id} was not found")))?;
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User with id {user_id} was not found")))?;

        let comment = Comment {
            id: EntityId::new().0,
            post_id: post.id.clone(),
            user_id: user.id.clone(),
            text: input.text,
            is_modified: false,
            created_at: self.clock.now(),
        };
        self.db.insert_comment(&comment).await?;

        let blog = self.db.get_blog_by_user(&user.id).await?;
        Ok(CommentView {
            id: comment.id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            text: comment.text,
            is_modified: comment.is_modified,
            created_at: comment.created_at,
            user_name: user.name,
            user_blog_tag: blog.map(|b| b.tag),
        })
    }

    /// Edit a comment, marking it modified
    pub async fn update(
        &self,
        user_id: &str,
        comment_id: &str,
        input: CommentInput,
    ) -> Result<CommentView, AppError> {
        validate_text(&input.text)?;

        let mut comment = self.fetch_owned(user_id, comment_id).await?;
        comment.text = input.text;
        comment.is_modified = true;
        self.db.update_comment(&comment).await?;

        self.db
            .get_comment_view(&comment.id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("comment {} vanished during update", comment.id))
            })
    }

    /// Remove a comment
    pub async fn delete(&self, user_id: &str, comment_id: &str) -> Result<(), AppError> {
        let comment = self.fetch_owned(user_id, comment_id).await?;
        self.db.delete_comment(&comment.id).await
    }

    /// Page of comments for a post, newest first
    pub async fn get_paged_by_post(
        &self,
        post_id: &str,
        params: PageParams,
    ) -> Result<Page<CommentView>, AppError> {
        let (limit, offset) = params.window()?;
        let data = self
            .db
            .get_comments_page_by_post(post_id, limit, offset)
            .await?;
        Ok(Page { data, params })
    }

    async fn fetch_owned(&self, user_id: &str, comment_id: &str) -> Result<Comment, AppError> {
        let comment = self.db.get_comment(comment_id).await?.ok_or_else(|| {
            AppError::not_found(format!("Comment with id {comment_id} was not found"))
        })?;
        check_ownership(&comment.user_id, user_id, "comment")?;
        Ok(comment)
    }
}

fn validate_text(text: &str) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if text.trim().is_empty() {
        errors.push("'text' must not be empty".to_string());
    }
    if text.chars().count() > MAX_COMMENT_CHARS {
        errors.push(format!(
            "'text' must be at most {MAX_COMMENT_CHARS} characters"
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}
