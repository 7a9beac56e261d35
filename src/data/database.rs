//! SQLite database operations
//!
//! All database access goes through this module. Each public method is
//! a named, reusable query shape; services never build SQL themselves.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

use super::models::*;
use crate::error::AppError;
use crate::metrics::DB_QUERIES_TOTAL;

fn record_query(operation: &str, table: &str) {
    DB_QUERIES_TOTAL.with_label_values(&[operation, table]).inc();
}

/// Database connection pool wrapper.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            // Cascade deletes (post -> items/comments) rely on this
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user row.
    ///
    /// A concurrent insert with the same email surfaces as a database
    /// unique violation; the identity layer translates it.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        record_query("insert", "users");
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, avatar_file_name, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.avatar_file_name)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        record_query("select", "users");
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Look up a user by login name (email, case-insensitive).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        record_query("select", "users");
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user_email_exists(&self, email: &str) -> Result<bool, AppError> {
        record_query("select", "users");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Update a user's mutable fields and, when present, the mirrored
    /// display fields of the owned blog, atomically.
    pub async fn update_user_with_blog(
        &self,
        user: &User,
        blog: Option<&Blog>,
    ) -> Result<(), AppError> {
        record_query("update", "users");
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET name = ?, avatar_file_name = ? WHERE id = ?")
            .bind(&user.name)
            .bind(&user.avatar_file_name)
            .bind(&user.id)
            .execute(&mut *tx)
            .await?;

        if let Some(blog) = blog {
            sqlx::query(
                "UPDATE blogs SET name = ?, tag = ?, description = ?, avatar_file_name = ?
                 WHERE id = ?",
            )
            .bind(&blog.name)
            .bind(&blog.tag)
            .bind(&blog.description)
            .bind(&blog.avatar_file_name)
            .bind(&blog.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Roles
    // =========================================================================

    /// Grant a role to a user. Granting an already-held role is a no-op.
    pub async fn add_user_role(&self, user_id: &str, role: &str) -> Result<(), AppError> {
        record_query("insert", "user_roles");
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES (?, ?)
             ON CONFLICT (user_id, role) DO NOTHING",
        )
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user_roles(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        record_query("select", "user_roles");
        let roles =
            sqlx::query_scalar::<_, String>("SELECT role FROM user_roles WHERE user_id = ? ORDER BY role")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(roles)
    }

    // =========================================================================
    // Blogs
    // =========================================================================

    pub async fn insert_blog(&self, blog: &Blog) -> Result<(), AppError> {
        record_query("insert", "blogs");
        sqlx::query(
            "INSERT INTO blogs (id, user_id, name, tag, description, avatar_file_name, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&blog.id)
        .bind(&blog.user_id)
        .bind(&blog.name)
        .bind(&blog.tag)
        .bind(&blog.description)
        .bind(&blog.avatar_file_name)
        .bind(blog.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_blog(&self, id: &str) -> Result<Option<Blog>, AppError> {
        record_query("select", "blogs");
        let blog = sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(blog)
    }

    pub async fn get_blog_by_user(&self, user_id: &str) -> Result<Option<Blog>, AppError> {
        record_query("select", "blogs");
        let blog = sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(blog)
    }

    /// Look up a blog by its normalized tag.
    pub async fn get_blog_by_tag(&self, tag: &str) -> Result<Option<Blog>, AppError> {
        record_query("select", "blogs");
        let blog = sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE tag = ?")
            .bind(tag)
            .fetch_optional(&self.pool)
            .await?;
        Ok(blog)
    }

    pub async fn blog_tag_exists(&self, tag: &str) -> Result<bool, AppError> {
        record_query("select", "blogs");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blogs WHERE tag = ?")
            .bind(tag)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Update a blog and the mirrored fields of its owning user atomically.
    pub async fn update_blog_with_user(&self, blog: &Blog, user: &User) -> Result<(), AppError> {
        record_query("update", "blogs");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE blogs SET name = ?, tag = ?, description = ?, avatar_file_name = ?
             WHERE id = ?",
        )
        .bind(&blog.name)
        .bind(&blog.tag)
        .bind(&blog.description)
        .bind(&blog.avatar_file_name)
        .bind(&blog.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET name = ?, avatar_file_name = ? WHERE id = ?")
            .bind(&user.name)
            .bind(&user.avatar_file_name)
            .bind(&user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a post together with its items in one transaction.
    ///
    /// Item order is the position within the slice.
    pub async fn insert_post_with_items(
        &self,
        post: &Post,
        items: &[PostItem],
    ) -> Result<(), AppError> {
        record_query("insert", "posts");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO posts (id, blog_id, header, subheader, is_modified, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.id)
        .bind(&post.blog_id)
        .bind(&post.header)
        .bind(&post.subheader)
        .bind(post.is_modified)
        .bind(post.created_at)
        .execute(&mut *tx)
        .await?;

        for (ord, item) in items.iter().enumerate() {
            let row = PostItemRow::from_item(item, &post.id, ord as i64);
            insert_post_item_row(&mut tx, &row).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Persist the reconciled state of a post and its items.
    ///
    /// The item slice is the complete new collection in display order;
    /// rows absent from it are deleted, retained rows keep their ids.
    /// Runs as one transaction so no partial aggregate write is visible.
    pub async fn update_post_with_items(
        &self,
        post: &Post,
        items: &[PostItem],
    ) -> Result<(), AppError> {
        record_query("update", "posts");
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE posts SET header = ?, subheader = ?, is_modified = ? WHERE id = ?")
            .bind(&post.header)
            .bind(&post.subheader)
            .bind(post.is_modified)
            .bind(&post.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM post_items WHERE post_id = ?")
            .bind(&post.id)
            .execute(&mut *tx)
            .await?;

        for (ord, item) in items.iter().enumerate() {
            let row = PostItemRow::from_item(item, &post.id, ord as i64);
            insert_post_item_row(&mut tx, &row).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        record_query("select", "posts");
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    /// Load a post with its items ordered by position.
    pub async fn get_post_with_items(&self, id: &str) -> Result<Option<PostWithItems>, AppError> {
        let Some(post) = self.get_post(id).await? else {
            return Ok(None);
        };
        let items = self.get_post_items(&post.id).await?;
        Ok(Some(PostWithItems { post, items }))
    }

    pub async fn get_post_items(&self, post_id: &str) -> Result<Vec<PostItem>, AppError> {
        record_query("select", "post_items");
        let rows = sqlx::query_as::<_, PostItemRow>(
            "SELECT * FROM post_items WHERE post_id = ? ORDER BY ord",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PostItemRow::into_item).collect()
    }

    /// Delete a post; items and comments cascade.
    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        record_query("delete", "posts");
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Page of post summaries across all blogs, newest first.
    pub async fn get_posts_page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostSummary>, AppError> {
        record_query("select", "posts");
        let posts = sqlx::query_as::<_, PostSummary>(
            "SELECT p.id, p.header, p.subheader, p.is_modified, p.created_at, b.tag AS blog_tag
             FROM posts p JOIN blogs b ON b.id = p.blog_id
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    /// Page of post summaries for one blog, newest first.
    pub async fn get_posts_page_by_blog(
        &self,
        blog_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostSummary>, AppError> {
        record_query("select", "posts");
        let posts = sqlx::query_as::<_, PostSummary>(
            "SELECT p.id, p.header, p.subheader, p.is_modified, p.created_at, b.tag AS blog_tag
             FROM posts p JOIN blogs b ON b.id = p.blog_id
             WHERE p.blog_id = ?
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(blog_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        record_query("insert", "comments");
        sqlx::query(
            "INSERT INTO comments (id, post_id, user_id, text, is_modified, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.user_id)
        .bind(&comment.text)
        .bind(comment.is_modified)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        record_query("select", "comments");
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    pub async fn update_comment(&self, comment: &Comment) -> Result<(), AppError> {
        record_query("update", "comments");
        sqlx::query("UPDATE comments SET text = ?, is_modified = ? WHERE id = ?")
            .bind(&comment.text)
            .bind(comment.is_modified)
            .bind(&comment.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        record_query("delete", "comments");
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Page of comments for a post, newest first, joined with author
    /// display fields.
    pub async fn get_comments_page_by_post(
        &self,
        post_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentView>, AppError> {
        record_query("select", "comments");
        let comments = sqlx::query_as::<_, CommentView>(
            "SELECT c.id, c.post_id, c.user_id, c.text, c.is_modified, c.created_at,
                    u.name AS user_name, b.tag AS user_blog_tag
             FROM comments c
             JOIN users u ON u.id = c.user_id
             LEFT JOIN blogs b ON b.user_id = c.user_id
             WHERE c.post_id = ?
             ORDER BY c.created_at DESC, c.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    /// Look up a comment joined with author display fields.
    pub async fn get_comment_view(&self, id: &str) -> Result<Option<CommentView>, AppError> {
        record_query("select", "comments");
        let comment = sqlx::query_as::<_, CommentView>(
            "SELECT c.id, c.post_id, c.user_id, c.text, c.is_modified, c.created_at,
                    u.name AS user_name, b.tag AS user_blog_tag
             FROM comments c
             JOIN users u ON u.id = c.user_id
             LEFT JOIN blogs b ON b.user_id = c.user_id
             WHERE c.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    // =========================================================================
    // Refresh tokens
    // =========================================================================

    pub async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError> {
        record_query("insert", "refresh_tokens");
        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token.id)
        .bind(&token.user_id)
        .bind(&token.token)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a stored refresh token by owner and token value.
    pub async fn get_refresh_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<Option<RefreshToken>, AppError> {
        record_query("select", "refresh_tokens");
        let row = sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens WHERE user_id = ? AND token = ?",
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Rotate a refresh token in place (token value changes, expiry
    /// does not).
    pub async fn update_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError> {
        record_query("update", "refresh_tokens");
        sqlx::query("UPDATE refresh_tokens SET token = ?, expires_at = ? WHERE id = ?")
            .bind(&token.token)
            .bind(token.expires_at)
            .bind(&token.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_refresh_token(&self, id: &str) -> Result<(), AppError> {
        record_query("delete", "refresh_tokens");
        sqlx::query("DELETE FROM refresh_tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

async fn insert_post_item_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    row: &PostItemRow,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO post_items (id, post_id, ord, kind, text, text_style, alt, description, file_name)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.post_id)
    .bind(row.ord)
    .bind(&row.kind)
    .bind(&row.text)
    .bind(&row.text_style)
    .bind(&row.alt)
    .bind(&row.description)
    .bind(&row.file_name)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
