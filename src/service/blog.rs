//! Blog service
//!
//! One blog per user with a globally unique tag. The blog mirrors its
//! owner's display name and avatar; updates keep both sides in sync.

use std::sync::Arc;

use crate::auth::Identity;
use crate::clock::Clock;
use crate::data::{Blog, Database, EntityId, roles};
use crate::error::{AppError, is_unique_violation};
use crate::service::check_ownership;
use crate::storage::MediaStorage;

const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Blog creation input
#[derive(Debug, Clone)]
pub struct CreateBlogInput {
    pub tag: String,
    pub description: Option<String>,
}

/// Blog update input
#[derive(Debug, Clone)]
pub struct UpdateBlogInput {
    pub name: String,
    pub tag: String,
    pub description: Option<String>,
    pub avatar_file_name: Option<String>,
}

/// Blog service
pub struct BlogService {
    db: Arc<Database>,
    identity: Arc<Identity>,
    storage: Arc<MediaStorage>,
    clock: Arc<dyn Clock>,
}

impl BlogService {
    pub fn new(
        db: Arc<Database>,
        identity: Arc<Identity>,
        storage: Arc<MediaStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            identity,
            storage,
            clock,
        }
    }

    /// Create the caller's blog
    ///
    /// Seeded from the user's current name and avatar; grants the
    /// author role. The tag unique index backs the pre-check under
    /// race.
    pub async fn create(&self, user_id: &str, input: CreateBlogInput) -> Result<Blog, AppError> {
        validate_tag_and_description(&input.tag, input.description.as_deref())?;

        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User with id {user_id} was not found")))?;

        if self.db.get_blog_by_user(&user.id).await?.is_some() {
            return Err(AppError::already_exists("User already has a blog"));
        }

        let tag = normalize_tag(&input.tag);
        if self.db.blog_tag_exists(&tag).await? {
            return Err(AppError::already_exists(format!(
                "Blog with tag {tag} already exists"
            )));
        }

        let blog = Blog {
            id: EntityId::new().0,
            user_id: user.id.clone(),
            name: user.name.clone(),
            tag: tag.clone(),
            description: input.description,
            avatar_file_name: user.avatar_file_name.clone(),
            created_at: self.clock.now(),
        };

        if let Err(error) = self.db.insert_blog(&blog).await {
            if let AppError::Database(db_error) = &error {
                if is_unique_violation(db_error) {
                    return Err(AppError::already_exists(format!(
                        "Blog with tag {tag} already exists"
                    )));
                }
            }
            return Err(error);
        }

        self.identity.add_to_role(&user.id, roles::AUTHOR).await?;

        tracing::info!(blog_id = %blog.id, tag = %blog.tag, "blog created");
        Ok(blog)
    }

    /// Update the caller's blog
    ///
    /// Name and avatar are mirrored back onto the owning user.
    pub async fn update(
        &self,
        user_id: &str,
        blog_id: &str,
        input: UpdateBlogInput,
    ) -> Result<Blog, AppError> {
        let mut errors = Vec::new();
        if input.name.trim().is_empty() {
            errors.push("'name' must not be empty".to_string());
        }
        if let Err(AppError::Validation(mut tag_errors)) =
            validate_tag_and_description(&input.tag, input.description.as_deref())
        {
            errors.append(&mut tag_errors);
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let mut blog = self
            .db
            .get_blog(blog_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Blog with id {blog_id} was not found")))?;
        check_ownership(&blog.user_id, user_id, "blog")?;

        let tag = normalize_tag(&input.tag);
        if tag != blog.tag && self.db.blog_tag_exists(&tag).await? {
            return Err(AppError::already_exists(format!(
                "Blog with tag {tag} already exists"
            )));
        }

        if let Some(avatar) = input.avatar_file_name.as_deref() {
            let changed = blog.avatar_file_name.as_deref() != Some(avatar);
            if changed && !avatar.is_empty() && !self.storage.exists(avatar).await? {
                return Err(AppError::validation(format!(
                    "Image with name {avatar} was not found"
                )));
            }
        }

        let mut user = self.db.get_user(&blog.user_id).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "blog {} references missing user {}",
                blog.id,
                blog.user_id
            ))
        })?;

        blog.name = input.name.trim().to_string();
        blog.tag = tag;
        blog.description = input.description;
        blog.avatar_file_name = input.avatar_file_name;
        user.name = blog.name.clone();
        user.avatar_file_name = blog.avatar_file_name.clone();

        if let Err(error) = self.db.update_blog_with_user(&blog, &user).await {
            if let AppError::Database(db_error) = &error {
                if is_unique_violation(db_error) {
                    return Err(AppError::already_exists(format!(
                        "Blog with tag {} already exists",
                        blog.tag
                    )));
                }
            }
            return Err(error);
        }

        tracing::info!(blog_id = %blog.id, "blog updated");
        Ok(blog)
    }

    /// Look up a blog by its tag
    pub async fn get_by_tag(&self, tag: &str) -> Result<Blog, AppError> {
        let tag = normalize_tag(tag);
        self.db
            .get_blog_by_tag(&tag)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Blog with tag {tag} was not found")))
    }
}

/// Trim and lower-case a tag. Idempotent.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

fn validate_tag_and_description(
    tag: &str,
    description: Option<&str>,
) -> Result<(), AppError> {
    let mut errors = Vec::new();

    let trimmed = tag.trim();
    if trimmed.is_empty() {
        errors.push("'tag' must not be empty".to_string());
    } else if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push("'tag' must have only letters and numbers".to_string());
    }

    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            errors.push(format!(
                "'description' must be at most {MAX_DESCRIPTION_CHARS} characters"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::data::User;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    struct Fixture {
        db: Arc<Database>,
        service: BlogService,
        user: User,
        _temp_dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("blog-service.db"))
                .await
                .unwrap(),
        );
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
        ));
        let identity = Arc::new(Identity::new(db.clone()));
        let storage = crate::service::testutil::test_storage().await;
        let service = BlogService::new(db.clone(), identity, storage, clock.clone());

        let user = User {
            id: EntityId::new().0,
            email: "owner@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Owner".to_string(),
            avatar_file_name: Some("avatar.png".to_string()),
            created_at: clock.now(),
        };
        db.insert_user(&user).await.unwrap();

        Fixture {
            db,
            service,
            user,
            _temp_dir: temp_dir,
        }
    }

    fn create_input(tag: &str) -> CreateBlogInput {
        CreateBlogInput {
            tag: tag.to_string(),
            description: Some("About things".to_string()),
        }
    }

    #[test]
    fn normalize_tag_trims_lowercases_and_is_idempotent() {
        assert_eq!(normalize_tag("  MyBlog  "), "myblog");
        assert_eq!(normalize_tag(&normalize_tag("  MyBlog  ")), "myblog");
    }

    #[tokio::test]
    async fn create_seeds_blog_from_user_and_grants_author() {
        let f = fixture().await;

        let blog = f.service.create(&f.user.id, create_input("  MyBlog ")).await.unwrap();
        assert_eq!(blog.tag, "myblog");
        assert_eq!(blog.name, "Owner");
        assert_eq!(blog.avatar_file_name.as_deref(), Some("avatar.png"));

        let granted = f.db.get_user_roles(&f.user.id).await.unwrap();
        assert!(granted.contains(&roles::AUTHOR.to_string()));
    }

    #[tokio::test]
    async fn create_rejects_second_blog_for_same_user() {
        let f = fixture().await;

        f.service.create(&f.user.id, create_input("first")).await.unwrap();
        let error = f
            .service
            .create(&f.user.id, create_input("second"))
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn create_rejects_taken_tag_case_insensitively() {
        let f = fixture().await;
        f.service.create(&f.user.id, create_input("taken")).await.unwrap();

        let other = User {
            id: EntityId::new().0,
            email: "other@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Other".to_string(),
            avatar_file_name: None,
            created_at: Utc::now(),
        };
        f.db.insert_user(&other).await.unwrap();

        let error = f
            .service
            .create(&other.id, create_input(" TAKEN "))
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::AlreadyExists(_)));

        // No second blog row was written
        assert!(f.db.get_blog_by_user(&other.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_invalid_tag_characters() {
        let f = fixture().await;
        let error = f
            .service
            .create(&f.user.id, create_input("not a tag!"))
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_applies_fields_and_mirrors_user() {
        let f = fixture().await;
        let blog = f.service.create(&f.user.id, create_input("myblog")).await.unwrap();

        let updated = f
            .service
            .update(
                &f.user.id,
                &blog.id,
                UpdateBlogInput {
                    name: "New Name".to_string(),
                    tag: "newtag".to_string(),
                    description: None,
                    avatar_file_name: Some("avatar.png".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.tag, "newtag");
        assert_eq!(updated.name, "New Name");

        let user = f.db.get_user(&f.user.id).await.unwrap().unwrap();
        assert_eq!(user.name, "New Name");
    }

    #[tokio::test]
    async fn update_rejects_foreign_owner() {
        let f = fixture().await;
        let blog = f.service.create(&f.user.id, create_input("myblog")).await.unwrap();

        let error = f
            .service
            .update(
                "someone-else",
                &blog.id,
                UpdateBlogInput {
                    name: "X".to_string(),
                    tag: "myblog".to_string(),
                    description: None,
                    avatar_file_name: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            AppError::Validation(messages)
                if messages == vec!["This blog belongs to another user".to_string()]
        ));
    }

    #[tokio::test]
    async fn get_by_tag_normalizes_before_lookup() {
        let f = fixture().await;
        let blog = f.service.create(&f.user.id, create_input("myblog")).await.unwrap();

        let found = f.service.get_by_tag("  MYBLOG ").await.unwrap();
        assert_eq!(found.id, blog.id);

        let error = f.service.get_by_tag("unknown").await.unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));
    }
}
