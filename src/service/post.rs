//! Post service
//!
//! Posts hold an ordered collection of text/image items. Creation
//! always mints fresh item identities; update reconciles the stored
//! collection against the submitted one by id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::clock::Clock;
use crate::data::{Database, EntityId, Post, PostItem, PostSummary, PostWithItems, TextStyle};
use crate::error::AppError;
use crate::service::{Page, PageParams, check_ownership};

const MAX_HEADER_CHARS: usize = 250;
const MAX_SUBHEADER_CHARS: usize = 500;

/// A submitted post item
///
/// `id` is `None` for new items. On update, a non-null id must refer
/// to an item already on the post.
#[derive(Debug, Clone)]
pub enum PostItemInput {
    Text {
        id: Option<String>,
        text: String,
        style: TextStyle,
    },
    Image {
        id: Option<String>,
        alt: Option<String>,
        description: Option<String>,
        file_name: String,
    },
}

impl PostItemInput {
    fn id(&self) -> Option<&str> {
        match self {
            Self::Text { id, .. } => id.as_deref(),
            Self::Image { id, .. } => id.as_deref(),
        }
    }

    /// Build a stored item with the given identity.
    fn into_item(self, id: String) -> PostItem {
        match self {
            Self::Text { text, style, .. } => PostItem::Text { id, text, style },
            Self::Image {
                alt,
                description,
                file_name,
                ..
            } => PostItem::Image {
                id,
                alt,
                description,
                file_name,
            },
        }
    }
}

/// Submitted post content, used by both create and update
#[derive(Debug, Clone)]
pub struct PostInput {
    pub header: String,
    pub subheader: Option<String>,
    pub items: Vec<PostItemInput>,
}

/// Post service
pub struct PostService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Create a post on a blog
    ///
    /// Every submitted item gets a fresh identity regardless of any
    /// submitted id; order is the submitted position.
    pub async fn create(
        &self,
        user_id: &str,
        blog_id: &str,
        input: PostInput,
    ) -> Result<PostWithItems, AppError> {
        validate_post_input(&input)?;

        let blog = self
            .db
            .get_blog(blog_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Blog with id {blog_id} was not found")))?;
        check_ownership(&blog.user_id, user_id, "post")?;

        let post = Post {
            id: EntityId::new().0,
            blog_id: blog.id.clone(),
            header: input.header,
            subheader: input.subheader,
            is_modified: false,
            created_at: self.clock.now(),
        };
        let items: Vec<PostItem> = input
            .items
            .into_iter()
            .map(|item| item.into_item(EntityId::new().0))
            .collect();

        self.db.insert_post_with_items(&post, &items).await?;

        tracing::info!(post_id = %post.id, blog_id = %post.blog_id, "post created");
        Ok(PostWithItems { post, items })
    }

    /// Update a post, reconciling its item collection
    ///
    /// See [`reconcile_items`] for the matching rules. The post is
    /// marked modified and the whole aggregate is persisted in one
    /// transaction.
    pub async fn update(
        &self,
        user_id: &str,
        post_id: &str,
        input: PostInput,
    ) -> Result<PostWithItems, AppError> {
        validate_post_input(&input)?;

        let PostWithItems { mut post, items } = self.fetch_owned(user_id, post_id).await?;

        let reconciled = reconcile_items(items, input.items)?;
        post.header = input.header;
        post.subheader = input.subheader;
        post.is_modified = true;

        self.db.update_post_with_items(&post, &reconciled).await?;

        tracing::info!(post_id = %post.id, items = reconciled.len(), "post updated");
        Ok(PostWithItems {
            post,
            items: reconciled,
        })
    }

    /// Delete a post; items and comments go with it
    pub async fn delete(&self, user_id: &str, post_id: &str) -> Result<(), AppError> {
        let PostWithItems { post, .. } = self.fetch_owned(user_id, post_id).await?;
        self.db.delete_post(&post.id).await?;
        tracing::info!(post_id = %post.id, "post deleted");
        Ok(())
    }

    /// Read a post with items in display order
    pub async fn get_by_id(&self, post_id: &str) -> Result<PostWithItems, AppError> {
        self.db
            .get_post_with_items(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Post with id {post_id} was not found")))
    }

    /// Page of post summaries across all blogs, newest first
    pub async fn get_paged(&self, params: PageParams) -> Result<Page<PostSummary>, AppError> {
        let (limit, offset) = params.window()?;
        let data = self.db.get_posts_page(limit, offset).await?;
        Ok(Page { data, params })
    }

    /// Page of post summaries for one blog, newest first
    pub async fn get_paged_by_blog(
        &self,
        blog_id: &str,
        params: PageParams,
    ) -> Result<Page<PostSummary>, AppError> {
        let (limit, offset) = params.window()?;
        let data = self.db.get_posts_page_by_blog(blog_id, limit, offset).await?;
        Ok(Page { data, params })
    }

    /// Load a post with items and verify the caller owns its blog.
    async fn fetch_owned(&self, user_id: &str, post_id: &str) -> Result<PostWithItems, AppError> {
        let loaded = self
            .db
            .get_post_with_items(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Post with id {post_id} was not found")))?;

        let blog = self.db.get_blog(&loaded.post.blog_id).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "post {} references missing blog {}",
                loaded.post.id,
                loaded.post.blog_id
            ))
        })?;
        check_ownership(&blog.user_id, user_id, "post")?;

        Ok(loaded)
    }
}

fn validate_post_input(input: &PostInput) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if input.header.chars().count() > MAX_HEADER_CHARS {
        errors.push(format!(
            "'header' must be at most {MAX_HEADER_CHARS} characters"
        ));
    }
    if let Some(subheader) = &input.subheader {
        if subheader.chars().count() > MAX_SUBHEADER_CHARS {
            errors.push(format!(
                "'subheader' must be at most {MAX_SUBHEADER_CHARS} characters"
            ));
        }
    }
    for (index, item) in input.items.iter().enumerate() {
        if let PostItemInput::Image { file_name, .. } = item {
            if file_name.trim().is_empty() {
                errors.push(format!("image item at position {index} has no file name"));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Reconcile a post's stored items against a submitted list
///
/// Rules, applied while walking the submitted list in order:
/// - a non-null id must match a stored item: the stored identity is
///   kept and the mutable fields are overwritten. An id that matches
///   nothing on this post fails with not-found, and a matched item
///   cannot change kind.
/// - a null id is always an insert with a fresh identity.
/// - stored items absent from the submission are dropped.
/// - the same id submitted twice is rejected outright.
///
/// The returned vector is the complete new collection; position in it
/// is the item's order, so orders are dense in `0..len` and follow
/// the submitted sequence. An empty submission clears the post.
pub fn reconcile_items(
    existing: Vec<PostItem>,
    submitted: Vec<PostItemInput>,
) -> Result<Vec<PostItem>, AppError> {
    let mut seen = HashSet::new();
    for id in submitted.iter().filter_map(PostItemInput::id) {
        if !seen.insert(id) {
            return Err(AppError::validation(format!(
                "Post item with id {id} was submitted more than once"
            )));
        }
    }

    let mut existing_by_id: HashMap<String, PostItem> = existing
        .into_iter()
        .map(|item| (item.id().to_string(), item))
        .collect();

    let mut reconciled = Vec::with_capacity(submitted.len());
    for item in submitted {
        match item.id() {
            Some(id) => {
                let matched = existing_by_id.remove(id).ok_or_else(|| {
                    AppError::not_found(format!(
                        "Post item with id {id} is not part of this post"
                    ))
                })?;
                reconciled.push(overwrite_matched(matched, item)?);
            }
            None => reconciled.push(item.into_item(EntityId::new().0)),
        }
    }

    // Whatever remains in the map was omitted from the submission and
    // is deleted by not being re-persisted.
    Ok(reconciled)
}

/// Overwrite a matched item's mutable fields, preserving identity.
fn overwrite_matched(matched: PostItem, submitted: PostItemInput) -> Result<PostItem, AppError> {
    let id = matched.id().to_string();
    match (matched, submitted) {
        (PostItem::Text { .. }, PostItemInput::Text { text, style, .. }) => {
            Ok(PostItem::Text { id, text, style })
        }
        (
            PostItem::Image { .. },
            PostItemInput::Image {
                alt,
                description,
                file_name,
                ..
            },
        ) => Ok(PostItem::Image {
            id,
            alt,
            description,
            file_name,
        }),
        (PostItem::Text { .. }, PostItemInput::Image { .. })
        | (PostItem::Image { .. }, PostItemInput::Text { .. }) => {
            Err(AppError::validation(format!(
                "Post item with id {id} cannot change its kind"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::data::{Blog, User};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn text_input(id: Option<&str>, text: &str) -> PostItemInput {
        PostItemInput::Text {
            id: id.map(ToOwned::to_owned),
            text: text.to_string(),
            style: TextStyle::Paragraph,
        }
    }

    fn image_input(id: Option<&str>, alt: &str, file_name: &str) -> PostItemInput {
        PostItemInput::Image {
            id: id.map(ToOwned::to_owned),
            alt: Some(alt.to_string()),
            description: None,
            file_name: file_name.to_string(),
        }
    }

    // =========================================================================
    // reconcile_items
    // =========================================================================

    #[test]
    fn reconcile_empty_submission_clears_all_items() {
        let existing = vec![
            PostItem::Text {
                id: EntityId::new().0,
                text: "a".to_string(),
                style: TextStyle::Heading,
            },
            PostItem::Image {
                id: EntityId::new().0,
                alt: None,
                description: None,
                file_name: "f.png".to_string(),
            },
        ];

        let reconciled = reconcile_items(existing, vec![]).unwrap();
        assert!(reconciled.is_empty());
    }

    #[test]
    fn reconcile_matches_updates_inserts_and_deletes() {
        let image_id = EntityId::new().0;
        let dropped_id = EntityId::new().0;
        let existing = vec![
            PostItem::Image {
                id: image_id.clone(),
                alt: Some("a".to_string()),
                description: None,
                file_name: "f.png".to_string(),
            },
            PostItem::Text {
                id: dropped_id.clone(),
                text: "b".to_string(),
                style: TextStyle::Paragraph,
            },
        ];

        let submitted = vec![
            image_input(Some(&image_id), "c", "f.png"),
            text_input(None, "d"),
        ];

        let reconciled = reconcile_items(existing, submitted).unwrap();
        assert_eq!(reconciled.len(), 2);

        // First item kept its identity with overwritten fields
        match &reconciled[0] {
            PostItem::Image { id, alt, .. } => {
                assert_eq!(id, &image_id);
                assert_eq!(alt.as_deref(), Some("c"));
            }
            other => panic!("expected image, got {other:?}"),
        }

        // Second is a fresh insert
        match &reconciled[1] {
            PostItem::Text { id, text, .. } => {
                assert_ne!(id, &dropped_id);
                assert_ne!(id, &image_id);
                assert_eq!(text, "d");
            }
            other => panic!("expected text, got {other:?}"),
        }

        // The omitted text item is gone
        assert!(reconciled.iter().all(|item| item.id() != dropped_id));
    }

    #[test]
    fn reconcile_preserves_submitted_order_on_reorder() {
        let first = EntityId::new().0;
        let second = EntityId::new().0;
        let existing = vec![
            PostItem::Text {
                id: first.clone(),
                text: "one".to_string(),
                style: TextStyle::Paragraph,
            },
            PostItem::Text {
                id: second.clone(),
                text: "two".to_string(),
                style: TextStyle::Paragraph,
            },
        ];

        let submitted = vec![
            text_input(Some(&second), "two"),
            text_input(Some(&first), "one"),
        ];

        let reconciled = reconcile_items(existing, submitted).unwrap();
        assert_eq!(reconciled[0].id(), second);
        assert_eq!(reconciled[1].id(), first);
    }

    #[test]
    fn reconcile_rejects_unknown_id() {
        let error = reconcile_items(vec![], vec![text_input(Some("no-such-id"), "x")]).unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[test]
    fn reconcile_rejects_duplicate_ids() {
        let id = EntityId::new().0;
        let existing = vec![PostItem::Text {
            id: id.clone(),
            text: "a".to_string(),
            style: TextStyle::Paragraph,
        }];

        let submitted = vec![text_input(Some(&id), "b"), text_input(Some(&id), "c")];
        let error = reconcile_items(existing, submitted).unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }

    #[test]
    fn reconcile_rejects_kind_change() {
        let id = EntityId::new().0;
        let existing = vec![PostItem::Text {
            id: id.clone(),
            text: "a".to_string(),
            style: TextStyle::Paragraph,
        }];

        let error =
            reconcile_items(existing, vec![image_input(Some(&id), "alt", "f.png")]).unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }

    #[test]
    fn reconcile_fresh_inserts_get_distinct_ids() {
        let reconciled = reconcile_items(
            vec![],
            vec![text_input(None, "a"), text_input(None, "b"), text_input(None, "c")],
        )
        .unwrap();

        let ids: HashSet<&str> = reconciled.iter().map(PostItem::id).collect();
        assert_eq!(ids.len(), 3);
    }

    // =========================================================================
    // PostService
    // =========================================================================

    struct Fixture {
        db: Arc<Database>,
        clock: Arc<FixedClock>,
        service: PostService,
        user: User,
        blog: Blog,
        _temp_dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("post-service.db"))
                .await
                .unwrap(),
        );
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
        ));
        let service = PostService::new(db.clone(), clock.clone());

        let user = User {
            id: EntityId::new().0,
            email: "author@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Author".to_string(),
            avatar_file_name: None,
            created_at: clock.now(),
        };
        db.insert_user(&user).await.unwrap();

        let blog = Blog {
            id: EntityId::new().0,
            user_id: user.id.clone(),
            name: user.name.clone(),
            tag: "authorblog".to_string(),
            description: None,
            avatar_file_name: None,
            created_at: clock.now(),
        };
        db.insert_blog(&blog).await.unwrap();

        Fixture {
            db,
            clock,
            service,
            user,
            blog,
            _temp_dir: temp_dir,
        }
    }

    fn post_input(items: Vec<PostItemInput>) -> PostInput {
        PostInput {
            header: "A post".to_string(),
            subheader: Some("with items".to_string()),
            items,
        }
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids_and_dense_order() {
        let f = fixture().await;

        let created = f
            .service
            .create(
                &f.user.id,
                &f.blog.id,
                post_input(vec![
                    image_input(Some("submitted-id-is-ignored"), "a", "f.png"),
                    text_input(None, "b"),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(created.post.created_at, f.clock.now());
        assert!(!created.post.is_modified);
        assert_eq!(created.items.len(), 2);
        assert_ne!(created.items[0].id(), "submitted-id-is-ignored");

        // Stored in submitted order
        let loaded = f.db.get_post_with_items(&created.post.id).await.unwrap().unwrap();
        assert_eq!(loaded.items, created.items);
        match (&loaded.items[0], &loaded.items[1]) {
            (PostItem::Image { alt, .. }, PostItem::Text { text, .. }) => {
                assert_eq!(alt.as_deref(), Some("a"));
                assert_eq!(text, "b");
            }
            other => panic!("items out of order: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_rejects_missing_blog_and_foreign_blog() {
        let f = fixture().await;

        let error = f
            .service
            .create(&f.user.id, "missing-blog", post_input(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));

        let error = f
            .service
            .create("someone-else", &f.blog.id, post_input(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            AppError::Validation(messages)
                if messages == vec!["This post belongs to another user".to_string()]
        ));
    }

    #[tokio::test]
    async fn create_rejects_overlong_header() {
        let f = fixture().await;

        let input = PostInput {
            header: "h".repeat(MAX_HEADER_CHARS + 1),
            subheader: None,
            items: vec![],
        };
        let error = f.service.create(&f.user.id, &f.blog.id, input).await.unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_reconciles_and_marks_modified() {
        let f = fixture().await;

        let created = f
            .service
            .create(
                &f.user.id,
                &f.blog.id,
                post_input(vec![image_input(None, "a", "f.png"), text_input(None, "b")]),
            )
            .await
            .unwrap();
        let image_id = created.items[0].id().to_string();

        let updated = f
            .service
            .update(
                &f.user.id,
                &created.post.id,
                post_input(vec![
                    image_input(Some(&image_id), "c", "f.png"),
                    text_input(None, "d"),
                ]),
            )
            .await
            .unwrap();

        assert!(updated.post.is_modified);
        assert_eq!(updated.items.len(), 2);
        assert_eq!(updated.items[0].id(), image_id);
        match &updated.items[0] {
            PostItem::Image { alt, .. } => assert_eq!(alt.as_deref(), Some("c")),
            other => panic!("expected image, got {other:?}"),
        }
        assert_ne!(updated.items[1].id(), created.items[1].id());

        // Persisted state matches, in order
        let loaded = f.db.get_post_with_items(&created.post.id).await.unwrap().unwrap();
        assert_eq!(loaded.items, updated.items);
    }

    #[tokio::test]
    async fn update_removes_omitted_items() {
        let f = fixture().await;

        let created = f
            .service
            .create(
                &f.user.id,
                &f.blog.id,
                post_input(vec![image_input(None, "a", "f.png"), text_input(None, "b")]),
            )
            .await
            .unwrap();

        let updated = f
            .service
            .update(
                &f.user.id,
                &created.post.id,
                post_input(vec![text_input(None, "only")]),
            )
            .await
            .unwrap();

        assert_eq!(updated.items.len(), 1);
        let loaded = f.db.get_post_items(&created.post.id).await.unwrap();
        assert_eq!(loaded.len(), 1);
        match &loaded[0] {
            PostItem::Text { text, .. } => assert_eq!(text, "only"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_rejects_foreign_user_without_mutating() {
        let f = fixture().await;

        let created = f
            .service
            .create(&f.user.id, &f.blog.id, post_input(vec![text_input(None, "a")]))
            .await
            .unwrap();

        let error = f
            .service
            .update(
                "someone-else",
                &created.post.id,
                post_input(vec![]),
            )
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));

        // Nothing changed
        let loaded = f.db.get_post_with_items(&created.post.id).await.unwrap().unwrap();
        assert!(!loaded.post.is_modified);
        assert_eq!(loaded.items.len(), 1);
    }

    #[tokio::test]
    async fn update_rejects_item_from_another_post() {
        let f = fixture().await;

        let first = f
            .service
            .create(&f.user.id, &f.blog.id, post_input(vec![text_input(None, "a")]))
            .await
            .unwrap();
        let second = f
            .service
            .create(&f.user.id, &f.blog.id, post_input(vec![text_input(None, "b")]))
            .await
            .unwrap();

        let foreign_item_id = first.items[0].id();
        let error = f
            .service
            .update(
                &f.user.id,
                &second.post.id,
                post_input(vec![text_input(Some(foreign_item_id), "c")]),
            )
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_post_and_enforces_ownership() {
        let f = fixture().await;

        let created = f
            .service
            .create(&f.user.id, &f.blog.id, post_input(vec![text_input(None, "a")]))
            .await
            .unwrap();

        let error = f
            .service
            .delete("someone-else", &created.post.id)
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));

        f.service.delete(&f.user.id, &created.post.id).await.unwrap();
        assert!(f.db.get_post(&created.post.id).await.unwrap().is_none());

        let error = f.service.get_by_id(&created.post.id).await.unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_paged_validates_and_orders_newest_first() {
        let f = fixture().await;

        for i in 0..3 {
            f.clock.advance(chrono::Duration::minutes(1));
            f.service
                .create(
                    &f.user.id,
                    &f.blog.id,
                    PostInput {
                        header: format!("Post {i}"),
                        subheader: None,
                        items: vec![],
                    },
                )
                .await
                .unwrap();
        }

        let error = f
            .service
            .get_paged(PageParams { page: 0, per_page: 0 })
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));

        let page = f
            .service
            .get_paged(PageParams { page: 1, per_page: 2 })
            .await
            .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].header, "Post 2");
        assert_eq!(page.params, PageParams { page: 1, per_page: 2 });

        let by_blog = f
            .service
            .get_paged_by_blog(&f.blog.id, PageParams { page: 2, per_page: 2 })
            .await
            .unwrap();
        assert_eq!(by_blog.data.len(), 1);
        assert_eq!(by_blog.data[0].header, "Post 0");
        assert_eq!(by_blog.data[0].blog_tag, "authorblog");
    }
}
