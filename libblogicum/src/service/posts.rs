//! Post service: detail view and author-only editing

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{BlogError, Result};
use crate::store::BlogStore;
use crate::types::{CommentView, NewPost, Post, PostSummary, UserId, ViewContext};
use crate::validation::{validate_text, validate_title, MAX_TITLE_LEN};

/// Post service
pub struct PostService {
    store: Arc<dyn BlogStore>,
}

/// Fields a user may set on their post
#[derive(Debug, Clone)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub image: Option<String>,
}

impl PostForm {
    /// A form pre-filled from an existing post
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date,
            is_published: post.is_published,
            category_id: post.category_id,
            location_id: post.location_id,
            image: post.image.clone(),
        }
    }
}

/// A post with its comments, oldest first
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostSummary,
    pub comments: Vec<CommentView>,
}

impl PostService {
    /// Create a new post service
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Show one post
    ///
    /// An unpublished location is left out of the result.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the post does not exist or `ctx.viewer` may
    /// not see it.
    pub async fn detail(&self, post_id: i64, ctx: &ViewContext) -> Result<PostDetail> {
        let mut post = self
            .store
            .get_post_summary(post_id)
            .await?
            .filter(|p| p.is_visible_to(ctx))
            .ok_or_else(|| BlogError::not_found("Post", post_id))?;
        if post.location.as_ref().is_some_and(|l| !l.is_published) {
            post.location = None;
            post.post.location_id = None;
        }

        let comments = self.store.list_comments(post_id).await?;

        Ok(PostDetail { post, comments })
    }

    /// Publish a new post on behalf of `author_id`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the form fails validation or refers to an
    /// unknown category or an unknown or unpublished location.
    pub async fn create(&self, author_id: UserId, form: PostForm) -> Result<Post> {
        self.validate(&form, None).await?;

        let post = self
            .store
            .create_post(&NewPost {
                title: form.title,
                text: form.text,
                pub_date: form.pub_date,
                is_published: form.is_published,
                author_id,
                location_id: form.location_id,
                category_id: form.category_id,
                image: form.image,
            })
            .await?;

        tracing::info!(post_id = post.id, author_id, "Created post");
        Ok(post)
    }

    /// Replace the editable fields of a post
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing post, `PermissionDenied` if
    /// `actor_id` is not the author, `InvalidInput` for a bad form.
    pub async fn update(&self, post_id: i64, actor_id: UserId, form: PostForm) -> Result<Post> {
        let existing = self.owned_post(post_id, actor_id).await?;
        self.validate(&form, existing.location_id).await?;

        let updated = Post {
            title: form.title,
            text: form.text,
            pub_date: form.pub_date,
            is_published: form.is_published,
            category_id: form.category_id,
            location_id: form.location_id,
            image: form.image,
            ..existing
        };
        self.store.update_post(&updated).await?;

        tracing::info!(post_id, actor_id, "Updated post");
        self.store
            .get_post(post_id)
            .await?
            .ok_or_else(|| BlogError::not_found("Post", post_id))
    }

    /// Delete a post and its comments
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing post, `PermissionDenied` if
    /// `actor_id` is not the author.
    pub async fn delete(&self, post_id: i64, actor_id: UserId) -> Result<()> {
        self.owned_post(post_id, actor_id).await?;
        self.store.delete_post(post_id).await?;
        tracing::info!(post_id, actor_id, "Deleted post");
        Ok(())
    }

    /// Fetch a post for editing by `actor_id`
    pub async fn owned_post(&self, post_id: i64, actor_id: UserId) -> Result<Post> {
        let post = self
            .store
            .get_post(post_id)
            .await?
            .ok_or_else(|| BlogError::not_found("Post", post_id))?;

        if post.author_id != actor_id {
            tracing::warn!(post_id, actor_id, "Refused to modify another user's post");
            return Err(BlogError::PermissionDenied(format!(
                "Post {} belongs to another user",
                post_id
            )));
        }
        Ok(post)
    }

    /// `current_location` may stay attached even if it has since been
    /// unpublished; any other location must be published.
    async fn validate(&self, form: &PostForm, current_location: Option<i64>) -> Result<()> {
        validate_title("Title", &form.title, MAX_TITLE_LEN)?;
        validate_text("Text", &form.text)?;

        if let Some(id) = form.category_id {
            if self.store.get_category(id).await?.is_none() {
                return Err(BlogError::InvalidInput(format!("Unknown category: {}", id)));
            }
        }
        if let Some(id) = form.location_id.filter(|id| Some(*id) != current_location) {
            let published = self
                .store
                .get_location(id)
                .await?
                .is_some_and(|l| l.is_published);
            if !published {
                return Err(BlogError::InvalidInput(format!("Unknown location: {}", id)));
            }
        }
        Ok(())
    }
}
