//! Comment service

use std::sync::Arc;

use crate::error::{BlogError, Result};
use crate::store::BlogStore;
use crate::types::{Comment, NewComment, UserId, ViewContext};
use crate::validation::validate_text;

/// Comment service
///
/// Anyone who can see a post may comment on it; only a comment's author
/// may edit or delete it.
pub struct CommentService {
    store: Arc<dyn BlogStore>,
}

impl CommentService {
    /// Create a new comment service
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Add a comment by `ctx.viewer` to a post
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for an anonymous context, `NotFound` if
    /// the post is missing or invisible to the commenter, `InvalidInput`
    /// for blank text.
    pub async fn add(&self, post_id: i64, text: &str, ctx: &ViewContext) -> Result<Comment> {
        let author_id = ctx.viewer.ok_or_else(|| {
            BlogError::PermissionDenied("Sign in to leave a comment".to_string())
        })?;

        self.store
            .get_post_summary(post_id)
            .await?
            .filter(|p| p.is_visible_to(ctx))
            .ok_or_else(|| BlogError::not_found("Post", post_id))?;
        validate_text("Comment", text)?;

        let comment = self
            .store
            .create_comment(&NewComment {
                post_id,
                author_id,
                text: text.to_string(),
            })
            .await?;

        tracing::info!(comment_id = comment.id, post_id, author_id, "Added comment");
        Ok(comment)
    }

    /// Change the text of a comment
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the comment does not exist on `post_id`,
    /// `PermissionDenied` if `actor_id` did not write it.
    pub async fn edit(
        &self,
        post_id: i64,
        comment_id: i64,
        actor_id: UserId,
        text: &str,
    ) -> Result<Comment> {
        let mut comment = self.owned_comment(post_id, comment_id, actor_id).await?;
        validate_text("Comment", text)?;

        comment.text = text.to_string();
        self.store.update_comment(&comment).await?;

        tracing::info!(comment_id, post_id, actor_id, "Edited comment");
        Ok(comment)
    }

    /// Delete a comment
    ///
    /// # Errors
    ///
    /// Same as [`CommentService::edit`].
    pub async fn delete(&self, post_id: i64, comment_id: i64, actor_id: UserId) -> Result<()> {
        self.owned_comment(post_id, comment_id, actor_id).await?;
        self.store.delete_comment(comment_id).await?;
        tracing::info!(comment_id, post_id, actor_id, "Deleted comment");
        Ok(())
    }

    async fn owned_comment(&self, post_id: i64, comment_id: i64, actor_id: UserId) -> Result<Comment> {
        let comment = self
            .store
            .get_comment(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| BlogError::not_found("Comment", comment_id))?;

        if comment.author_id != actor_id {
            tracing::warn!(comment_id, actor_id, "Refused to modify another user's comment");
            return Err(BlogError::PermissionDenied(format!(
                "Comment {} belongs to another user",
                comment_id
            )));
        }
        Ok(comment)
    }
}
