//! Listing service
//!
//! Builds the post listings shown on the index, category and profile pages:
//! visible posts only, newest first, annotated with comment counts, one
//! page at a time.

use std::sync::Arc;

use crate::error::{BlogError, Result};
use crate::pagination::{Page, Paginator, PAGE_SIZE};
use crate::store::{BlogStore, PostFilter, Scope};
use crate::types::{Category, PostSummary, User, ViewContext};

/// Listing service
pub struct ListingService {
    store: Arc<dyn BlogStore>,
}

/// A category page: the category itself and one page of its posts
#[derive(Debug, Clone)]
pub struct CategoryPage {
    pub category: Category,
    pub posts: Page<PostSummary>,
}

/// A profile page: the profile owner and one page of their posts
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub profile: User,
    pub posts: Page<PostSummary>,
}

impl ListingService {
    /// Create a new listing service
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// List the posts in `scope` that `ctx.viewer` may see
    ///
    /// `scope` must already be resolved to an existing category or user.
    /// The requested page is clamped to the valid range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero page size, or a database error.
    pub async fn list_posts(
        &self,
        scope: Scope,
        ctx: &ViewContext,
        page: i64,
        page_size: u32,
    ) -> Result<Page<PostSummary>> {
        let filter = PostFilter::new(scope, ctx);

        let total = self.store.count_posts(&filter).await?;
        let paginator = Paginator::new(total, page_size)?;
        let number = paginator.clamp(page);

        let items = self
            .store
            .fetch_posts(&filter, paginator.offset(number), paginator.page_size())
            .await?;

        tracing::debug!(
            ?scope,
            viewer = ?ctx.viewer,
            requested = page,
            page = number,
            total,
            returned = items.len(),
            "Listed posts"
        );

        Ok(paginator.page(number, items))
    }

    /// The front page: every visible post
    pub async fn index(&self, ctx: &ViewContext, page: i64) -> Result<Page<PostSummary>> {
        self.list_posts(Scope::All, ctx, page, PAGE_SIZE).await
    }

    /// Posts of a published category
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no category has `slug` or the category is
    /// unpublished.
    pub async fn category(&self, slug: &str, ctx: &ViewContext, page: i64) -> Result<CategoryPage> {
        let category = self
            .store
            .get_category_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| BlogError::not_found("Category", slug))?;

        let posts = self
            .list_posts(Scope::Category(category.id), ctx, page, PAGE_SIZE)
            .await?;

        Ok(CategoryPage { category, posts })
    }

    /// Posts written by `username`
    ///
    /// The owner sees all of their posts; everyone else sees the publicly
    /// visible ones.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no user has `username`.
    pub async fn profile(&self, username: &str, ctx: &ViewContext, page: i64) -> Result<ProfilePage> {
        let profile = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| BlogError::not_found("User", username))?;

        let posts = self
            .list_posts(Scope::Author(profile.id), ctx, page, PAGE_SIZE)
            .await?;

        Ok(ProfilePage { profile, posts })
    }
}
