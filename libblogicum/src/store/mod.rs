//! Entity store abstraction and implementations
//!
//! Services never talk to a database directly; they hold an
//! `Arc<dyn BlogStore>`. [`Database`] persists to SQLite, [`InMemoryStore`]
//! keeps everything in memory and is what most tests run against.
//!
//! # Examples
//!
//! ```no_run
//! use libblogicum::store::{BlogStore, Database, PostFilter, Scope};
//! use libblogicum::ViewContext;
//!
//! # async fn example() -> libblogicum::Result<()> {
//! let db = Database::new("~/.local/share/blogicum/blog.db").await?;
//! let filter = PostFilter::new(Scope::All, &ViewContext::anonymous());
//! let visible = db.count_posts(&filter).await?;
//! println!("{} visible posts", visible);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{
    Category, Comment, CommentView, Location, NewCategory, NewComment, NewLocation, NewPost,
    NewUser, Post, PostSummary, User, UserId, ViewContext,
};

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::Database;

/// The collection a listing is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Category(i64),
    Author(UserId),
}

impl Scope {
    pub fn contains(&self, post: &Post) -> bool {
        match self {
            Scope::All => true,
            Scope::Category(id) => post.category_id == Some(*id),
            Scope::Author(id) => post.author_id == *id,
        }
    }
}

/// Which posts a listing query may return
///
/// Posts in `scope` that are publicly visible at `now`, plus every post in
/// `scope` written by `viewer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub scope: Scope,
    pub viewer: Option<UserId>,
    pub now: DateTime<Utc>,
}

impl PostFilter {
    pub fn new(scope: Scope, ctx: &ViewContext) -> Self {
        Self {
            scope,
            viewer: ctx.viewer,
            now: ctx.now,
        }
    }
}

/// Storage operations used by the services
///
/// Listing queries (`count_posts`, `fetch_posts`) must apply the
/// visibility policy of [`crate::visibility`] and order by `pub_date`
/// descending, then id ascending.
#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update_user(&self, user: &User) -> Result<()>;

    async fn create_category(&self, category: &NewCategory) -> Result<Category>;
    async fn get_category(&self, id: i64) -> Result<Option<Category>>;
    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    async fn create_location(&self, location: &NewLocation) -> Result<Location>;
    async fn get_location(&self, id: i64) -> Result<Option<Location>>;

    async fn create_post(&self, post: &NewPost) -> Result<Post>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>>;
    /// The post annotated with author, category, location and comment count
    async fn get_post_summary(&self, id: i64) -> Result<Option<PostSummary>>;
    async fn update_post(&self, post: &Post) -> Result<()>;
    /// Delete a post together with its comments
    async fn delete_post(&self, id: i64) -> Result<()>;

    /// Number of posts matching `filter`
    async fn count_posts(&self, filter: &PostFilter) -> Result<u64>;
    /// One window of the posts matching `filter`, in listing order
    async fn fetch_posts(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<PostSummary>>;

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment>;
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>>;
    async fn update_comment(&self, comment: &Comment) -> Result<()>;
    async fn delete_comment(&self, id: i64) -> Result<()>;
    /// Comments on a post, oldest first
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>>;
}
