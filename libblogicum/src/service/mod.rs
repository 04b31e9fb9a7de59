//! Service layer for Blogicum
//!
//! Stateless services that take the viewer, the current time, the scope and
//! the page explicitly. `BlogService` is the facade: it owns the shared
//! store handle and hands out the specialized sub-services.
//!
//! - `ListingService`: index, category and profile listings
//! - `PostService`: post detail, create, update, delete
//! - `CommentService`: add, edit, delete comments
//! - `ProfileService`: user lookup, profile edits, location lookup
//!
//! # Example
//!
//! ```no_run
//! use libblogicum::service::BlogService;
//! use libblogicum::ViewContext;
//!
//! # async fn example() -> libblogicum::Result<()> {
//! let service = BlogService::new().await?;
//!
//! let page = service.listing().index(&ViewContext::anonymous(), 1).await?;
//! for summary in &page.items {
//!     println!("{} ({} comments)", summary.post.title, summary.comment_count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod comments;
pub mod listing;
pub mod posts;
pub mod profiles;

use std::sync::Arc;

use self::comments::CommentService;
use self::listing::ListingService;
use self::posts::PostService;
use self::profiles::ProfileService;
use crate::config::resolve_db_path;
use crate::error::{ConfigError, Result};
use crate::store::{BlogStore, Database};
use crate::types::{User, ViewContext};
use crate::Config;

/// Main service facade that coordinates all sub-services
///
/// All sub-services share the same `Arc<dyn BlogStore>`.
pub struct BlogService {
    store: Arc<dyn BlogStore>,
    listing: ListingService,
    posts: PostService,
    comments: CommentService,
    profiles: ProfileService,
}

impl BlogService {
    /// Create a service from the default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the
    /// database cannot be opened or migrated.
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(&config).await
    }

    /// Create a service backed by the SQLite database named in `config`
    pub async fn from_config(config: &Config) -> Result<Self> {
        let db_path = resolve_db_path(Some(&config.database.path))?;
        let db_path_str = db_path.to_str().ok_or_else(|| {
            ConfigError::MissingField(format!("valid database path ({})", db_path.display()))
        })?;
        let db = Database::new(db_path_str).await?;
        Ok(Self::with_store(Arc::new(db)))
    }

    /// Create a service over any store
    pub fn with_store(store: Arc<dyn BlogStore>) -> Self {
        Self {
            listing: ListingService::new(Arc::clone(&store)),
            posts: PostService::new(Arc::clone(&store)),
            comments: CommentService::new(Arc::clone(&store)),
            profiles: ProfileService::new(Arc::clone(&store)),
            store,
        }
    }

    /// Access the store directly
    pub fn store(&self) -> &Arc<dyn BlogStore> {
        &self.store
    }

    pub fn listing(&self) -> &ListingService {
        &self.listing
    }

    pub fn posts(&self) -> &PostService {
        &self.posts
    }

    pub fn comments(&self) -> &CommentService {
        &self.comments
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    /// Build the request context for `username`, or an anonymous one
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown username.
    pub async fn view_context(&self, username: Option<&str>) -> Result<(Option<User>, ViewContext)> {
        match username {
            Some(name) => {
                let user = self.profiles.profile(name).await?;
                let ctx = ViewContext::as_user(user.id);
                Ok((Some(user), ctx))
            }
            None => Ok((None, ViewContext::anonymous())),
        }
    }
}
