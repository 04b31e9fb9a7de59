//! Blogicum - a small blog engine
//!
//! This library holds the post visibility policy, the listing service and
//! the authoring services for posts, comments and profiles. Storage sits
//! behind the [`BlogStore`] trait so the same services run against SQLite
//! or an in-memory store.

pub mod config;
pub mod error;
pub mod logging;
pub mod pagination;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;
pub mod visibility;

// Re-export commonly used types
pub use config::Config;
pub use error::{BlogError, Result};
pub use pagination::{Page, PAGE_SIZE};
pub use service::BlogService;
pub use store::{BlogStore, Database, InMemoryStore, PostFilter, Scope};
pub use types::{
    Category, Comment, CommentView, Location, NewCategory, NewComment, NewLocation, NewPost,
    NewUser, Post, PostSummary, User, UserId, ViewContext,
};
