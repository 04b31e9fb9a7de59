//! Core types for Blogicum

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

impl NewCategory {
    pub fn new(title: &str, slug: &str) -> Self {
        Self {
            title: title.to_string(),
            description: String::new(),
            slug: slug.to_string(),
            is_published: true,
        }
    }

    pub fn unpublished(mut self) -> Self {
        self.is_published = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub is_published: bool,
}

impl NewLocation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_published: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: UserId,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub author_id: UserId,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
}

impl NewPost {
    /// A published post with no category or location
    pub fn new(author_id: UserId, title: &str, text: &str, pub_date: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            text: text.to_string(),
            pub_date,
            is_published: true,
            author_id,
            location_id: None,
            category_id: None,
            image: None,
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn at_location(mut self, location_id: i64) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.is_published = false;
        self
    }
}

/// A post annotated for display: author name, resolved category and
/// location, and the live comment count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub author: String,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: i64,
}

impl PostSummary {
    pub fn is_visible_to(&self, ctx: &ViewContext) -> bool {
        crate::visibility::is_visible(&self.post, self.category.as_ref(), ctx.viewer, ctx.now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: UserId,
    pub text: String,
}

/// A comment with its author's username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: String,
}

/// Who is asking, and when
///
/// Supplied by the boundary layer for every read. `now` is explicit so
/// visibility is deterministic for a given request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewContext {
    pub viewer: Option<UserId>,
    pub now: DateTime<Utc>,
}

impl ViewContext {
    pub fn new(viewer: Option<UserId>, now: DateTime<Utc>) -> Self {
        Self { viewer, now }
    }

    pub fn anonymous() -> Self {
        Self::new(None, Utc::now())
    }

    pub fn as_user(viewer: UserId) -> Self {
        Self::new(Some(viewer), Utc::now())
    }
}

/// Convert a stored Unix timestamp, clamping unrepresentable values to the epoch
pub(crate) fn from_timestamp(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

/// Drop sub-second precision so values survive storage unchanged
pub(crate) fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    from_timestamp(dt.timestamp())
}
