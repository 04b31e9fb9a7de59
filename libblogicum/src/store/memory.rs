//! In-memory store
//!
//! Mirrors the SQLite store's behavior (unique usernames and slugs,
//! cascading deletes, listing order) without touching disk. Available in
//! all builds so integration tests and embedders can use it.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{BlogStore, PostFilter};
use crate::error::{DbError, Result};
use crate::types::{
    truncate_to_seconds, Category, Comment, CommentView, Location, NewCategory, NewComment,
    NewLocation, NewPost, NewUser, Post, PostSummary, User, UserId,
};
use crate::visibility;

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn summarize(&self, post: &Post) -> Option<PostSummary> {
        let author = self.users.get(&post.author_id)?;
        Some(PostSummary {
            post: post.clone(),
            author: author.username.clone(),
            category: post.category_id.and_then(|id| self.categories.get(&id).cloned()),
            location: post.location_id.and_then(|id| self.locations.get(&id).cloned()),
            comment_count: self
                .comments
                .values()
                .filter(|c| c.post_id == post.id)
                .count() as i64,
        })
    }

    /// Matching posts in listing order
    fn matching(&self, filter: &PostFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .values()
            .filter(|p| filter.scope.contains(p))
            .filter(|p| {
                let category = p.category_id.and_then(|id| self.categories.get(&id));
                visibility::is_visible(p, category, filter.viewer, filter.now)
            })
            .collect();
        // BTreeMap yields ascending ids, and the sort is stable
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
        posts
    }

    fn check_references(&self, author_id: UserId, location_id: Option<i64>, category_id: Option<i64>) -> Result<()> {
        if !self.users.contains_key(&author_id) {
            return Err(DbError::Constraint(format!("FOREIGN KEY author {}", author_id)).into());
        }
        if let Some(id) = location_id.filter(|id| !self.locations.contains_key(id)) {
            return Err(DbError::Constraint(format!("FOREIGN KEY location {}", id)).into());
        }
        if let Some(id) = category_id.filter(|id| !self.categories.contains_key(id)) {
            return Err(DbError::Constraint(format!("FOREIGN KEY category {}", id)).into());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlogStore for InMemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut tables = self.lock();
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(DbError::Constraint(format!(
                "UNIQUE constraint failed: users.username ({})",
                user.username
            ))
            .into());
        }

        let id = tables.allocate_id();
        let created = User {
            id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            date_joined: truncate_to_seconds(chrono::Utc::now()),
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut tables = self.lock();
        if tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(DbError::Constraint(format!(
                "UNIQUE constraint failed: users.username ({})",
                user.username
            ))
            .into());
        }
        if let Some(existing) = tables.users.get_mut(&user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        let mut tables = self.lock();
        if tables.categories.values().any(|c| c.slug == category.slug) {
            return Err(DbError::Constraint(format!(
                "UNIQUE constraint failed: categories.slug ({})",
                category.slug
            ))
            .into());
        }

        let id = tables.allocate_id();
        let created = Category {
            id,
            title: category.title.clone(),
            description: category.description.clone(),
            slug: category.slug.clone(),
            is_published: category.is_published,
            created_at: truncate_to_seconds(chrono::Utc::now()),
        };
        tables.categories.insert(id, created.clone());
        Ok(created)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.lock().categories.get(&id).cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Ok(self
            .lock()
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn create_location(&self, location: &NewLocation) -> Result<Location> {
        let mut tables = self.lock();
        let id = tables.allocate_id();
        let created = Location {
            id,
            name: location.name.clone(),
            is_published: location.is_published,
            created_at: truncate_to_seconds(chrono::Utc::now()),
        };
        tables.locations.insert(id, created.clone());
        Ok(created)
    }

    async fn get_location(&self, id: i64) -> Result<Option<Location>> {
        Ok(self.lock().locations.get(&id).cloned())
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let mut tables = self.lock();
        tables.check_references(post.author_id, post.location_id, post.category_id)?;

        let id = tables.allocate_id();
        let created = Post {
            id,
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: truncate_to_seconds(post.pub_date),
            is_published: post.is_published,
            created_at: truncate_to_seconds(chrono::Utc::now()),
            author_id: post.author_id,
            location_id: post.location_id,
            category_id: post.category_id,
            image: post.image.clone(),
        };
        tables.posts.insert(id, created.clone());
        Ok(created)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.lock().posts.get(&id).cloned())
    }

    async fn get_post_summary(&self, id: i64) -> Result<Option<PostSummary>> {
        let tables = self.lock();
        Ok(tables.posts.get(&id).and_then(|p| tables.summarize(p)))
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        let mut tables = self.lock();
        tables.check_references(post.author_id, post.location_id, post.category_id)?;
        if let Some(existing) = tables.posts.get_mut(&post.id) {
            *existing = Post {
                pub_date: truncate_to_seconds(post.pub_date),
                ..post.clone()
            };
        }
        Ok(())
    }

    async fn delete_post(&self, id: i64) -> Result<()> {
        let mut tables = self.lock();
        tables.comments.retain(|_, c| c.post_id != id);
        tables.posts.remove(&id);
        Ok(())
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64> {
        Ok(self.lock().matching(filter).len() as u64)
    }

    async fn fetch_posts(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<PostSummary>> {
        let tables = self.lock();
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(tables
            .matching(filter)
            .into_iter()
            .skip(skip)
            .take(limit as usize)
            .filter_map(|p| tables.summarize(p))
            .collect())
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        let mut tables = self.lock();
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(
                DbError::Constraint(format!("FOREIGN KEY post {}", comment.post_id)).into(),
            );
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(
                DbError::Constraint(format!("FOREIGN KEY author {}", comment.author_id)).into(),
            );
        }

        let id = tables.allocate_id();
        let created = Comment {
            id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text.clone(),
            created_at: truncate_to_seconds(chrono::Utc::now()),
        };
        tables.comments.insert(id, created.clone());
        Ok(created)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        Ok(self.lock().comments.get(&id).cloned())
    }

    async fn update_comment(&self, comment: &Comment) -> Result<()> {
        if let Some(existing) = self.lock().comments.get_mut(&comment.id) {
            existing.text = comment.text.clone();
        }
        Ok(())
    }

    async fn delete_comment(&self, id: i64) -> Result<()> {
        self.lock().comments.remove(&id);
        Ok(())
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let tables = self.lock();
        let mut comments: Vec<CommentView> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                tables.users.get(&c.author_id).map(|u| CommentView {
                    comment: c.clone(),
                    author: u.username.clone(),
                })
            })
            .collect();
        comments.sort_by_key(|c| c.comment.created_at);
        Ok(comments)
    }
}
