//! SQLite-backed store

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use super::{BlogStore, PostFilter, Scope};
use crate::error::{DbError, Result};
use crate::types::{
    from_timestamp, truncate_to_seconds, Category, Comment, CommentView, Location, NewCategory,
    NewComment, NewLocation, NewPost, NewUser, Post, PostSummary, User, UserId,
};

const SUMMARY_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.pub_date, p.is_published, p.created_at,
           p.author_id, p.location_id, p.category_id, p.image,
           u.username AS author_username,
           c.title AS category_title, c.description AS category_description,
           c.slug AS category_slug, c.is_published AS category_is_published,
           c.created_at AS category_created_at,
           l.name AS location_name, l.is_published AS location_is_published,
           l.created_at AS location_created_at,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

const PUBLICLY_VISIBLE: &str =
    "(p.pub_date <= ? AND p.is_published = 1 AND (p.category_id IS NULL OR c.is_published = 1))";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `db_path` and run migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        // Forward slashes keep the URL valid on Windows too
        let db_url = format!("sqlite://{}", expanded_path.replace('\\', "/"));
        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(DbError::SqlxError)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        tracing::debug!("Opened database at {}", expanded_path);
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Map unique and foreign-key violations to `DbError::Constraint`
fn db_error(err: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
            return DbError::Constraint(db_err.message().to_string());
        }
    }
    DbError::SqlxError(err)
}

/// WHERE clause and its bind values for a listing filter
fn filter_clause(filter: &PostFilter) -> (String, Vec<i64>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut binds = Vec::new();

    match filter.scope {
        Scope::All => {}
        Scope::Category(id) => {
            clauses.push("p.category_id = ?".to_string());
            binds.push(id);
        }
        Scope::Author(id) => {
            clauses.push("p.author_id = ?".to_string());
            binds.push(id);
        }
    }

    match filter.viewer {
        Some(viewer) => {
            clauses.push(format!("(p.author_id = ? OR {})", PUBLICLY_VISIBLE));
            binds.push(viewer);
        }
        None => clauses.push(PUBLICLY_VISIBLE.to_string()),
    }
    binds.push(filter.now.timestamp());

    (clauses.join(" AND "), binds)
}

fn user_from_row(r: &SqliteRow) -> User {
    User {
        id: r.get("id"),
        username: r.get("username"),
        first_name: r.get("first_name"),
        last_name: r.get("last_name"),
        email: r.get("email"),
        date_joined: from_timestamp(r.get("date_joined")),
    }
}

fn category_from_row(r: &SqliteRow) -> Category {
    Category {
        id: r.get("id"),
        title: r.get("title"),
        description: r.get("description"),
        slug: r.get("slug"),
        is_published: r.get::<i64, _>("is_published") != 0,
        created_at: from_timestamp(r.get("created_at")),
    }
}

fn location_from_row(r: &SqliteRow) -> Location {
    Location {
        id: r.get("id"),
        name: r.get("name"),
        is_published: r.get::<i64, _>("is_published") != 0,
        created_at: from_timestamp(r.get("created_at")),
    }
}

fn post_from_row(r: &SqliteRow) -> Post {
    Post {
        id: r.get("id"),
        title: r.get("title"),
        text: r.get("text"),
        pub_date: from_timestamp(r.get("pub_date")),
        is_published: r.get::<i64, _>("is_published") != 0,
        created_at: from_timestamp(r.get("created_at")),
        author_id: r.get("author_id"),
        location_id: r.get("location_id"),
        category_id: r.get("category_id"),
        image: r.get("image"),
    }
}

fn summary_from_row(r: &SqliteRow) -> PostSummary {
    let post = post_from_row(r);

    let category = match (post.category_id, r.get::<Option<String>, _>("category_slug")) {
        (Some(id), Some(slug)) => Some(Category {
            id,
            title: r.get("category_title"),
            description: r.get("category_description"),
            slug,
            is_published: r.get::<i64, _>("category_is_published") != 0,
            created_at: from_timestamp(r.get("category_created_at")),
        }),
        _ => None,
    };

    let location = match (post.location_id, r.get::<Option<String>, _>("location_name")) {
        (Some(id), Some(name)) => Some(Location {
            id,
            name,
            is_published: r.get::<i64, _>("location_is_published") != 0,
            created_at: from_timestamp(r.get("location_created_at")),
        }),
        _ => None,
    };

    PostSummary {
        post,
        author: r.get("author_username"),
        category,
        location,
        comment_count: r.get("comment_count"),
    }
}

fn comment_from_row(r: &SqliteRow) -> Comment {
    Comment {
        id: r.get("id"),
        post_id: r.get("post_id"),
        author_id: r.get("author_id"),
        text: r.get("text"),
        created_at: from_timestamp(r.get("created_at")),
    }
}

#[async_trait]
impl BlogStore for Database {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let date_joined = truncate_to_seconds(chrono::Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, first_name, last_name, email, date_joined)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(date_joined.timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            date_joined,
        })
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, first_name, last_name, email, date_joined FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, first_name, last_name, email, date_joined FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET username = ?, first_name = ?, last_name = ?, email = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        let created_at = truncate_to_seconds(chrono::Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO categories (title, description, slug, is_published, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.title)
        .bind(&category.description)
        .bind(&category.slug)
        .bind(category.is_published)
        .bind(created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Category {
            id: result.last_insert_rowid(),
            title: category.title.clone(),
            description: category.description.clone(),
            slug: category.slug.clone(),
            is_published: category.is_published,
            created_at,
        })
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, title, description, slug, is_published, created_at FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(category_from_row))
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, title, description, slug, is_published, created_at FROM categories WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(category_from_row))
    }

    async fn create_location(&self, location: &NewLocation) -> Result<Location> {
        let created_at = truncate_to_seconds(chrono::Utc::now());

        let result = sqlx::query(
            "INSERT INTO locations (name, is_published, created_at) VALUES (?, ?, ?)",
        )
        .bind(&location.name)
        .bind(location.is_published)
        .bind(created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Location {
            id: result.last_insert_rowid(),
            name: location.name.clone(),
            is_published: location.is_published,
            created_at,
        })
    }

    async fn get_location(&self, id: i64) -> Result<Option<Location>> {
        let row = sqlx::query(
            "SELECT id, name, is_published, created_at FROM locations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(location_from_row))
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let created_at = truncate_to_seconds(chrono::Utc::now());
        let pub_date = truncate_to_seconds(post.pub_date);

        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, text, pub_date, is_published, created_at,
                               author_id, location_id, category_id, image)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.title)
        .bind(&post.text)
        .bind(pub_date.timestamp())
        .bind(post.is_published)
        .bind(created_at.timestamp())
        .bind(post.author_id)
        .bind(post.location_id)
        .bind(post.category_id)
        .bind(&post.image)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Post {
            id: result.last_insert_rowid(),
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date,
            is_published: post.is_published,
            created_at,
            author_id: post.author_id,
            location_id: post.location_id,
            category_id: post.category_id,
            image: post.image.clone(),
        })
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, text, pub_date, is_published, created_at,
                   author_id, location_id, category_id, image
            FROM posts WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn get_post_summary(&self, id: i64) -> Result<Option<PostSummary>> {
        let query_str = format!("{} WHERE p.id = ?", SUMMARY_SELECT);

        let row = sqlx::query(&query_str)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(summary_from_row))
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, text = ?, pub_date = ?, is_published = ?,
                location_id = ?, category_id = ?, image = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.text)
        .bind(post.pub_date.timestamp())
        .bind(post.is_published)
        .bind(post.location_id)
        .bind(post.category_id)
        .bind(&post.image)
        .bind(post.id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn delete_post(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64> {
        let (where_clause, binds) = filter_clause(filter);
        let query_str = format!(
            r#"
            SELECT COUNT(*) AS total
            FROM posts p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE {}
            "#,
            where_clause
        );

        let mut query = sqlx::query(&query_str);
        for value in binds {
            query = query.bind(value);
        }

        let row = query
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        let total: i64 = row.get("total");
        Ok(total.max(0) as u64)
    }

    async fn fetch_posts(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<PostSummary>> {
        let (where_clause, binds) = filter_clause(filter);
        let query_str = format!(
            "{} WHERE {} ORDER BY p.pub_date DESC, p.id ASC LIMIT ? OFFSET ?",
            SUMMARY_SELECT, where_clause
        );

        let mut query = sqlx::query(&query_str);
        for value in binds {
            query = query.bind(value);
        }
        query = query
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(rows.iter().map(summary_from_row).collect())
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        let created_at = truncate_to_seconds(chrono::Utc::now());

        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_id, text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .bind(created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text.clone(),
            created_at,
        })
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, post_id, author_id, text, created_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(comment_from_row))
    }

    async fn update_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
            .bind(&comment.text)
            .bind(comment.id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(())
    }

    async fn delete_comment(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(())
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let rows = sqlx::query(
            r#"
            SELECT cm.id, cm.post_id, cm.author_id, cm.text, cm.created_at,
                   u.username AS author_username
            FROM comments cm
            JOIN users u ON u.id = cm.author_id
            WHERE cm.post_id = ?
            ORDER BY cm.created_at ASC, cm.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(rows
            .iter()
            .map(|r| CommentView {
                comment: comment_from_row(r),
                author: r.get("author_username"),
            })
            .collect())
    }
}
