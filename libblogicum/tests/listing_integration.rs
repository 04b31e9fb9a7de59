//! Listing behavior checked against both store implementations
//!
//! Every scenario runs once over the in-memory store and once over a
//! temporary SQLite database, and the two must agree.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use libblogicum::store::Scope;
use libblogicum::{
    BlogError, BlogService, BlogStore, Database, InMemoryStore, NewCategory, NewComment, NewPost,
    NewUser, PostSummary, ViewContext, PAGE_SIZE,
};
use tempfile::TempDir;

/// Both stores, the TempDir keeps the SQLite file alive
async fn stores() -> Result<(Vec<(&'static str, BlogService)>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("blog.db");
    let db = Database::new(db_path.to_str().unwrap()).await?;

    let services = vec![
        ("memory", BlogService::with_store(Arc::new(InMemoryStore::new()))),
        ("sqlite", BlogService::with_store(Arc::new(db))),
    ];
    Ok((services, temp_dir))
}

/// Seed a mixed data set and return (author id, reader id)
async fn seed(store: &Arc<dyn BlogStore>) -> Result<(i64, i64)> {
    let author = store.create_user(&NewUser::new("author")).await?;
    let reader = store.create_user(&NewUser::new("reader")).await?;
    let open = store.create_category(&NewCategory::new("Open", "open")).await?;
    let closed = store
        .create_category(&NewCategory::new("Closed", "closed").unpublished())
        .await?;

    let now = Utc::now();
    for i in 0..30 {
        let mut post = NewPost::new(author.id, &format!("post {}", i), "Body", now - Duration::hours(i));
        match i % 5 {
            0 => post = post.unpublished(),
            1 => post.pub_date = now + Duration::hours(i),
            2 => post = post.in_category(closed.id),
            3 => post = post.in_category(open.id),
            _ => {}
        }
        let created = store.create_post(&post).await?;
        for _ in 0..(i % 3) {
            store
                .create_comment(&NewComment {
                    post_id: created.id,
                    author_id: reader.id,
                    text: "comment".to_string(),
                })
                .await?;
        }
    }

    // Two posts sharing a pub_date to exercise the tie-break
    let tie = now - Duration::days(10);
    store.create_post(&NewPost::new(reader.id, "tie first", "Body", tie)).await?;
    store.create_post(&NewPost::new(reader.id, "tie second", "Body", tie)).await?;

    Ok((author.id, reader.id))
}

async fn collect_all(service: &BlogService, scope: Scope, ctx: &ViewContext) -> Result<Vec<PostSummary>> {
    let mut all = Vec::new();
    let first = service.listing().list_posts(scope, ctx, 1, PAGE_SIZE).await?;
    let total_pages = first.total_pages;
    all.extend(first.items);
    for page in 2..=total_pages {
        let next = service
            .listing()
            .list_posts(scope, ctx, i64::from(page), PAGE_SIZE)
            .await?;
        all.extend(next.items);
    }
    Ok(all)
}

#[tokio::test]
async fn test_listing_properties_hold_for_every_viewer() -> Result<()> {
    let (services, _temp_dir) = stores().await?;
    let mut titles_by_store = Vec::new();

    for (name, service) in &services {
        let (author_id, reader_id) = seed(service.store()).await?;
        let now = Utc::now();

        for viewer in [None, Some(author_id), Some(reader_id)] {
            let ctx = ViewContext::new(viewer, now);
            let posts = collect_all(service, Scope::All, &ctx).await?;

            for summary in &posts {
                assert!(summary.is_visible_to(&ctx), "[{}] invisible post listed", name);

                let comments = service.store().list_comments(summary.post.id).await?;
                assert_eq!(summary.comment_count, comments.len() as i64, "[{}]", name);
            }

            for pair in posts.windows(2) {
                assert!(
                    pair[0].post.pub_date >= pair[1].post.pub_date,
                    "[{}] listing not ordered by pub_date",
                    name
                );
            }

            titles_by_store.push(
                posts
                    .iter()
                    .map(|s| s.post.title.clone())
                    .collect::<Vec<_>>(),
            );
        }

        // Author sees all 30 of their posts plus the reader's two
        let ctx = ViewContext::new(Some(author_id), now);
        let page = service.listing().index(&ctx, 1).await?;
        assert_eq!(page.total_items, 32, "[{}]", name);
        assert!(page.items.len() <= PAGE_SIZE as usize);

        // Anonymous: only the i % 5 == 3 and i % 5 == 4 posts, plus the ties
        let page = service.listing().index(&ViewContext::new(None, now), 1).await?;
        assert_eq!(page.total_items, 14, "[{}]", name);
    }

    // memory and sqlite produced the same listings, viewer by viewer
    let (memory, sqlite) = titles_by_store.split_at(3);
    assert_eq!(memory, sqlite);

    Ok(())
}

#[tokio::test]
async fn test_ties_keep_insertion_order() -> Result<()> {
    let (services, _temp_dir) = stores().await?;

    for (name, service) in &services {
        let (_, reader_id) = seed(service.store()).await?;
        let page = service
            .listing()
            .list_posts(Scope::Author(reader_id), &ViewContext::anonymous(), 1, PAGE_SIZE)
            .await?;
        let titles: Vec<&str> = page.items.iter().map(|s| s.post.title.as_str()).collect();
        assert_eq!(titles, vec!["tie first", "tie second"], "[{}]", name);
    }

    Ok(())
}

#[tokio::test]
async fn test_out_of_range_pages_clamp() -> Result<()> {
    let (services, _temp_dir) = stores().await?;

    for (name, service) in &services {
        let (author_id, _) = seed(service.store()).await?;
        let ctx = ViewContext::as_user(author_id);

        let first = service.listing().index(&ctx, 0).await?;
        assert_eq!(first.number, 1, "[{}]", name);
        assert!(!first.has_previous());

        let last = service.listing().index(&ctx, 1000).await?;
        assert_eq!(last.number, 4, "[{}]", name);
        assert_eq!(last.items.len(), 2, "[{}]", name);
        assert!(!last.has_next());
    }

    Ok(())
}

#[tokio::test]
async fn test_scenarios() -> Result<()> {
    let (services, _temp_dir) = stores().await?;

    for (name, service) in &services {
        let store = service.store();
        let alice = store.create_user(&NewUser::new("alice")).await?;
        let bob = store.create_user(&NewUser::new("bob")).await?;
        let travel = store.create_category(&NewCategory::new("Travel", "travel")).await?;
        store
            .create_category(&NewCategory::new("News", "news").unpublished())
            .await?;
        let past = Utc::now() - Duration::days(1);

        // A: published, past, published category, anonymous viewer
        let a = store
            .create_post(&NewPost::new(alice.id, "A", "Body", past).in_category(travel.id))
            .await?;
        let index = service.listing().index(&ViewContext::anonymous(), 1).await?;
        assert!(index.items.iter().any(|s| s.post.id == a.id), "[{}] A", name);

        // B: unpublished, visible only to its author
        let b = store
            .create_post(&NewPost::new(alice.id, "B", "Body", past).unpublished())
            .await?;
        let index = service.listing().index(&ViewContext::anonymous(), 1).await?;
        assert!(!index.items.iter().any(|s| s.post.id == b.id), "[{}] B anon", name);
        let index = service.listing().index(&ViewContext::as_user(alice.id), 1).await?;
        assert!(index.items.iter().any(|s| s.post.id == b.id), "[{}] B author", name);

        // C: future-dated, hidden from non-authors in a published category
        let c = store
            .create_post(
                &NewPost::new(alice.id, "C", "Body", Utc::now() + Duration::days(1)).in_category(travel.id),
            )
            .await?;
        let listing = service
            .listing()
            .category("travel", &ViewContext::as_user(bob.id), 1)
            .await?;
        assert_eq!(listing.category.id, travel.id);
        assert!(!listing.posts.items.iter().any(|s| s.post.id == c.id), "[{}] C", name);
        assert!(listing.posts.items.iter().any(|s| s.post.id == a.id), "[{}] C/A", name);

        // news: unpublished category is not found
        let result = service
            .listing()
            .category("news", &ViewContext::anonymous(), 1)
            .await;
        assert!(matches!(result, Err(BlogError::NotFound(_))), "[{}] news", name);

        // B detail: not found for others, fine for the author
        assert!(service
            .posts()
            .detail(b.id, &ViewContext::as_user(bob.id))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(service
            .posts()
            .detail(b.id, &ViewContext::as_user(alice.id))
            .await
            .is_ok());
    }

    Ok(())
}
