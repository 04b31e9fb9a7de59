//! Post visibility policy
//!
//! A post is publicly visible when its publication time has passed, it is
//! published, and its category (if any) is published. Authors always see
//! their own posts, including drafts, scheduled posts and posts filed
//! under unpublished categories.

use chrono::{DateTime, Utc};

use crate::types::{Category, Post, UserId};

/// Whether anyone may see the post
///
/// `category` is the post's resolved category, `None` when the post has none.
pub fn is_publicly_visible(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.pub_date <= now && post.is_published && category.map_or(true, |c| c.is_published)
}

/// Whether `viewer` may see the post
pub fn is_visible(
    post: &Post,
    category: Option<&Category>,
    viewer: Option<UserId>,
    now: DateTime<Utc>,
) -> bool {
    if viewer == Some(post.author_id) {
        return true;
    }
    is_publicly_visible(post, category, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const AUTHOR: UserId = 1;
    const OTHER: UserId = 2;

    fn post(pub_offset: Duration, is_published: bool, category_id: Option<i64>) -> Post {
        let now = Utc::now();
        Post {
            id: 10,
            title: "Post".to_string(),
            text: "Body".to_string(),
            pub_date: now + pub_offset,
            is_published,
            created_at: now,
            author_id: AUTHOR,
            location_id: None,
            category_id,
            image: None,
        }
    }

    fn category(is_published: bool) -> Category {
        Category {
            id: 5,
            title: "Travel".to_string(),
            description: String::new(),
            slug: "travel".to_string(),
            is_published,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_published_past_post_is_public() {
        let p = post(Duration::hours(-1), true, Some(5));
        assert!(is_publicly_visible(&p, Some(&category(true)), Utc::now()));
        assert!(is_visible(&p, Some(&category(true)), None, Utc::now()));
        assert!(is_visible(&p, Some(&category(true)), Some(OTHER), Utc::now()));
    }

    #[test]
    fn test_post_without_category_is_public() {
        let p = post(Duration::hours(-1), true, None);
        assert!(is_publicly_visible(&p, None, Utc::now()));
    }

    #[test]
    fn test_unpublished_post_hidden_from_others() {
        let p = post(Duration::hours(-1), false, None);
        assert!(!is_visible(&p, None, None, Utc::now()));
        assert!(!is_visible(&p, None, Some(OTHER), Utc::now()));
        assert!(is_visible(&p, None, Some(AUTHOR), Utc::now()));
    }

    #[test]
    fn test_future_post_hidden_from_others() {
        let p = post(Duration::days(1), true, Some(5));
        assert!(!is_visible(&p, Some(&category(true)), Some(OTHER), Utc::now()));
        assert!(is_visible(&p, Some(&category(true)), Some(AUTHOR), Utc::now()));
    }

    #[test]
    fn test_pub_date_equal_to_now_is_visible() {
        let p = post(Duration::zero(), true, None);
        assert!(is_publicly_visible(&p, None, p.pub_date));
    }

    #[test]
    fn test_unpublished_category_hides_post_but_not_from_author() {
        let p = post(Duration::hours(-1), true, Some(5));
        let hidden = category(false);
        assert!(!is_visible(&p, Some(&hidden), None, Utc::now()));
        assert!(is_visible(&p, Some(&hidden), Some(AUTHOR), Utc::now()));
    }

    #[test]
    fn test_non_author_matches_public_predicate_exhaustively() {
        let now = Utc::now();
        for offset in [Duration::hours(-2), Duration::zero(), Duration::hours(2)] {
            for published in [true, false] {
                for cat in [None, Some(category(true)), Some(category(false))] {
                    let p = post(offset, published, cat.as_ref().map(|c| c.id));
                    let public = is_publicly_visible(&p, cat.as_ref(), now);
                    assert_eq!(is_visible(&p, cat.as_ref(), None, now), public);
                    assert_eq!(is_visible(&p, cat.as_ref(), Some(OTHER), now), public);
                    assert!(is_visible(&p, cat.as_ref(), Some(AUTHOR), now));
                }
            }
        }
    }
}
