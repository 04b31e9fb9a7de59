//! End-to-end tests for blog-feed against a seeded temporary database

use assert_cmd::Command;
use chrono::{Duration, Utc};
use libblogicum::{BlogStore, Database, NewCategory, NewComment, NewLocation, NewPost, NewUser};
use predicates::prelude::*;
use tempfile::TempDir;

struct Seeded {
    _temp_dir: TempDir,
    config_path: std::path::PathBuf,
    published_id: i64,
    draft_id: i64,
}

async fn seed() -> Seeded {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("blog.db");
    let db = Database::new(db_path.to_str().unwrap()).await.unwrap();

    let alice = db.create_user(&NewUser::new("alice")).await.unwrap();
    let bob = db.create_user(&NewUser::new("bob")).await.unwrap();
    let travel = db
        .create_category(&NewCategory::new("Travel", "travel"))
        .await
        .unwrap();
    db.create_category(&NewCategory::new("News", "news").unpublished())
        .await
        .unwrap();

    let mut hidden = NewLocation::new("Secret base");
    hidden.is_published = false;
    let hidden = db.create_location(&hidden).await.unwrap();

    let past = Utc::now() - Duration::days(1);
    let published = db
        .create_post(
            &NewPost::new(alice.id, "Trip to the mountains", "Body", past)
                .in_category(travel.id)
                .at_location(hidden.id),
        )
        .await
        .unwrap();
    let draft = db
        .create_post(&NewPost::new(alice.id, "Half-written draft", "Body", past).unpublished())
        .await
        .unwrap();
    db.create_comment(&NewComment {
        post_id: published.id,
        author_id: bob.id,
        text: "Looks lovely".to_string(),
    })
    .await
    .unwrap();
    db.close().await;

    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!("[database]\npath = \"{}\"\n", db_path.display()),
    )
    .unwrap();

    Seeded {
        _temp_dir: temp_dir,
        config_path,
        published_id: published.id,
        draft_id: draft.id,
    }
}

fn feed(seeded: &Seeded) -> Command {
    let mut cmd = Command::cargo_bin("blog-feed").unwrap();
    cmd.env("BLOGICUM_CONFIG", &seeded.config_path)
        .env_remove("BLOGICUM_DB_PATH")
        .env_remove("BLOGICUM_LOG_LEVEL")
        .env_remove("BLOGICUM_LOG_FORMAT");
    cmd
}

#[tokio::test]
async fn test_index_hides_drafts_from_anonymous() {
    let seeded = seed().await;

    feed(&seeded)
        .arg("index")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trip to the mountains"))
        .stdout(predicate::str::contains("1 comment"))
        .stdout(predicate::str::contains("Half-written draft").not())
        .stdout(predicate::str::contains("Page 1 of 1"));
}

#[tokio::test]
async fn test_author_sees_own_draft() {
    let seeded = seed().await;

    feed(&seeded)
        .args(["--as", "alice", "index"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Half-written draft"))
        .stdout(predicate::str::contains("unpublished"));

    feed(&seeded)
        .args(["--as", "bob", "index"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Half-written draft").not());
}

#[tokio::test]
async fn test_category_listing() {
    let seeded = seed().await;

    feed(&seeded)
        .args(["category", "travel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Travel"))
        .stdout(predicate::str::contains("Trip to the mountains"));
}

#[tokio::test]
async fn test_hidden_or_unknown_category_exits_not_found() {
    let seeded = seed().await;

    feed(&seeded)
        .args(["category", "news"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Error:"));

    feed(&seeded)
        .args(["--as", "alice", "category", "nowhere"])
        .assert()
        .code(4);
}

#[tokio::test]
async fn test_unknown_viewer_exits_not_found() {
    let seeded = seed().await;

    feed(&seeded)
        .args(["--as", "mallory", "index"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("mallory"));
}

#[tokio::test]
async fn test_json_page_shape() {
    let seeded = seed().await;

    let output = feed(&seeded)
        .args(["--format", "json", "--page", "99", "profile", "alice"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["page"], 1);
    assert_eq!(json["total_pages"], 1);
    assert_eq!(json["total_items"], 1);
    assert_eq!(json["has_next"], false);
    assert_eq!(json["profile"]["username"], "alice");
    assert_eq!(json["posts"][0]["title"], "Trip to the mountains");
    assert_eq!(json["posts"][0]["comment_count"], 1);
}

#[tokio::test]
async fn test_show_post_with_comments() {
    let seeded = seed().await;

    feed(&seeded)
        .args(["show", &seeded.published_id.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Trip to the mountains"))
        .stdout(predicate::str::contains("bob"))
        .stdout(predicate::str::contains("Looks lovely"));
}

#[tokio::test]
async fn test_show_draft_is_not_found_for_others() {
    let seeded = seed().await;
    let draft = seeded.draft_id.to_string();

    feed(&seeded).args(["show", &draft]).assert().code(4);
    feed(&seeded)
        .args(["--as", "bob", "show", &draft])
        .assert()
        .code(4);
    feed(&seeded)
        .args(["--as", "alice", "show", &draft])
        .assert()
        .success();
}

#[tokio::test]
async fn test_show_leaves_out_unpublished_location() {
    let seeded = seed().await;
    let id = seeded.published_id.to_string();

    let output = feed(&seeded)
        .args(["--format", "json", "show", &id])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["post"]["title"], "Trip to the mountains");
    assert!(json["post"]["location"].is_null());
    assert!(json["post"]["location_id"].is_null());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Secret base"));

    feed(&seeded)
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Secret base").not());
}
