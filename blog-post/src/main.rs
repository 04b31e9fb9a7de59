//! blog-post - Write to the blog from the command line

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use libblogicum::logging::LoggingConfig;
use libblogicum::service::posts::PostForm;
use libblogicum::service::profiles::ProfileForm;
use libblogicum::validation::validate_slug;
use libblogicum::{BlogError, BlogService, Config, Result, User, ViewContext};

#[derive(Parser, Debug)]
#[command(name = "blog-post")]
#[command(version)]
#[command(about = "Create and manage your posts, comments and profile")]
#[command(long_about = "\
blog-post - Create and manage your posts, comments and profile

DESCRIPTION:
    Every command acts on behalf of the user given with --as (or the
    BLOGICUM_USER environment variable). Posts and comments can only be
    edited or deleted by the user who wrote them.

    On success the ID of the affected post or comment is printed to stdout.

USAGE EXAMPLES:
    # Publish a post in a category
    blog-post --as alice create \"Trip report\" \"Three days in the hills\" --category travel

    # Schedule a post for later
    blog-post --as alice create \"Launch\" \"Coming soon\" --pub-date 2030-01-01

    # Save a draft, then publish it
    blog-post --as alice create \"Notes\" \"Unfinished\" --draft
    blog-post --as alice edit 7 --publish

    # Comment on someone else's post
    blog-post --as bob comment add 7 \"Nice!\"

    # Rename yourself
    blog-post --as alice profile --username alice_w

DATES:
    --pub-date accepts a Unix timestamp, RFC 3339 (2030-01-01T09:00:00Z)
    or a plain date (2030-01-01, midnight UTC).

EXIT CODES:
    0 - Success
    1 - Database or configuration error
    2 - Permission denied (not the author, or not signed in)
    3 - Invalid input
    4 - Not found
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Act as this user
    #[arg(long = "as", value_name = "USERNAME", env = "BLOGICUM_USER", global = true)]
    actor: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a new post
    Create {
        /// Post title
        title: String,

        /// Post body
        text: String,

        /// Publication date (defaults to now)
        #[arg(long, value_name = "DATE")]
        pub_date: Option<String>,

        /// Save without publishing
        #[arg(long)]
        draft: bool,

        /// Category slug
        #[arg(long, value_name = "SLUG")]
        category: Option<String>,

        /// Location ID
        #[arg(long, value_name = "ID")]
        location: Option<i64>,

        /// Image path or URL
        #[arg(long)]
        image: Option<String>,
    },

    /// Change one of your posts
    Edit {
        /// Post ID
        post_id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        text: Option<String>,

        #[arg(long, value_name = "DATE")]
        pub_date: Option<String>,

        /// Mark as published
        #[arg(long, conflicts_with = "draft")]
        publish: bool,

        /// Mark as unpublished
        #[arg(long)]
        draft: bool,

        /// Category slug
        #[arg(long, value_name = "SLUG", conflicts_with = "clear_category")]
        category: Option<String>,

        /// Remove the category
        #[arg(long)]
        clear_category: bool,

        /// Location ID
        #[arg(long, value_name = "ID", conflicts_with = "clear_location")]
        location: Option<i64>,

        /// Remove the location
        #[arg(long)]
        clear_location: bool,

        #[arg(long)]
        image: Option<String>,
    },

    /// Delete one of your posts and its comments
    Delete {
        /// Post ID
        post_id: i64,
    },

    /// Manage comments
    #[command(subcommand)]
    Comment(CommentCommands),

    /// Edit your profile
    Profile {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CommentCommands {
    /// Comment on a post
    Add { post_id: i64, text: String },

    /// Change one of your comments
    Edit {
        post_id: i64,
        comment_id: i64,
        text: String,
    },

    /// Delete one of your comments
    Delete { post_id: i64, comment_id: i64 },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    LoggingConfig::from_section(&config.logging, cli.verbose).init();

    tracing::debug!("blog-post started with args: {:?}", cli);

    let username = cli.actor.as_deref().ok_or_else(|| {
        BlogError::PermissionDenied("Sign in with --as USERNAME or BLOGICUM_USER".to_string())
    })?;

    let service = BlogService::from_config(&config).await?;
    let actor = service.profiles().profile(username).await?;
    let ctx = ViewContext::as_user(actor.id);

    match cli.command {
        Commands::Create {
            title,
            text,
            pub_date,
            draft,
            category,
            location,
            image,
        } => {
            let form = PostForm {
                title,
                text,
                pub_date: match pub_date {
                    Some(s) => parse_date(&s)?,
                    None => ctx.now,
                },
                is_published: !draft,
                category_id: resolve_category(&service, category.as_deref()).await?,
                location_id: location,
                image,
            };
            let post = service.posts().create(actor.id, form).await?;
            println!("{}", post.id);
        }
        Commands::Edit {
            post_id,
            title,
            text,
            pub_date,
            publish,
            draft,
            category,
            clear_category,
            location,
            clear_location,
            image,
        } => {
            let existing = service.posts().owned_post(post_id, actor.id).await?;
            let mut form = PostForm::from_post(&existing);

            if let Some(title) = title {
                form.title = title;
            }
            if let Some(text) = text {
                form.text = text;
            }
            if let Some(s) = pub_date {
                form.pub_date = parse_date(&s)?;
            }
            if publish {
                form.is_published = true;
            } else if draft {
                form.is_published = false;
            }
            if clear_category {
                form.category_id = None;
            } else if category.is_some() {
                form.category_id = resolve_category(&service, category.as_deref()).await?;
            }
            if clear_location {
                form.location_id = None;
            } else if location.is_some() {
                form.location_id = location;
            }
            if image.is_some() {
                form.image = image;
            }

            let post = service.posts().update(post_id, actor.id, form).await?;
            println!("{}", post.id);
        }
        Commands::Delete { post_id } => {
            service.posts().delete(post_id, actor.id).await?;
            println!("{}", post_id);
        }
        Commands::Comment(CommentCommands::Add { post_id, text }) => {
            let comment = service.comments().add(post_id, &text, &ctx).await?;
            println!("{}", comment.id);
        }
        Commands::Comment(CommentCommands::Edit {
            post_id,
            comment_id,
            text,
        }) => {
            let comment = service
                .comments()
                .edit(post_id, comment_id, actor.id, &text)
                .await?;
            println!("{}", comment.id);
        }
        Commands::Comment(CommentCommands::Delete { post_id, comment_id }) => {
            service.comments().delete(post_id, comment_id, actor.id).await?;
            println!("{}", comment_id);
        }
        Commands::Profile {
            username,
            first_name,
            last_name,
            email,
        } => {
            let updated = update_profile(&service, &actor, username, first_name, last_name, email).await?;
            println!("{}", updated.username);
        }
    }

    Ok(())
}

async fn update_profile(
    service: &BlogService,
    actor: &User,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
) -> Result<User> {
    let mut form = ProfileForm::from_user(actor);
    if let Some(username) = username {
        form.username = username;
    }
    if let Some(first_name) = first_name {
        form.first_name = first_name;
    }
    if let Some(last_name) = last_name {
        form.last_name = last_name;
    }
    if let Some(email) = email {
        form.email = email;
    }
    service.profiles().update(actor.id, form).await
}

/// Map a category slug to its ID
async fn resolve_category(service: &BlogService, slug: Option<&str>) -> Result<Option<i64>> {
    let Some(slug) = slug else {
        return Ok(None);
    };
    validate_slug(slug)?;
    service
        .store()
        .get_category_by_slug(slug)
        .await?
        .map(|c| Some(c.id))
        .ok_or_else(|| BlogError::InvalidInput(format!("Unknown category: {}", slug)))
}

/// Parse a Unix timestamp, an RFC 3339 date-time or a YYYY-MM-DD date
fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    let invalid = || {
        BlogError::InvalidInput(format!(
            "Invalid date format: {}. Use Unix timestamp or ISO 8601 (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SSZ)",
            date_str
        ))
    };

    if let Ok(timestamp) = date_str.parse::<i64>() {
        return Utc.timestamp_opt(timestamp, 0).single().ok_or_else(invalid);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2030-01-01").unwrap(), expected);
        assert_eq!(parse_date("2030-01-01T00:00:00Z").unwrap(), expected);
        assert_eq!(parse_date("2030-01-01T03:00:00+03:00").unwrap(), expected);
        assert_eq!(parse_date(&expected.timestamp().to_string()).unwrap(), expected);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        let err = parse_date("next tuesday").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_edit_publish_conflicts_with_draft() {
        let result = Cli::try_parse_from(["blog-post", "--as", "alice", "edit", "1", "--publish", "--draft"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_comment_subcommands_parse() {
        let cli = Cli::try_parse_from(["blog-post", "comment", "edit", "3", "9", "fixed typo", "--as", "bob"])
            .unwrap();
        assert_eq!(cli.actor.as_deref(), Some("bob"));
        assert!(matches!(
            cli.command,
            Commands::Comment(CommentCommands::Edit { post_id: 3, comment_id: 9, .. })
        ));
    }
}
