//! blog-feed - Read the blog from the command line

use clap::{Parser, Subcommand};
use libblogicum::logging::LoggingConfig;
use libblogicum::pagination::parse_page;
use libblogicum::service::posts::PostDetail;
use libblogicum::{BlogService, Config, Page, PostSummary, Result, User};

#[derive(Parser, Debug)]
#[command(name = "blog-feed")]
#[command(version)]
#[command(about = "Browse blog posts")]
#[command(long_about = "\
blog-feed - Browse blog posts

DESCRIPTION:
    Lists posts newest first, ten per page, with their comment counts.
    Drafts, scheduled posts and posts in hidden categories are shown only
    to their author (see --as).

USAGE EXAMPLES:
    # Front page
    blog-feed index

    # Second page of a category
    blog-feed --page 2 category travel

    # A user's posts, as seen by that user (includes drafts)
    blog-feed --as alice profile alice

    # One post with its comments, as JSON
    blog-feed --format json show 42

CONFIGURATION:
    Configuration file: ~/.config/blogicum/config.toml
    Database location: ~/.local/share/blogicum/blog.db

    Override with environment variables:
        BLOGICUM_CONFIG    - Path to config file
        BLOGICUM_DB_PATH   - Path to database file

EXIT CODES:
    0 - Success (including empty pages)
    1 - Database or configuration error
    3 - Invalid input
    4 - Not found (unknown post, category, user, or hidden post)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// View as this user
    #[arg(long = "as", value_name = "USERNAME", global = true)]
    viewer: Option<String>,

    /// Page number (out-of-range values snap to the first or last page)
    #[arg(short, long, value_name = "N", global = true, allow_hyphen_values = true)]
    page: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    #[arg(value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// All visible posts
    Index,

    /// Posts of a category
    Category {
        /// Category slug
        slug: String,
    },

    /// Posts of a user
    Profile {
        /// Username
        username: String,
    },

    /// One post with its comments
    Show {
        /// Post ID
        post_id: i64,
    },
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

    tracing::debug!("blog-feed started with args: {:?}", cli);

    let service = BlogService::from_config(&config).await?;
    let (_, ctx) = service.view_context(cli.viewer.as_deref()).await?;
    let page = parse_page(cli.page.as_deref());

    match cli.command {
        Commands::Index => {
            let posts = service.listing().index(&ctx, page).await?;
            output_page(&cli.format, None, &posts);
        }
        Commands::Category { slug } => {
            let listing = service.listing().category(&slug, &ctx, page).await?;
            let header = serde_json::json!({
                "category": {
                    "slug": listing.category.slug,
                    "title": listing.category.title,
                    "description": listing.category.description,
                }
            });
            if cli.format == "text" {
                println!("# {}", listing.category.title);
                if !listing.category.description.is_empty() {
                    println!("{}", listing.category.description);
                }
                println!();
            }
            output_page(&cli.format, Some(header), &listing.posts);
        }
        Commands::Profile { username } => {
            let listing = service.listing().profile(&username, &ctx, page).await?;
            if cli.format == "text" {
                print_profile_header(&listing.profile);
            }
            let header = serde_json::json!({
                "profile": {
                    "username": listing.profile.username,
                    "first_name": listing.profile.first_name,
                    "last_name": listing.profile.last_name,
                    "date_joined": listing.profile.date_joined,
                }
            });
            output_page(&cli.format, Some(header), &listing.posts);
        }
        Commands::Show { post_id } => {
            let detail = service.posts().detail(post_id, &ctx).await?;
            output_detail(&cli.format, &detail);
        }
    }

    Ok(())
}

fn print_profile_header(profile: &User) {
    let full_name = format!("{} {}", profile.first_name, profile.last_name);
    if full_name.trim().is_empty() {
        println!("# {}", profile.username);
    } else {
        println!("# {} ({})", profile.username, full_name.trim());
    }
    println!("Joined {}", profile.date_joined.format("%Y-%m-%d"));
    println!();
}

/// Print one page of posts
///
/// `header` fields are merged into the JSON object for `json` output.
fn output_page(format: &str, header: Option<serde_json::Value>, page: &Page<PostSummary>) {
    match format {
        "json" => {
            let mut json = serde_json::json!({
                "page": page.number,
                "total_pages": page.total_pages,
                "total_items": page.total_items,
                "has_next": page.has_next(),
                "has_previous": page.has_previous(),
                "next_page": page.next_page_number(),
                "previous_page": page.previous_page_number(),
                "posts": page.items,
            });
            if let (Some(serde_json::Value::Object(extra)), Some(obj)) = (header, json.as_object_mut()) {
                obj.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        "jsonl" => {
            for summary in &page.items {
                if let Ok(line) = serde_json::to_string(summary) {
                    println!("{}", line);
                }
            }
        }
        _ => {
            for summary in &page.items {
                println!("{}", format_summary_line(summary));
            }
            if page.is_empty() {
                println!("No posts.");
            }
            println!();
            match page.next_page_number() {
                Some(next) => println!("Page {} of {} (next: --page {})", page.number, page.total_pages, next),
                None => println!("Page {} of {}", page.number, page.total_pages),
            }
        }
    }
}

fn format_summary_line(summary: &PostSummary) -> String {
    let mut line = format!(
        "{} | {} | {} | by {}",
        summary.post.pub_date.format("%Y-%m-%d %H:%M"),
        summary.post.id,
        truncate_content(&summary.post.title, 60),
        summary.author,
    );
    if let Some(ref category) = summary.category {
        line.push_str(&format!(" | {}", category.slug));
    }
    line.push_str(&format!(
        " | {} comment{}",
        summary.comment_count,
        if summary.comment_count == 1 { "" } else { "s" }
    ));
    if !summary.post.is_published {
        line.push_str(" | unpublished");
    }
    line
}

fn output_detail(format: &str, detail: &PostDetail) {
    match format {
        "json" | "jsonl" => {
            let json = serde_json::json!({
                "post": detail.post,
                "comments": detail.comments,
            });
            let rendered = if format == "json" {
                serde_json::to_string_pretty(&json)
            } else {
                serde_json::to_string(&json)
            };
            println!("{}", rendered.unwrap_or_default());
        }
        _ => {
            let summary = &detail.post;
            println!("# {}", summary.post.title);
            println!(
                "{} by {}",
                summary.post.pub_date.format("%Y-%m-%d %H:%M"),
                summary.author
            );
            if let Some(ref category) = summary.category {
                println!("Category: {}", category.title);
            }
            if let Some(ref location) = summary.location {
                println!("Location: {}", location.name);
            }
            if let Some(ref image) = summary.post.image {
                println!("Image: {}", image);
            }
            println!();
            println!("{}", summary.post.text);
            println!();
            println!("Comments ({}):", summary.comment_count);
            for view in &detail.comments {
                println!(
                    "  [{}] {} at {}: {}",
                    view.comment.id,
                    view.author,
                    view.comment.created_at.format("%Y-%m-%d %H:%M"),
                    view.comment.text
                );
            }
        }
    }
}

/// Truncate to `max_chars` characters with an ellipsis
fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
