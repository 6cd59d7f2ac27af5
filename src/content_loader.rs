use std::{cmp::Reverse, path::Path, sync::atomic::Ordering};

use futures::future::join_all;
use tokio::fs;
use tracing::{error, info, warn};

use crate::config::SiteConfig;
use crate::content_store::{ContentStore, FsContentStore, Slug};
use crate::dates::parse_normalized_date;
use crate::error::ContentError;
use crate::frontmatter::{split_front_matter, trim_blank_lines, Metadata};
use crate::markdown::{render_markdown_to_html, StyleRules};
use crate::models::{ContentItem, PostSummary};
use crate::state::AppState;

/// Strict parse: fails with `MalformedContent` when there is no delimiter pair.
pub fn parse_content_item(raw: &str) -> Result<ContentItem, ContentError> {
    let (metadata, body) = split_front_matter(raw)?;
    Ok(Metadata::parse(&metadata).into_item(body))
}

/// Lenient parse: malformed front matter degrades to default metadata with
/// the whole text as body.
pub fn parse_content_item_or_fallback(raw: &str) -> ContentItem {
    match parse_content_item(raw) {
        Ok(item) => item,
        Err(e) => {
            warn!("Falling back to metadata-less content: {}", e);
            let lines: Vec<&str> = raw.lines().collect();
            ContentItem::with_body(trim_blank_lines(&lines))
        }
    }
}

/// Loads one post. Only retrieval can fail; parsing always degrades.
pub async fn load_content_item<S: ContentStore>(
    store: &S,
    slug: &Slug,
) -> Result<ContentItem, ContentError> {
    let raw = store.retrieve(slug).await?;
    Ok(parse_content_item_or_fallback(&raw))
}

/// Summaries of every post, newest first. Posts without a usable date come
/// after all dated ones; ties are ordered by slug.
///
/// A post that cannot be read is logged and left out rather than failing
/// the whole catalog.
pub async fn load_catalog<S: ContentStore>(store: &S) -> Result<Vec<PostSummary>, ContentError> {
    let slugs = store.slugs().await?;
    let loads = slugs.iter().map(|slug| async move {
        let item = load_content_item(store, slug).await;
        (slug, item)
    });

    let mut posts = Vec::new();
    for (slug, result) in join_all(loads).await {
        match result {
            Ok(item) => posts.push(PostSummary::new(slug.as_str(), &item)),
            // removed between listing and reading
            Err(e) if e.is_not_found() => warn!("Post {} disappeared while loading", slug),
            Err(e) => warn!("Skipping unreadable post {}: {}", slug, e),
        }
    }

    posts.sort_by_cached_key(|p| (Reverse(parse_normalized_date(&p.date)), p.slug.clone()));
    Ok(posts)
}

/// Everything the site renders around individual posts.
pub struct SiteContent {
    pub banner_html: String,
    pub layout_html: String,
    pub home_html: String,
    pub not_found_html: String,
    pub posts: Vec<PostSummary>,
}

pub async fn load_site_content(
    content_dir: &Path,
    rules: &StyleRules,
) -> Result<SiteContent, ContentError> {
    let banner_html = fs::read_to_string(content_dir.join("banner.html")).await?;
    let layout_html = fs::read_to_string(content_dir.join("layout.html")).await?;
    let not_found_html = fs::read_to_string(content_dir.join("not_found.html")).await?;

    let home_md = fs::read_to_string(content_dir.join("home.md")).await?;
    let home = parse_content_item_or_fallback(&home_md);
    let home_html = render_markdown_to_html(&home.body, rules);

    let store = FsContentStore::new(SiteConfig::posts_dir_of(content_dir));
    let posts = load_catalog(&store).await?;

    Ok(SiteContent {
        banner_html,
        layout_html,
        home_html,
        not_found_html,
        posts,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Committed,
    Stale,
    Failed,
}

/// Reloads site content into `app_state`.
///
/// Each call takes a generation ticket first and only commits if no later
/// reload started while it was loading.
pub async fn reload_content(app_state: &AppState) -> ReloadOutcome {
    let ticket = app_state.generation.fetch_add(1, Ordering::SeqCst) + 1;
    info!(ticket, "Reloading application content...");

    let loaded = load_site_content(&app_state.config.content_dir, &app_state.style_rules).await;
    commit_content(app_state, ticket, loaded).await
}

async fn commit_content(
    app_state: &AppState,
    ticket: u64,
    loaded: Result<SiteContent, ContentError>,
) -> ReloadOutcome {
    match loaded {
        Ok(content) => {
            let mut site = app_state.site.write().await;
            if app_state.generation.load(Ordering::SeqCst) != ticket {
                info!(ticket, "Discarding stale content reload");
                return ReloadOutcome::Stale;
            }
            *site = content;
            info!("Content successfully reloaded.");
            ReloadOutcome::Committed
        }
        Err(e) => {
            error!("Failed to reload content: {}", e);
            ReloadOutcome::Failed
        }
    }
}
