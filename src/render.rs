//! HTML assembly for pages. Post bodies come from `markdown`; everything
//! else is small string templates dropped into the site layout.

use htmlescape::encode_minimal;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::blog_index::{BlogIndex, PostFilter};
use crate::content_loader::SiteContent;
use crate::dates::display_date;
use crate::hot_reload::HOT_RELOAD_SCRIPT;
use crate::models::{ContentItem, PostSummary};

/// Tags shown on a card before collapsing into `+N`.
const CARD_TAG_LIMIT: usize = 3;

pub fn render_with_layout(site: &SiteContent, title: &str, content: &str, is_development: bool) -> String {
    let mut list_items = String::new();
    for post in &site.posts {
        list_items.push_str(&format!(
            "<li><a href=\"/blog/{}\" class=\"text-blue no-underline\">{}</a></li>",
            encode_minimal(&post.slug),
            encode_minimal(&post.title)
        ));
    }

    let mut page = site
        .layout_html
        .replace("{{ title }}", &encode_minimal(title))
        .replace("{{ banner }}", &site.banner_html)
        .replace("{{ posts }}", &list_items)
        .replace("{{ content }}", content);

    if is_development {
        page = page.replace("</body>", &format!("{}</body>", HOT_RELOAD_SCRIPT));
    }

    page
}

fn tag_badges(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("<span class=\"badge badge-outline\">{}</span>", encode_minimal(tag)))
        .collect()
}

/// Article header, meta line, tags and the rendered body.
pub fn render_post_body(item: &ContentItem, body_html: &str) -> String {
    format!(
        concat!(
            "<article class=\"post\">",
            "<a href=\"/blog\" class=\"back-link\">Back to Blog</a>",
            "<header>",
            "<span class=\"badge\">{category}</span>",
            "<h1>{title}</h1>",
            "<p class=\"excerpt\">{excerpt}</p>",
            "<div class=\"post-meta\"><time datetime=\"{date_attr}\">{date}</time><span class=\"read-time\">{read_time}</span></div>",
            "<div class=\"tags\">{tags}</div>",
            "</header>",
            "<div class=\"prose\">{body}</div>",
            "</article>"
        ),
        category = encode_minimal(&item.category),
        title = encode_minimal(&item.title),
        excerpt = encode_minimal(&item.excerpt),
        date_attr = encode_minimal(&item.date),
        date = encode_minimal(&display_date(&item.date)),
        read_time = encode_minimal(&item.read_time),
        tags = tag_badges(&item.tags),
        body = body_html,
    )
}

fn post_card(post: &PostSummary) -> String {
    let shown = post.tags.len().min(CARD_TAG_LIMIT);
    let mut tags = tag_badges(&post.tags[..shown]);
    if post.tags.len() > CARD_TAG_LIMIT {
        tags.push_str(&format!(
            "<span class=\"badge badge-outline\">+{}</span>",
            post.tags.len() - CARD_TAG_LIMIT
        ));
    }
    format!(
        concat!(
            "<li class=\"post-card\">",
            "<span class=\"badge\">{category}</span>",
            "<div class=\"post-meta\">{date} &bull; {read_time}</div>",
            "<h3><a href=\"/blog/{slug}\">{title}</a></h3>",
            "<p>{excerpt}</p>",
            "<div class=\"tags\">{tags}</div>",
            "</li>"
        ),
        category = encode_minimal(&post.category),
        date = encode_minimal(&display_date(&post.date)),
        read_time = encode_minimal(&post.read_time),
        slug = encode_minimal(&post.slug),
        title = encode_minimal(&post.title),
        excerpt = encode_minimal(&post.excerpt),
        tags = tags,
    )
}

fn filter_link(label: &str, href: &str, active: bool) -> String {
    let class = if active { " class=\"active\"" } else { "" };
    format!(
        "<li><a href=\"{}\"{}>{}</a></li>",
        encode_minimal(href),
        class,
        encode_minimal(label)
    )
}

/// Blog listing with category and tag filter links.
pub fn render_blog_index(index: &BlogIndex<'_>, filter: &PostFilter) -> String {
    let categories: String = index
        .categories()
        .into_iter()
        .map(|c| {
            let active = filter.category.as_deref() == Some(c);
            filter_link(c, &format!("/blog?category={}", query_escape(c)), active)
        })
        .collect();
    let tags: String = index
        .tags()
        .into_iter()
        .map(|t| {
            let active = filter.tags.iter().any(|s| s == t);
            filter_link(t, &format!("/blog?tags={}", query_escape(t)), active)
        })
        .collect();

    let matches = index.filter(filter);
    let listing = if matches.is_empty() {
        "<p class=\"empty\">No articles match the selected filters.</p>".to_string()
    } else {
        let cards: String = matches.into_iter().map(post_card).collect();
        format!("<ul class=\"post-list\">{cards}</ul>")
    };

    format!(
        concat!(
            "<section class=\"blog\">",
            "<h1>Blog</h1>",
            "<aside>",
            "<form method=\"get\" action=\"/blog\"><input name=\"q\" placeholder=\"Search articles...\" value=\"{query}\"></form>",
            "<h3>Categories</h3><ul class=\"categories\">{categories}</ul>",
            "<h3>Tags</h3><ul class=\"tags\">{tags}</ul>",
            "<a href=\"/blog\" class=\"clear-filters\">Clear filters</a>",
            "</aside>",
            "{listing}",
            "</section>"
        ),
        query = encode_minimal(filter.query.as_deref().unwrap_or("")),
        categories = categories,
        tags = tags,
        listing = listing,
    )
}

fn query_escape(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

pub fn render_not_found(site: &SiteContent, slug: &str) -> String {
    site.not_found_html.replace("{{slug}}", &encode_minimal(slug))
}

pub fn render_contact_result(message: &str, success: bool) -> String {
    let class = if success { "notice success" } else { "notice error" };
    format!(
        "<section class=\"contact\"><p class=\"{class}\">{}</p><a href=\"/\">Back home</a></section>",
        encode_minimal(message)
    )
}
