use serde::Serialize;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const DEFAULT_READ_TIME: &str = "5 min read";

/// A blog post parsed from its markdown source.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub category: String,
    pub tags: Vec<String>,
    pub read_time: String,
    pub body: String,
}

impl ContentItem {
    /// Item with every metadata field at its default and the given body.
    pub fn with_body(body: String) -> Self {
        ContentItem {
            title: DEFAULT_TITLE.to_string(),
            excerpt: String::new(),
            date: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            tags: Vec::new(),
            read_time: DEFAULT_READ_TIME.to_string(),
            body,
        }
    }
}

/// Catalog entry: everything about a post except its body.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub category: String,
    pub tags: Vec<String>,
    pub read_time: String,
}

impl PostSummary {
    pub fn new(slug: &str, item: &ContentItem) -> Self {
        PostSummary {
            slug: slug.to_string(),
            title: item.title.clone(),
            excerpt: item.excerpt.clone(),
            date: item.date.clone(),
            category: item.category.clone(),
            tags: item.tags.clone(),
            read_time: item.read_time.clone(),
        }
    }
}
