use serde::Deserialize;

use crate::models::PostSummary;

/// Query string of `/blog`: `?category=MLOps&tags=Python,Golang&q=deploy`.
#[derive(Deserialize, Debug, Default)]
pub struct BlogQuery {
    pub category: Option<String>,
    pub tags: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PostFilter {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub query: Option<String>,
}

impl From<BlogQuery> for PostFilter {
    fn from(query: BlogQuery) -> Self {
        let non_blank = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        PostFilter {
            category: non_blank(query.category),
            tags: query
                .tags
                .map(|t| {
                    t.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            query: non_blank(query.q),
        }
    }
}

impl PostFilter {
    pub fn matches(&self, post: &PostSummary) -> bool {
        if let Some(category) = &self.category {
            if &post.category != category {
                return false;
            }
        }

        if !self.tags.is_empty() && !self.tags.iter().any(|tag| post.tags.contains(tag)) {
            return false;
        }

        if let Some(query) = &self.query {
            let query = query.to_lowercase();
            if !post.title.to_lowercase().contains(&query)
                && !post.excerpt.to_lowercase().contains(&query)
            {
                return false;
            }
        }

        true
    }
}

/// Read-only view over the catalog for the blog listing page.
pub struct BlogIndex<'a> {
    posts: &'a [PostSummary],
}

impl<'a> BlogIndex<'a> {
    pub fn new(posts: &'a [PostSummary]) -> Self {
        BlogIndex { posts }
    }

    pub fn filter(&self, filter: &PostFilter) -> Vec<&'a PostSummary> {
        self.posts.iter().filter(|p| filter.matches(p)).collect()
    }

    /// Distinct categories in catalog order.
    pub fn categories(&self) -> Vec<&'a str> {
        let mut seen: Vec<&str> = Vec::new();
        for post in self.posts {
            if !seen.contains(&post.category.as_str()) {
                seen.push(&post.category);
            }
        }
        seen
    }

    /// Distinct tags in catalog order.
    pub fn tags(&self) -> Vec<&'a str> {
        let mut seen: Vec<&str> = Vec::new();
        for tag in self.posts.iter().flat_map(|p| &p.tags) {
            if !seen.contains(&tag.as_str()) {
                seen.push(tag);
            }
        }
        seen
    }
}
