//! Front-matter splitting and the line-oriented metadata parser.
//!
//! A post looks like:
//!
//! ```text
//! ---
//! title: Hello
//! tags: [A, B]
//! ---
//! Body text
//! ```

use tracing::debug;

use crate::dates::normalize_date;
use crate::error::ContentError;
use crate::models::{ContentItem, DEFAULT_CATEGORY, DEFAULT_READ_TIME, DEFAULT_TITLE};

pub const DELIMITER: &str = "---";

/// Splits raw text into `(metadata_block, body)`.
///
/// The first line must be the delimiter and a later line must close it.
/// Neither delimiter line ends up in either half.
pub fn split_front_matter(raw: &str) -> Result<(String, String), ContentError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let lines: Vec<&str> = raw.lines().collect();

    match lines.first() {
        Some(first) if first.trim_end() == DELIMITER => {}
        _ => {
            return Err(ContentError::MalformedContent {
                reason: "missing opening front-matter delimiter",
            })
        }
    }

    let end = lines
        .iter()
        .skip(1)
        .position(|line| line.trim_end() == DELIMITER)
        .map(|i| i + 1)
        .ok_or(ContentError::MalformedContent {
            reason: "missing closing front-matter delimiter",
        })?;

    let metadata = lines[1..end].join("\n");
    let body = trim_blank_lines(&lines[end + 1..]);
    Ok((metadata, body))
}

/// Joins lines, dropping blank lines at either end. Inner blank lines and
/// indentation are preserved.
pub fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

/// Trims whitespace and one pair of matching surrounding quotes.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].trim();
        }
    }
    value
}

/// Parses a tag value. `[a, "b", 'c']` yields three tags; any other
/// non-empty value is a single tag.
pub fn parse_tags(value: &str) -> Vec<String> {
    let value = value.trim();
    match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        Some(inner) => inner
            .split(',')
            .map(strip_quotes)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        None => {
            let tag = strip_quotes(value);
            if tag.is_empty() {
                Vec::new()
            } else {
                vec![tag.to_string()]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Excerpt,
    Date,
    Category,
    Tags,
    ReadTime,
}

impl Field {
    /// Maps a metadata key to its field and priority (0 = primary spelling).
    fn from_key(key: &str) -> Option<(Field, u8)> {
        let field = match key {
            "title" => (Field::Title, 0),
            "excerpt" => (Field::Excerpt, 0),
            "description" => (Field::Excerpt, 1),
            "date" => (Field::Date, 0),
            "published" => (Field::Date, 1),
            "category" => (Field::Category, 0),
            "categories" => (Field::Category, 1),
            "tags" => (Field::Tags, 0),
            "tag" => (Field::Tags, 1),
            "readTime" => (Field::ReadTime, 0),
            "read_time" => (Field::ReadTime, 1),
            "read-time" => (Field::ReadTime, 2),
            _ => return None,
        };
        Some(field)
    }
}

/// One metadata slot; a value only replaces another of equal or lower
/// priority.
#[derive(Debug)]
struct Slot<T> {
    value: Option<(u8, T)>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot { value: None }
    }
}

impl<T> Slot<T> {
    fn offer(&mut self, priority: u8, value: T) {
        match &self.value {
            Some((current, _)) if *current < priority => {}
            _ => self.value = Some((priority, value)),
        }
    }

    fn take(self) -> Option<T> {
        self.value.map(|(_, v)| v)
    }
}

/// Typed front-matter record, before defaults are applied.
#[derive(Debug, Default)]
pub struct Metadata {
    title: Slot<String>,
    excerpt: Slot<String>,
    date: Slot<String>,
    category: Slot<String>,
    tags: Slot<Vec<String>>,
    read_time: Slot<String>,
}

impl Metadata {
    pub fn parse(block: &str) -> Self {
        let mut metadata = Metadata::default();
        for line in block.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            match Field::from_key(key) {
                Some((field, priority)) => metadata.apply(field, priority, value),
                None => debug!("Ignoring unknown front matter key: {}", key),
            }
        }
        metadata
    }

    fn apply(&mut self, field: Field, priority: u8, value: &str) {
        match field {
            Field::Title => self.title.offer(priority, strip_quotes(value).to_string()),
            Field::Excerpt => self.excerpt.offer(priority, strip_quotes(value).to_string()),
            Field::Date => self.date.offer(priority, value.to_string()),
            Field::Category => {
                // `categories: [a, b]` keeps the first entry
                let category = if value.trim().starts_with('[') {
                    parse_tags(value).into_iter().next().unwrap_or_default()
                } else {
                    strip_quotes(value).to_string()
                };
                self.category.offer(priority, category);
            }
            Field::Tags => self.tags.offer(priority, parse_tags(value)),
            Field::ReadTime => self.read_time.offer(priority, normalize_read_time(value)),
        }
    }

    /// Applies defaults and normalization, attaching `body`.
    pub fn into_item(self, body: String) -> ContentItem {
        let or_default = |value: Option<String>, default: &str| {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        ContentItem {
            title: or_default(self.title.take(), DEFAULT_TITLE),
            excerpt: self.excerpt.take().unwrap_or_default(),
            date: self.date.take().map(|d| normalize_date(&d)).unwrap_or_default(),
            category: or_default(self.category.take(), DEFAULT_CATEGORY),
            tags: self.tags.take().unwrap_or_default(),
            read_time: or_default(self.read_time.take(), DEFAULT_READ_TIME),
            body,
        }
    }
}

/// A bare minute count such as `8` becomes `8 min read`.
fn normalize_read_time(value: &str) -> String {
    let value = strip_quotes(value);
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        format!("{value} min read")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_metadata_from_body() {
        let raw = "---\ntitle: Hello\n---\n\nBody text\n\n";
        let (metadata, body) = split_front_matter(raw).unwrap();
        assert_eq!(metadata, "title: Hello");
        assert_eq!(body, "Body text");
    }

    #[test]
    fn body_keeps_later_horizontal_rules() {
        let raw = "---\ntitle: x\n---\nabove\n\n---\n\nbelow";
        let (_, body) = split_front_matter(raw).unwrap();
        assert_eq!(body, "above\n\n---\n\nbelow");
    }

    #[test]
    fn tolerates_crlf_and_bom() {
        let raw = "\u{feff}---\r\ntitle: Hi\r\n---\r\nBody";
        let (metadata, body) = split_front_matter(raw).unwrap();
        assert_eq!(Metadata::parse(&metadata).into_item(body).title, "Hi");
    }

    #[test]
    fn missing_closing_delimiter_is_malformed() {
        let err = split_front_matter("---\ntitle: Hello\nBody").unwrap_err();
        assert!(matches!(err, ContentError::MalformedContent { .. }));
    }

    #[test]
    fn missing_opening_delimiter_is_malformed() {
        let err = split_front_matter("# Just markdown").unwrap_err();
        assert!(matches!(err, ContentError::MalformedContent { .. }));
        assert!(split_front_matter("").is_err());
    }

    #[test]
    fn parses_bracketed_tags() {
        assert_eq!(parse_tags("[a, b, c]"), vec!["a", "b", "c"]);
        assert_eq!(
            parse_tags(r#"["Finland", 'Student Life', Moving Abroad]"#),
            vec!["Finland", "Student Life", "Moving Abroad"]
        );
        assert!(parse_tags("[]").is_empty());
    }

    #[test]
    fn single_tag_value_is_one_element() {
        assert_eq!(parse_tags(" rust "), vec!["rust"]);
        assert!(parse_tags("  ").is_empty());
    }

    #[test]
    fn strips_only_surrounding_quotes() {
        assert_eq!(strip_quotes("\"It's fine\""), "It's fine");
        assert_eq!(strip_quotes("'quoted'"), "quoted");
        assert_eq!(strip_quotes("\"unbalanced'"), "\"unbalanced'");
    }

    #[test]
    fn value_keeps_text_after_first_colon() {
        let item = Metadata::parse("title: Rust: a love story").into_item(String::new());
        assert_eq!(item.title, "Rust: a love story");
    }

    #[test]
    fn lines_without_colon_and_unknown_keys_are_ignored() {
        let item = Metadata::parse("just words\nauthor: me\ntitle: T").into_item(String::new());
        assert_eq!(item.title, "T");
        assert_eq!(item.category, "Uncategorized");
    }

    #[test]
    fn applies_defaults() {
        let item = Metadata::parse("").into_item("b".to_string());
        assert_eq!(item.title, "Untitled");
        assert_eq!(item.category, "Uncategorized");
        assert_eq!(item.read_time, "5 min read");
        assert_eq!(item.excerpt, "");
        assert!(item.tags.is_empty());
    }

    #[test]
    fn primary_key_beats_alternates_regardless_of_order() {
        let item = Metadata::parse("read-time: 3 min read\nread_time: 4 min read\nreadTime: 9 min read")
            .into_item(String::new());
        assert_eq!(item.read_time, "9 min read");

        let item = Metadata::parse("read-time: 3 min read\nread_time: 4 min read").into_item(String::new());
        assert_eq!(item.read_time, "4 min read");
    }

    #[test]
    fn categories_list_uses_first_entry() {
        let item = Metadata::parse("categories: [MLOps, Python]").into_item(String::new());
        assert_eq!(item.category, "MLOps");
    }

    #[test]
    fn bare_minutes_become_read_time_label() {
        let item = Metadata::parse("readTime: 8").into_item(String::new());
        assert_eq!(item.read_time, "8 min read");
    }
}
