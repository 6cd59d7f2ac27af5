use std::collections::HashMap;

use htmlescape::encode_minimal;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::error::ConfigError;

/// Markdown elements that can carry a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyledTag {
    H1,
    H2,
    H3,
    Paragraph,
    UnorderedList,
    OrderedList,
    InlineCode,
    CodeBlock,
    BlockQuote,
    Link,
}

impl StyledTag {
    pub fn from_name(name: &str) -> Option<Self> {
        let tag = match name {
            "h1" => StyledTag::H1,
            "h2" => StyledTag::H2,
            "h3" => StyledTag::H3,
            "p" => StyledTag::Paragraph,
            "ul" => StyledTag::UnorderedList,
            "ol" => StyledTag::OrderedList,
            "code" => StyledTag::InlineCode,
            "pre" => StyledTag::CodeBlock,
            "blockquote" => StyledTag::BlockQuote,
            "a" => StyledTag::Link,
            _ => return None,
        };
        Some(tag)
    }
}

/// Tag name to CSS class mapping applied while rendering post bodies.
#[derive(Debug, Clone, Default)]
pub struct StyleRules {
    classes: HashMap<StyledTag, String>,
}

impl StyleRules {
    /// The site's standard typography.
    pub fn portfolio() -> Self {
        let mut rules = StyleRules::default();
        for (tag, class) in [
            (StyledTag::H1, "text-3xl font-bold mt-8 mb-4"),
            (StyledTag::H2, "text-2xl font-semibold mt-6 mb-3"),
            (StyledTag::H3, "text-xl font-medium mt-4 mb-2"),
            (StyledTag::Paragraph, "mb-4 leading-relaxed"),
            (StyledTag::UnorderedList, "list-disc list-inside mb-4 space-y-2"),
            (StyledTag::OrderedList, "list-decimal list-inside mb-4 space-y-2"),
            (StyledTag::InlineCode, "bg-gray-100 dark:bg-gray-800 px-2 py-1 rounded text-sm"),
            (StyledTag::CodeBlock, "bg-gray-100 dark:bg-gray-800 p-4 rounded-lg overflow-x-auto mb-4"),
            (StyledTag::BlockQuote, "border-l-4 border-portfolio-accent pl-4 italic mb-4"),
            (StyledTag::Link, "text-portfolio-accent hover:underline"),
        ] {
            rules.classes.insert(tag, class.to_string());
        }
        rules
    }

    /// Portfolio defaults with per-tag overrides; an empty class removes the rule.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut rules = StyleRules::portfolio();
        for (name, class) in overrides {
            let tag = StyledTag::from_name(name)
                .ok_or_else(|| ConfigError::UnknownStyleTag(name.clone()))?;
            if class.trim().is_empty() {
                rules.classes.remove(&tag);
            } else {
                rules.classes.insert(tag, class.trim().to_string());
            }
        }
        Ok(rules)
    }

    pub fn class_for(&self, tag: StyledTag) -> Option<&str> {
        self.classes.get(&tag).map(String::as_str)
    }

    fn class_attr(&self, tag: StyledTag) -> String {
        self.class_for(tag)
            .map(|class| format!(" class=\"{}\"", encode_minimal(class)))
            .unwrap_or_default()
    }
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_MATH);
    options
}

pub fn render_markdown_to_html(markdown: &str, rules: &StyleRules) -> String {
    let normalized_markdown = normalize_latex_delimiters(markdown);
    // Inside an image everything becomes alt text, so nothing there is rewritten.
    let mut image_depth = 0usize;
    let parser = Parser::new_ext(&normalized_markdown, markdown_options()).map(|event| match event {
        Event::Start(Tag::Image { .. }) => {
            image_depth += 1;
            event
        }
        Event::End(TagEnd::Image) => {
            image_depth = image_depth.saturating_sub(1);
            event
        }
        _ if image_depth > 0 => event,
        Event::InlineMath(math) => Event::Html(CowStr::Boxed(render_math_html(&math, false).into_boxed_str())),
        Event::DisplayMath(math) => Event::Html(CowStr::Boxed(render_math_html(&math, true).into_boxed_str())),
        other => style_event(other, rules),
    });

    let mut html_out = String::new();
    html::push_html(&mut html_out, parser);
    html_out
}

/// Swaps opening tags that have a style rule for raw HTML carrying the class.
/// Closing tags are untouched; the default writer already emits them.
fn style_event<'a>(event: Event<'a>, rules: &StyleRules) -> Event<'a> {
    let html = match &event {
        Event::Start(tag) => open_tag_html(tag, rules),
        Event::Code(code) => rules.class_for(StyledTag::InlineCode).map(|_| {
            format!(
                "<code{}>{}</code>",
                rules.class_attr(StyledTag::InlineCode),
                encode_minimal(code)
            )
        }),
        _ => None,
    };
    match html {
        Some(html) => Event::InlineHtml(CowStr::Boxed(html.into_boxed_str())),
        None => event,
    }
}

fn open_tag_html(tag: &Tag<'_>, rules: &StyleRules) -> Option<String> {
    let styled = match tag {
        Tag::Heading { level, .. } => match *level as u8 {
            1 => StyledTag::H1,
            2 => StyledTag::H2,
            3 => StyledTag::H3,
            _ => return None,
        },
        Tag::Paragraph => StyledTag::Paragraph,
        Tag::List(None) => StyledTag::UnorderedList,
        Tag::List(Some(_)) => StyledTag::OrderedList,
        Tag::CodeBlock(_) => StyledTag::CodeBlock,
        Tag::BlockQuote(_) => StyledTag::BlockQuote,
        Tag::Link { .. } => StyledTag::Link,
        _ => return None,
    };
    rules.class_for(styled)?;
    let class = rules.class_attr(styled);

    let html = match tag {
        Tag::Heading { level, id, .. } => {
            let id_attr = id
                .as_ref()
                .map(|id| format!(" id=\"{}\"", encode_minimal(id)))
                .unwrap_or_default();
            format!("<h{}{id_attr}{class}>", *level as u8)
        }
        Tag::Paragraph => format!("<p{class}>"),
        Tag::List(Some(1)) => format!("<ol{class}>\n"),
        Tag::List(Some(start)) => format!("<ol start=\"{start}\"{class}>\n"),
        Tag::List(None) => format!("<ul{class}>\n"),
        Tag::CodeBlock(kind) => {
            let lang = match kind {
                CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
                CodeBlockKind::Indented => "",
            };
            if lang.is_empty() {
                format!("<pre{class}><code>")
            } else {
                format!("<pre{class}><code class=\"language-{}\">", encode_minimal(lang))
            }
        }
        Tag::BlockQuote(_) => format!("<blockquote{class}>\n"),
        Tag::Link { dest_url, title, .. } => {
            let title_attr = if title.is_empty() {
                String::new()
            } else {
                format!(" title=\"{}\"", encode_minimal(title))
            };
            format!("<a href=\"{}\"{title_attr}{class}>", encode_minimal(dest_url))
        }
        _ => return None,
    };
    Some(html)
}

fn normalize_latex_delimiters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if let Some((open, close, display_mode)) = delimiter_at(input, i) {
            let content_start = i + open.len();
            if let Some(close_at) = input[content_start..].find(close) {
                let content_end = content_start + close_at;
                let content = &input[content_start..content_end];
                if display_mode || content.contains('\n') {
                    out.push_str("$$");
                    out.push_str(content);
                    out.push_str("$$");
                } else {
                    out.push('$');
                    out.push_str(content);
                    out.push('$');
                }
                i = content_end + close.len();
                continue;
            }
        }

        if let Some(ch) = input[i..].chars().next() {
            out.push(ch);
            i += ch.len_utf8();
        } else {
            break;
        }
    }

    out
}

fn delimiter_at(input: &str, index: usize) -> Option<(&'static str, &'static str, bool)> {
    let tail = &input[index..];
    if tail.starts_with("\\(") {
        Some(("\\(", "\\)", false))
    } else if tail.starts_with("\\[") {
        Some(("\\[", "\\]", true))
    } else {
        None
    }
}

fn render_math_html(source: &str, display_mode: bool) -> String {
    let mut opts = katex::Opts::builder();
    opts.display_mode(display_mode);

    let rendered = match opts.build() {
        Ok(opts) => katex::render_with_opts(source, opts),
        Err(_) => return fallback_math_html(source, display_mode),
    };

    match rendered {
        Ok(html) => html,
        Err(_) => fallback_math_html(source, display_mode),
    }
}

fn fallback_math_html(source: &str, display_mode: bool) -> String {
    let class_name = if display_mode { "math math-display" } else { "math math-inline" };
    format!("<span class=\"{class_name}\">{}</span>", encode_minimal(source))
}
