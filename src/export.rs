use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::results::{BlockStore, ExportBundle, ImageRefs};
use crate::utils::{format_timestamp, sanitize_filename};

/// Prefix of generated titles when nothing better is found
pub const DEFAULT_TITLE_PREFIX: &str = "FeishuDoc";

/// Title-bearing elements of the document chrome, in priority order
pub const TITLE_SELECTORS: &[&str] = &[
    r#"[data-lark-record-format="true"] [class*="title"]"#,
    r#"[data-block-type="title"]"#,
    r#".doc-title-wrapper [contenteditable="true"]"#,
    ".doc-title-wrapper",
    ".wiki-title",
    ".lark-record-title",
    ".doc-title",
    ".document-title",
    r#"[class*="doc-title"]"#,
    r#"[data-block-type="heading1"]:first-of-type"#,
    "h1.title",
    "h1",
];

/// Text shown by the editor for documents that have no title yet
const PLACEHOLDER_TITLES: &[&str] = &["无标题", "Untitled"];

/// Longest title taken from the first line of content
const MAX_CONTENT_TITLE_CHARS: usize = 50;

static PAGE_TITLE_SUFFIXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["飞书文档", "飞书", "Feishu Docs?", "Feishu", "Lark", "知识库", "Wiki"]
        .iter()
        .map(|suffix| {
            Regex::new(&format!(r"(?i)\s*[-–—|]\s*{}$", suffix)).expect("Invalid regex")
        })
        .collect()
});

static HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s*").expect("Invalid regex"));
static MARKDOWN_SYMBOLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#*`~\[\]!]").expect("Invalid regex"));
static LIST_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*+]\s|\d+\.\s)").expect("Invalid regex"));
/// `![alt](url)` with an absolute http(s) target; captures alt text and URL
pub(crate) static IMAGE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\((https?://[^)]+)\)").expect("Invalid regex"));
static TRAILING_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[ \t]+$").expect("Invalid regex"));
static BLANK_LINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid regex"));
static BULLET_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*+] ").expect("Invalid regex"));
static ORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\. ").expect("Invalid regex"));
static TODO_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^- \[[ x]\] ").expect("Invalid regex"));
static QUOTE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^> ").expect("Invalid regex"));

/// Page-level metadata available for title lookup
#[derive(Debug, Clone, Default)]
pub struct TitleSources {
    /// Serialized page HTML, searched with [`TITLE_SELECTORS`]
    pub page_html: Option<String>,

    /// The page's `<title>`
    pub page_title: Option<String>,
}

/// Pick the document title and sanitize it into a file name.
///
/// Sources are tried in order: title elements in the page, the page title
/// with platform suffixes stripped, the first meaningful line of content,
/// and finally `<prefix>_YYYYMMDD_HHMMSS`.
pub fn resolve_title(
    sources: &TitleSources,
    blocks: &BlockStore,
    prefix: &str,
    now: &DateTime<Local>,
) -> String {
    let candidate = sources
        .page_html
        .as_deref()
        .and_then(title_from_html)
        .or_else(|| sources.page_title.as_deref().and_then(title_from_page_title))
        .or_else(|| title_from_blocks(blocks));

    let title = candidate
        .map(|title| sanitize_filename(&title))
        .unwrap_or_default();

    if title.is_empty() {
        let fallback = format!("{}_{}", prefix, format_timestamp(now));
        ::log::debug!("No title found, using {}", fallback);
        fallback
    } else {
        ::log::debug!("Resolved title {}", title);
        title
    }
}

/// First non-placeholder text among the title selectors
pub fn title_from_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for raw in TITLE_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            ::log::warn!("Skipping unparsable title selector {}", raw);
            continue;
        };
        let Some(element) = document.select(&selector).next() else {
            continue;
        };
        let text = element.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() || PLACEHOLDER_TITLES.contains(&text) {
            continue;
        }
        ::log::trace!("Title from selector {}: {}", raw, text);
        return Some(text.to_string());
    }
    None
}

/// The page title without the platform suffix; `None` if nothing was stripped
pub fn title_from_page_title(page_title: &str) -> Option<String> {
    let mut title = page_title.to_string();
    for suffix in PAGE_TITLE_SUFFIXES.iter() {
        title = suffix.replace(&title, "").into_owned();
    }
    let title = title.trim();

    if title.is_empty() || title == page_title {
        None
    } else {
        Some(title.to_string())
    }
}

/// First line of content that reads like a title
pub fn title_from_blocks(blocks: &BlockStore) -> Option<String> {
    for markdown in blocks.values() {
        let Some(first_line) = markdown.lines().find(|line| !line.trim().is_empty()) else {
            continue;
        };
        let line = HEADING_MARKER.replace(first_line, "");
        let line = MARKDOWN_SYMBOLS.replace_all(&line, "");
        let line = line.trim();

        if line.chars().count() >= 2 && !LIST_LIKE.is_match(line) {
            return Some(line.chars().take(MAX_CONTENT_TITLE_CHARS).collect());
        }
    }
    None
}

/// Whole-document normalization of joined block Markdown.
///
/// Trailing whitespace is removed except for two-space hard breaks, blank line
/// runs collapse to one, and blank lines between consecutive items of the
/// same list-like construct are removed. The result ends in one newline.
pub fn cleanup_markdown(content: &str) -> String {
    let trimmed = TRAILING_WHITESPACE.replace_all(content, |caps: &regex::Captures| {
        if &caps[0] == "  " {
            "  ".to_string()
        } else {
            String::new()
        }
    });
    let collapsed = BLANK_LINE_RUN.replace_all(&trimmed, "\n\n");

    let mut lines: Vec<&str> = collapsed.split('\n').collect();
    while merge_list_items(&mut lines) {}

    format!("{}\n", lines.join("\n").trim())
}

/// Remove one pass of blank lines separating items of the same construct.
/// Returns whether anything changed.
fn merge_list_items(lines: &mut Vec<&str>) -> bool {
    let mut merged = Vec::with_capacity(lines.len());
    let mut changed = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        merged.push(line);
        if i + 2 < lines.len() && lines[i + 1].is_empty() && same_construct(line, lines[i + 2]) {
            changed = true;
            i += 2;
            continue;
        }
        i += 1;
    }

    *lines = merged;
    changed
}

/// Whether `next` continues the list-like construct `line` belongs to
fn same_construct(line: &str, next: &str) -> bool {
    let has_content = |re: &Regex| {
        re.find(line)
            .map(|m| !line[m.end()..].is_empty())
            .unwrap_or(false)
    };

    [&*TODO_ITEM, &*BULLET_ITEM, &*ORDERED_ITEM, &*QUOTE_LINE]
        .into_iter()
        .any(|re| has_content(re) && re.is_match(next))
}

/// Absolute image URLs referenced by `markdown`, in order of first appearance
pub fn extract_image_urls(markdown: &str) -> ImageRefs {
    IMAGE_LINK
        .captures_iter(markdown)
        .map(|caps| caps[2].to_string())
        .collect()
}

/// Join the captured blocks into the exported document.
///
/// Returns `None` when nothing was captured.
pub fn assemble(
    blocks: &BlockStore,
    sources: &TitleSources,
    title_prefix: &str,
    now: &DateTime<Local>,
) -> Option<ExportBundle> {
    if blocks.is_empty() {
        return None;
    }

    let title = resolve_title(sources, blocks, title_prefix, now);
    let raw = blocks.values().collect::<Vec<_>>().join("\n\n");
    let markdown = cleanup_markdown(&raw);
    let image_urls = extract_image_urls(&markdown);

    ::log::info!(
        "Assembled \"{}\": {} blocks, {} images",
        title,
        blocks.len(),
        image_urls.len()
    );
    Some(ExportBundle::new(markdown, image_urls, title))
}
