use super::MarkdownConverter;
use crate::dom::Element;
use crate::filter::normalize_image_url;

/// Image source attributes, most authoritative first
const IMAGE_SOURCE_ATTRS: [&str; 3] = ["data-src", "data-origin-src", "src"];

/// Markdown stops at six heading levels
const MAX_HEADING_LEVEL: u8 = 6;

impl MarkdownConverter<'_> {
    pub(super) fn heading(&mut self, el: &Element, level: u8) -> String {
        let text = self.trimmed_children(el);
        if text.is_empty() {
            return String::new();
        }
        let hashes = "#".repeat(level.min(MAX_HEADING_LEVEL) as usize);
        format!("\n{} {}\n", hashes, text)
    }

    pub(super) fn paragraph(&mut self, el: &Element) -> String {
        let text = self.trimmed_children(el);
        if text.is_empty() {
            return String::new();
        }
        format!("\n{}\n", text)
    }

    pub(super) fn wrap_inline(&mut self, el: &Element, delimiter: &str) -> String {
        let content = self.trimmed_children(el);
        if content.is_empty() {
            return String::new();
        }
        format!("{delimiter}{content}{delimiter}")
    }

    pub(super) fn inline_code(&mut self, el: &Element) -> String {
        let code = self.trimmed_children(el);
        if code.is_empty() {
            return String::new();
        }
        format!("`{}`", code)
    }

    pub(super) fn link(&mut self, el: &Element) -> String {
        let text = self.trimmed_children(el);
        let href = el.attr("href").unwrap_or("");
        if text.is_empty() && href.is_empty() {
            return String::new();
        }
        let label = if text.is_empty() { href } else { text.as_str() };
        format!("[{}]({})", label, href)
    }

    /// Every occurrence is rendered; the URL set only deduplicates downloads.
    pub(super) fn image(&mut self, el: &Element) -> String {
        let Some(url) = IMAGE_SOURCE_ATTRS
            .iter()
            .find_map(|name| el.non_empty_attr(name))
            .and_then(normalize_image_url)
        else {
            return String::new();
        };

        let alt = el
            .attr("alt")
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .unwrap_or("image");

        let rendered = format!("\n![{}]({})\n", alt, url);
        self.images.insert(url);
        rendered
    }
}
