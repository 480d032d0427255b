use super::MarkdownConverter;
use crate::dom::{Element, Node};

const DEFAULT_CALLOUT_EMOJI: &str = "💡";
const CALLOUT_EMOJI_CLASS: &str = "callout-emoji";

impl MarkdownConverter<'_> {
    pub(super) fn blockquote(&mut self, el: &Element) -> String {
        let content = self.trimmed_children(el);
        if content.is_empty() {
            return String::new();
        }

        let quoted = content
            .split('\n')
            .map(|line| {
                if line.trim().is_empty() {
                    ">".to_string()
                } else {
                    format!("> {}", line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!("\n{}\n", quoted)
    }

    /// Callouts render as a quote led by their emoji marker
    pub(super) fn callout(&mut self, el: &Element) -> String {
        let emoji = el
            .find(|child| child.has_class(CALLOUT_EMOJI_CLASS))
            .map(|marker| marker.text_content().trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| DEFAULT_CALLOUT_EMOJI.to_string());

        let body = without_emoji_marker(el);
        let content = self.trimmed_children(&body);
        if content.is_empty() {
            return String::new();
        }

        format!("\n> {} {}\n", emoji, content.replace('\n', "\n> "))
    }

    pub(super) fn image_block(&mut self, el: &Element) -> String {
        match el.find_tag("img") {
            Some(img) => self.image(img),
            None => self.convert_children(el),
        }
    }
}

/// Copy of the callout without its emoji element, so the marker is not repeated
fn without_emoji_marker(el: &Element) -> Element {
    Element {
        tag: el.tag.clone(),
        attrs: el.attrs.clone(),
        children: el
            .children
            .iter()
            .filter_map(|child| match child {
                Node::Element(inner) if inner.has_class(CALLOUT_EMOJI_CLASS) => None,
                Node::Element(inner) => Some(Node::Element(without_emoji_marker(inner))),
                Node::Text(_) => Some(child.clone()),
            })
            .collect(),
    }
}
