use once_cell::sync::Lazy;
use regex::Regex;

use super::MarkdownConverter;
use crate::dom::Element;

static ORDINAL_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").expect("Invalid regex"));
static CHECKBOX_RESIDUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[.*?\]\s*").expect("Invalid regex"));
static BALLOT_RESIDUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[☐☑☒]\s*").expect("Invalid regex"));

impl MarkdownConverter<'_> {
    /// Render the direct `li` children of a `ul`/`ol`.
    ///
    /// Empty items are dropped before numbering, so ordinals stay contiguous.
    pub(super) fn list(&mut self, el: &Element, ordered: bool) -> String {
        let contents: Vec<String> = el
            .element_children()
            .filter(|child| child.tag == "li")
            .map(|item| self.trimmed_children(item))
            .filter(|content| !content.is_empty())
            .collect();

        if contents.is_empty() {
            return String::new();
        }

        let items: Vec<String> = contents
            .iter()
            .enumerate()
            .map(|(index, content)| {
                let prefix = if ordered {
                    format!("{}.", index + 1)
                } else {
                    "-".to_string()
                };
                render_item(&prefix, content)
            })
            .collect();

        format!("\n{}\n", items.join("\n"))
    }

    /// A bullet block: a nested `ul`, else a bare `li`, else the block's own text
    pub(super) fn bullet_block(&mut self, el: &Element) -> String {
        if let Some(ul) = el.find_tag("ul") {
            return self.list(ul, false);
        }
        self.single_item(el, "-")
    }

    pub(super) fn ordered_block(&mut self, el: &Element) -> String {
        if let Some(ol) = el.find_tag("ol") {
            return self.list(ol, true);
        }
        self.single_item(el, "1.")
    }

    fn single_item(&mut self, el: &Element, prefix: &str) -> String {
        let source = el.find_tag("li").unwrap_or(el);
        let text = self.trimmed_children(source);
        if text.is_empty() {
            return String::new();
        }
        format!("{} {}", prefix, text)
    }

    pub(super) fn todo_block(&mut self, el: &Element) -> String {
        let checked = el.find(is_checkbox).is_some_and(is_checked);

        let text = self.trimmed_children(el);
        let text = CHECKBOX_RESIDUE.replace(&text, "");
        let text = BALLOT_RESIDUE.replace(&text, "");
        if text.is_empty() {
            return String::new();
        }

        format!("- [{}] {}", if checked { 'x' } else { ' ' }, text)
    }
}

/// Prefix the first line; re-indent nested list lines under the item
fn render_item(prefix: &str, content: &str) -> String {
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{} {}", prefix, line)
            } else if is_list_line(line.trim_start()) {
                format!("  {}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_list_line(line: &str) -> bool {
    line.starts_with('-') || ORDINAL_LINE.is_match(line)
}

fn is_checkbox(el: &Element) -> bool {
    el.tag == "input" && el.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
}

/// Snapshots reflect the live `checked` property into the attribute
fn is_checked(el: &Element) -> bool {
    el.attr("checked").is_some() || el.attr("aria-checked") == Some("true")
}
