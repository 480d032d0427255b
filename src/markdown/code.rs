use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::Element;

static CODE_CLASS_LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:language|lang|code)-([\w+#.-]+)$").expect("Invalid regex"));
static PRE_CLASS_LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:language|lang)-([\w+#.-]+)$").expect("Invalid regex"));

const LANGUAGE_ATTRS: [&str; 2] = ["data-language", "data-lang"];

/// Render a fenced code block from raw text content.
///
/// Inline formatting rules are never applied to code.
pub(super) fn code_block(node: &Element) -> String {
    let code_el = node.find_tag("code");
    let pre_el = if node.tag == "pre" {
        Some(node)
    } else {
        node.find_tag("pre")
    };

    let language = detect_language(node, pre_el, code_el);

    let raw = match (code_el, pre_el) {
        (Some(code), _) => code.text_content(),
        (None, Some(pre)) => pre.text_content(),
        (None, None) => node.text_content(),
    };
    if raw.trim().is_empty() {
        return String::new();
    }

    let cleaned = raw.replace('\u{200B}', "");
    let cleaned = cleaned.trim_matches('\n');

    format!("\n```{}\n{}\n```\n", language, cleaned)
}

/// Language from class tokens on the code element, then the pre wrapper,
/// then a `data-language`/`data-lang` attribute on any of them.
fn detect_language(node: &Element, pre_el: Option<&Element>, code_el: Option<&Element>) -> String {
    if let Some(lang) = code_el.and_then(|code| class_language(code, &CODE_CLASS_LANGUAGE)) {
        return lang;
    }
    if let Some(lang) = pre_el.and_then(|pre| class_language(pre, &PRE_CLASS_LANGUAGE)) {
        return lang;
    }

    [Some(node), pre_el, code_el]
        .into_iter()
        .flatten()
        .flat_map(|el| LANGUAGE_ATTRS.iter().filter_map(move |name| el.non_empty_attr(name)))
        .next()
        .map(str::to_string)
        .unwrap_or_default()
}

fn class_language(el: &Element, pattern: &Regex) -> Option<String> {
    el.class_tokens()
        .find_map(|token| pattern.captures(token))
        .map(|caps| caps[1].to_string())
}
