//! Owned, read-only DOM tree used as converter input.
//!
//! Snapshots of the live editor are parsed with `scraper` and copied into this
//! structure once. The converter only ever borrows it, so the same tree can be
//! built by hand in tests.

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Node as ScraperNode};

/// A DOM node: text or element
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Element(Element),
}

/// An element with a lowercase tag name, ordered attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create an empty element node
    pub fn element(tag: &str) -> Self {
        Node::Element(Element {
            tag: tag.to_lowercase(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        })
    }

    /// Create a text node
    pub fn text(content: &str) -> Self {
        Node::Text(content.to_string())
    }

    /// Builder: set an attribute (no-op on text nodes)
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if let Node::Element(el) = &mut self {
            el.attrs.insert(name.to_lowercase(), value.to_string());
        }
        self
    }

    /// Builder: append a child (no-op on text nodes)
    pub fn child(mut self, child: Node) -> Self {
        if let Node::Element(el) = &mut self {
            el.children.push(child);
        }
        self
    }

    /// Builder: append a text child
    pub fn with_text(self, content: &str) -> Self {
        self.child(Node::text(content))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// True if this is an element with the given tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.as_element().is_some_and(|el| el.tag == tag)
    }

    /// Concatenated raw text of this node and all descendants
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(el) => el.text_content(),
        }
    }
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Attribute value, treating an empty string as absent
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|value| !value.is_empty())
    }

    pub fn class_tokens(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_tokens().any(|token| token == class)
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First descendant element matching `pred`, in document order.
    /// The element itself is never considered.
    pub fn find<F>(&self, pred: F) -> Option<&Element>
    where
        F: Fn(&Element) -> bool + Copy,
    {
        for child in self.element_children() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find(pred) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_tag(&self, tag: &str) -> Option<&Element> {
        self.find(|el| el.tag == tag)
    }

    /// All descendant elements matching `pred`, in document order
    pub fn find_all<F>(&self, pred: F) -> Vec<&Element>
    where
        F: Fn(&Element) -> bool + Copy,
    {
        let mut found = Vec::new();
        self.collect_matching(pred, &mut found);
        found
    }

    fn collect_matching<'a, F>(&'a self, pred: F, out: &mut Vec<&'a Element>)
    where
        F: Fn(&Element) -> bool + Copy,
    {
        for child in self.element_children() {
            if pred(child) {
                out.push(child);
            }
            child.collect_matching(pred, out);
        }
    }

    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) => text.push_str(t),
                Node::Element(el) => text.push_str(&el.text_content()),
            }
        }
        text
    }
}

/// Elements the editor only renders for print or as placeholders
pub fn is_print_hidden(element: &scraper::node::Element) -> bool {
    element.attr("data-print-hidden").is_some()
        || element
            .classes()
            .any(|class| class == "print-hidden" || class == "image-placeholder-text")
}

/// Copy a parsed element into an owned `Node`, skipping every descendant
/// for which `strip` returns true.
pub fn copy_element<F>(element: ElementRef, strip: &F) -> Node
where
    F: Fn(&scraper::node::Element) -> bool,
{
    let value = element.value();
    let mut node = Node::element(value.name());
    for (name, attr_value) in value.attrs() {
        node = node.attr(name, attr_value);
    }

    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => {
                node = node.child(Node::text(&text.text));
            }
            ScraperNode::Element(child_value) => {
                if strip(child_value) {
                    continue;
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    node = node.child(copy_element(child_element, strip));
                }
            }
            _ => {}
        }
    }

    node
}

/// Parse an HTML fragment into an owned tree rooted at the fragment's
/// `<html>` wrapper element.
pub fn from_html_fragment(html: &str) -> Node {
    let fragment = Html::parse_fragment(html);
    copy_element(fragment.root_element(), &|_: &scraper::node::Element| false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_skips_self_and_walks_in_order() {
        let tree = Node::element("div")
            .attr("class", "outer")
            .child(Node::element("span").child(Node::element("code").with_text("a")))
            .child(Node::element("code").with_text("b"));

        let root = tree.as_element().unwrap();
        let code = root.find_tag("code").unwrap();
        assert_eq!(code.text_content(), "a");
        assert!(root.find(|el| el.has_class("outer")).is_none());
        assert_eq!(root.find_all(|el| el.tag == "code").len(), 2);
    }

    #[test]
    fn test_from_html_fragment_keeps_text_and_attrs() {
        let tree = from_html_fragment(r#"<p class="x y">Hello <b>World</b></p>"#);
        let p = tree.as_element().unwrap().find_tag("p").unwrap();
        assert!(p.has_class("y"));
        assert_eq!(p.text_content(), "Hello World");
    }

    #[test]
    fn test_copy_element_strips_print_hidden() {
        let html = Html::parse_fragment(
            r#"<div id="b">keep<span data-print-hidden="true">drop</span><i class="image-placeholder-text">x</i></div>"#,
        );
        let selector = scraper::Selector::parse("#b").unwrap();
        let block = html.select(&selector).next().unwrap();
        let copy = copy_element(block, &is_print_hidden);
        assert_eq!(copy.text_content(), "keep");
    }
}
