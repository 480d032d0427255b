//! Editor DOM to Markdown conversion.
//!
//! Elements are classified first by the editor's `data-block-type` marker and
//! then by tag name. Anything unrecognized falls through to its children so
//! that no text is silently dropped.

mod blocks;
mod code;
mod inline;
mod list;
mod table;

#[cfg(test)]
mod tests;

use crate::dom::{Element, Node};
use crate::results::ImageRefs;

/// Attribute carrying the editor's block type
pub const BLOCK_TYPE_ATTR: &str = "data-block-type";

/// Wrapper tags that the editor stacks to express consecutive lines
const LINE_WRAPPER_TAGS: [&str; 6] = ["div", "p", "section", "article", "figure", "figcaption"];

/// Notice injected by the editor into attachment placeholders
const PRINT_NOTICE: &str = "附件不支持打印";

/// Constructs recognized by tag name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    Heading(u8),
    Paragraph,
    LineBreak,
    Emphasis(&'static str),
    InlineCode,
    Link,
    Image,
    List { ordered: bool },
    CodeBlock,
    Blockquote,
    Table,
    TableCell,
    Rule,
    /// Containers and table plumbing: children only
    Transparent,
}

impl Construct {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let construct = match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "h7" | "h8" | "h9" => {
                Construct::Heading(tag[1..].parse().ok()?)
            }
            "p" => Construct::Paragraph,
            "br" => Construct::LineBreak,
            "strong" | "b" => Construct::Emphasis("**"),
            "em" | "i" => Construct::Emphasis("*"),
            "del" | "s" => Construct::Emphasis("~~"),
            "mark" => Construct::Emphasis("=="),
            "sub" => Construct::Emphasis("~"),
            "sup" => Construct::Emphasis("^"),
            "code" => Construct::InlineCode,
            "a" => Construct::Link,
            "img" => Construct::Image,
            "ul" => Construct::List { ordered: false },
            "ol" => Construct::List { ordered: true },
            "table" => Construct::Table,
            "th" | "td" => Construct::TableCell,
            "pre" => Construct::CodeBlock,
            "blockquote" => Construct::Blockquote,
            "hr" => Construct::Rule,
            "li" | "thead" | "tbody" | "tr" | "div" | "span" | "section" | "article" => {
                Construct::Transparent
            }
            _ => return None,
        };
        Some(construct)
    }
}

/// Editor block types carried in `data-block-type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading(u8),
    Text,
    Paragraph,
    Bullet,
    Ordered,
    Code,
    Quote,
    Table,
    Todo,
    Callout,
    Divider,
    Image,
}

impl BlockKind {
    pub fn from_block_type(block_type: &str) -> Option<Self> {
        if let Some(level) = block_type.strip_prefix("heading") {
            return match level.parse::<u8>() {
                Ok(level @ 1..=9) => Some(BlockKind::Heading(level)),
                _ => None,
            };
        }

        let kind = match block_type {
            "text" => BlockKind::Text,
            "paragraph" => BlockKind::Paragraph,
            "bullet" => BlockKind::Bullet,
            "ordered" => BlockKind::Ordered,
            "code" => BlockKind::Code,
            "quote" => BlockKind::Quote,
            "table" => BlockKind::Table,
            "todo" => BlockKind::Todo,
            "callout" => BlockKind::Callout,
            "divider" => BlockKind::Divider,
            "image" => BlockKind::Image,
            _ => return None,
        };
        Some(kind)
    }
}

/// Convert a subtree to trimmed Markdown, recording image URLs into `images`
pub fn convert(node: &Node, images: &mut ImageRefs) -> String {
    MarkdownConverter::new(images).convert(node)
}

/// Convert a subtree to trimmed Markdown, discarding image URLs
pub fn to_markdown(node: &Node) -> String {
    let mut images = ImageRefs::default();
    convert(node, &mut images)
}

/// Recursive converter; the only state is the image URL sink
pub struct MarkdownConverter<'a> {
    images: &'a mut ImageRefs,
}

impl<'a> MarkdownConverter<'a> {
    pub fn new(images: &'a mut ImageRefs) -> Self {
        Self { images }
    }

    pub fn convert(&mut self, node: &Node) -> String {
        self.convert_node(node).trim().to_string()
    }

    fn convert_node(&mut self, node: &Node) -> String {
        match node {
            Node::Text(text) => escape_text(text),
            Node::Element(el) => self.convert_element(el),
        }
    }

    fn convert_element(&mut self, el: &Element) -> String {
        if let Some(block_type) = el.attr(BLOCK_TYPE_ATTR) {
            return match BlockKind::from_block_type(block_type) {
                Some(kind) => self.convert_block(el, kind),
                None => self.convert_children(el),
            };
        }

        match Construct::from_tag(&el.tag) {
            Some(construct) => self.convert_construct(el, construct),
            None => self.convert_children(el),
        }
    }

    fn convert_construct(&mut self, el: &Element, construct: Construct) -> String {
        match construct {
            Construct::Heading(level) => self.heading(el, level),
            Construct::Paragraph => self.paragraph(el),
            Construct::LineBreak => "  \n".to_string(),
            Construct::Emphasis(delimiter) => self.wrap_inline(el, delimiter),
            Construct::InlineCode => self.inline_code(el),
            Construct::Link => self.link(el),
            Construct::Image => self.image(el),
            Construct::List { ordered } => self.list(el, ordered),
            Construct::CodeBlock => code::code_block(el),
            Construct::Blockquote => self.blockquote(el),
            Construct::Table => self.table(el),
            Construct::TableCell => self.convert_children(el).trim().to_string(),
            Construct::Rule => "\n---\n".to_string(),
            Construct::Transparent => self.convert_children(el),
        }
    }

    fn convert_block(&mut self, el: &Element, kind: BlockKind) -> String {
        match kind {
            BlockKind::Heading(level) => self.heading(el, level),
            BlockKind::Text => self.convert_children(el),
            BlockKind::Paragraph => self.paragraph(el),
            BlockKind::Bullet => self.bullet_block(el),
            BlockKind::Ordered => self.ordered_block(el),
            BlockKind::Code => code::code_block(el),
            BlockKind::Quote => self.blockquote(el),
            BlockKind::Table => self.table(el),
            BlockKind::Todo => self.todo_block(el),
            BlockKind::Callout => self.callout(el),
            BlockKind::Divider => "\n---\n".to_string(),
            BlockKind::Image => self.image_block(el),
        }
    }

    /// Convert and concatenate children.
    ///
    /// Two adjacent line-wrapper elements get a hard break between them when
    /// the first one does not already end its own line.
    fn convert_children(&mut self, el: &Element) -> String {
        let mut out = String::new();
        for (index, child) in el.children.iter().enumerate() {
            let mut result = self.convert_node(child);

            if is_line_wrapper(child) && !result.trim().is_empty() && !result.ends_with('\n') {
                if el.children.get(index + 1).is_some_and(is_line_wrapper) {
                    result.push_str("  \n");
                }
            }

            out.push_str(&result);
        }
        out
    }

    /// Children converted and trimmed; the common prologue of most constructs
    fn trimmed_children(&mut self, el: &Element) -> String {
        self.convert_children(el).trim().to_string()
    }
}

fn is_line_wrapper(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|el| LINE_WRAPPER_TAGS.contains(&el.tag.as_str()))
}

/// Clean a text node. Markdown punctuation is deliberately left alone.
pub fn escape_text(text: &str) -> String {
    text.replace(['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'], "")
        .replace(PRINT_NOTICE, "")
        .replace('\u{00A0}', " ")
}
