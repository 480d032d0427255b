use crate::dom::Node;
use crate::markdown::{convert, to_markdown};
use crate::results::ImageRefs;

fn block(block_type: &str) -> Node {
    Node::element("div")
        .attr("data-block-id", "blk")
        .attr("data-block-type", block_type)
}

#[cfg(test)]
mod list_block_tests {
    use super::*;

    #[test]
    fn test_bullet_block_from_own_text() {
        let node = block("bullet").child(Node::element("div").with_text("Item"));
        assert_eq!(to_markdown(&node), "- Item");
    }

    #[test]
    fn test_bullet_block_prefers_nested_list() {
        let node = block("bullet").child(
            Node::element("ul")
                .child(Node::element("li").with_text("a"))
                .child(Node::element("li").with_text("b")),
        );
        assert_eq!(to_markdown(&node), "- a\n- b");
    }

    #[test]
    fn test_bullet_block_with_bare_item() {
        let node = block("bullet").child(
            Node::element("div")
                .child(Node::element("li").with_text("x"))
                .with_text("ignored sibling"),
        );
        assert_eq!(to_markdown(&node), "- x");
    }

    #[test]
    fn test_ordered_block_is_a_single_item() {
        let node = block("ordered").child(Node::element("span").with_text("Step"));
        assert_eq!(to_markdown(&node), "1. Step");
    }

    #[test]
    fn test_empty_list_blocks_render_nothing() {
        assert_eq!(to_markdown(&block("bullet")), "");
        assert_eq!(to_markdown(&block("ordered").with_text(" ")), "");
    }
}

#[cfg(test)]
mod todo_block_tests {
    use super::*;

    #[test]
    fn test_checked_todo() {
        let node = block("todo")
            .child(
                Node::element("input")
                    .attr("type", "checkbox")
                    .attr("checked", ""),
            )
            .child(Node::element("span").with_text("Done"));
        assert_eq!(to_markdown(&node), "- [x] Done");
    }

    #[test]
    fn test_unchecked_todo_strips_ballot_residue() {
        let node = block("todo")
            .child(Node::element("input").attr("type", "checkbox"))
            .child(Node::element("span").with_text("☐ Pending"));
        assert_eq!(to_markdown(&node), "- [ ] Pending");

        let node = block("todo").child(Node::element("span").with_text("[ ] Ship it"));
        assert_eq!(to_markdown(&node), "- [ ] Ship it");
    }
}

#[cfg(test)]
mod callout_tests {
    use super::*;

    #[test]
    fn test_callout_uses_its_emoji_once() {
        let node = block("callout")
            .child(
                Node::element("span")
                    .attr("class", "callout-emoji")
                    .with_text("🔥"),
            )
            .child(Node::element("div").with_text("Hot take"));
        assert_eq!(to_markdown(&node), "> 🔥 Hot take");
    }

    #[test]
    fn test_callout_default_emoji_and_multiline() {
        let node = block("callout")
            .child(Node::element("div").with_text("a"))
            .child(Node::element("div").with_text("b"));
        assert_eq!(to_markdown(&node), "> 💡 a  \n> b");
    }

    #[test]
    fn test_empty_callout() {
        let node = block("callout").child(
            Node::element("span")
                .attr("class", "callout-emoji")
                .with_text("🔥"),
        );
        assert_eq!(to_markdown(&node), "");
    }
}

#[cfg(test)]
mod misc_block_tests {
    use super::*;

    #[test]
    fn test_image_block_records_url() {
        let node = block("image").child(
            Node::element("div").child(
                Node::element("img")
                    .attr("src", "https://x/y.png")
                    .attr("alt", ""),
            ),
        );
        let mut images = ImageRefs::default();
        assert_eq!(convert(&node, &mut images), "![image](https://x/y.png)");
        assert!(images.contains("https://x/y.png"));
    }

    #[test]
    fn test_divider_block() {
        assert_eq!(to_markdown(&block("divider")), "---");
    }

    #[test]
    fn test_block_marker_wins_over_tag() {
        let node = Node::element("p")
            .attr("data-block-type", "heading2")
            .with_text("Title");
        assert_eq!(to_markdown(&node), "## Title");

        let node = block("heading9").with_text("Deep");
        assert_eq!(to_markdown(&node), "###### Deep");
    }

    #[test]
    fn test_text_and_unknown_blocks_pass_children_through() {
        let node = block("text").child(Node::element("span").with_text("hello"));
        assert_eq!(to_markdown(&node), "hello");

        let node = block("grid").child(Node::element("span").with_text("cell"));
        assert_eq!(to_markdown(&node), "cell");
    }

    #[test]
    fn test_quote_block() {
        let node = block("quote")
            .child(Node::element("div").with_text("first"))
            .child(Node::element("div").with_text("second"));
        assert_eq!(to_markdown(&node), "> first  \n> second");
    }
}
