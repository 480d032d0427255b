use crate::dom::{Node, from_html_fragment};
use crate::markdown::to_markdown;

fn cell(tag: &str, text: &str) -> Node {
    Node::element(tag).with_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_rows_are_padded() {
        let table = Node::element("table")
            .child(
                Node::element("tr")
                    .child(cell("td", "A"))
                    .child(cell("td", "B")),
            )
            .child(Node::element("tr").child(cell("td", "C")));
        assert_eq!(to_markdown(&table), "| A | B |\n| --- | --- |\n| C |  |");
    }

    #[test]
    fn test_header_section_and_inline_alignment() {
        let node = from_html_fragment(
            r#"<table><thead><tr><th>Name</th><th style="text-align: center">Qty</th><th style="text-align:right">Price</th></tr></thead><tbody><tr><td>Apple</td><td>3</td><td>1.00</td></tr></tbody></table>"#,
        );
        assert_eq!(
            to_markdown(&node),
            "| Name | Qty | Price |\n| --- | :---: | ---: |\n| Apple | 3 | 1.00 |"
        );
    }

    #[test]
    fn test_computed_alignment_is_used_without_inline_style() {
        let table = Node::element("table")
            .child(
                Node::element("thead").child(
                    Node::element("tr")
                        .child(cell("th", "L"))
                        .child(cell("th", "R").attr("data-computed-align", "right")),
                ),
            )
            .child(
                Node::element("tbody").child(
                    Node::element("tr")
                        .child(cell("td", "1"))
                        .child(cell("td", "2")),
                ),
            );
        assert_eq!(to_markdown(&table), "| L | R |\n| --- | ---: |\n| 1 | 2 |");
    }

    #[test]
    fn test_header_rows_are_not_repeated_in_body() {
        let table = Node::element("table")
            .child(Node::element("thead").child(Node::element("tr").child(cell("th", "H"))))
            .child(Node::element("tr").child(cell("td", "v")));
        assert_eq!(to_markdown(&table), "| H |\n| --- |\n| v |");
    }

    #[test]
    fn test_separator_covers_body_columns() {
        let table = Node::element("table")
            .child(Node::element("thead").child(Node::element("tr").child(cell("th", "H"))))
            .child(
                Node::element("tbody").child(
                    Node::element("tr")
                        .child(cell("td", "a"))
                        .child(cell("td", "b")),
                ),
            );
        assert_eq!(to_markdown(&table), "| H |  |\n| --- | --- |\n| a | b |");
    }

    #[test]
    fn test_table_without_header_uses_first_row() {
        let node = from_html_fragment("<table><tr><td>A</td></tr><tr><td><strong>B</strong></td></tr></table>");
        assert_eq!(to_markdown(&node), "| A |\n| --- |\n| **B** |");
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(to_markdown(&Node::element("table")), "");
    }

    #[test]
    fn test_rows_without_cells_render_nothing() {
        let node = from_html_fragment("<table><tbody><tr></tr></tbody></table>");
        assert_eq!(to_markdown(&node), "");
    }

    #[test]
    fn test_blank_cells_render_nothing() {
        let table = Node::element("table")
            .child(Node::element("tr").child(cell("td", "  ")))
            .child(Node::element("tr").child(Node::element("td")));
        assert_eq!(to_markdown(&table), "");
    }
}
