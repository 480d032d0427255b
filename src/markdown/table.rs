use once_cell::sync::Lazy;
use regex::Regex;

use super::MarkdownConverter;
use crate::dom::Element;

static TEXT_ALIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)text-align\s*:\s*(left|center|right)").expect("Invalid regex")
});

/// Alignment stamped by the page snapshot from the computed style
pub const COMPUTED_ALIGN_ATTR: &str = "data-computed-align";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "left" => Some(Alignment::Left),
            _ => None,
        }
    }

    /// Inline style wins over the computed value; anything else is left
    fn of_cell(cell: &Element) -> Self {
        cell.attr("style")
            .and_then(|style| TEXT_ALIGN.captures(style))
            .and_then(|caps| Alignment::from_keyword(&caps[1]))
            .or_else(|| cell.attr(COMPUTED_ALIGN_ATTR).and_then(Alignment::from_keyword))
            .unwrap_or(Alignment::Left)
    }

    fn marker(self) -> &'static str {
        match self {
            Alignment::Left => "---",
            Alignment::Center => ":---:",
            Alignment::Right => "---:",
        }
    }
}

impl MarkdownConverter<'_> {
    pub(super) fn table(&mut self, el: &Element) -> String {
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut alignments: Vec<Alignment> = Vec::new();

        if let Some(header_row) = el.find_tag("thead").and_then(|thead| thead.find_tag("tr")) {
            let cells = row_cells(header_row);
            alignments = cells.iter().map(|cell| Alignment::of_cell(cell)).collect();
            rows.push(cells.into_iter().map(|cell| self.trimmed_children(cell)).collect());
        }

        for row in body_rows(el) {
            let cells = row_cells(row)
                .into_iter()
                .map(|cell| self.trimmed_children(cell))
                .collect();
            rows.push(cells);
        }

        let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        if column_count == 0 || rows.iter().flatten().all(String::is_empty) {
            return String::new();
        }

        for row in &mut rows {
            row.resize(column_count, String::new());
        }
        alignments.resize(column_count, Alignment::Left);

        let mut markdown = String::from("\n");
        markdown.push_str(&format_row(&rows[0]));

        let separator: Vec<String> = alignments
            .iter()
            .map(|align| align.marker().to_string())
            .collect();
        markdown.push_str(&format_row(&separator));

        for row in &rows[1..] {
            markdown.push_str(&format_row(row));
        }

        markdown.push('\n');
        markdown
    }
}

fn format_row(cells: &[String]) -> String {
    format!("| {} |\n", cells.join(" | "))
}

fn row_cells(row: &Element) -> Vec<&Element> {
    row.element_children()
        .filter(|cell| cell.tag == "td" || cell.tag == "th")
        .collect()
}

/// Rows of the body section, or every row outside the header section
fn body_rows(table: &Element) -> Vec<&Element> {
    if let Some(tbody) = table.find_tag("tbody") {
        return tbody.find_all(|el| el.tag == "tr");
    }

    let mut rows = Vec::new();
    collect_rows_outside_header(table, &mut rows);
    rows
}

fn collect_rows_outside_header<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
    for child in el.element_children() {
        match child.tag.as_str() {
            "thead" => continue,
            "tr" => out.push(child),
            _ => {}
        }
        collect_rows_outside_header(child, out);
    }
}
