use scraper::{Html, Selector};

use crate::dom::{copy_element, is_print_hidden};
use crate::markdown;
use crate::results::{BlockStore, ImageRefs};

/// Attribute holding the editor's stable block identifier
pub const BLOCK_ID_ATTR: &str = "data-block-id";

/// Default selector for addressable blocks
pub const DEFAULT_BLOCK_SELECTOR: &str = "div[data-block-id]";

/// Scans DOM snapshots for addressable blocks and converts the unseen ones
#[derive(Debug)]
pub struct Harvester {
    block_selector: Selector,
}

impl Default for Harvester {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SELECTOR).expect("Default block selector should be valid")
    }
}

impl Harvester {
    /// Create a harvester for the given CSS block selector
    pub fn new(block_selector: &str) -> Result<Self, String> {
        let block_selector = Selector::parse(block_selector)
            .map_err(|e| format!("invalid block selector {:?}: {}", block_selector, e))?;
        Ok(Self { block_selector })
    }

    /// Convert every block in `html` whose id is not yet in `store`.
    ///
    /// Returns the number of blocks added. Blocks converting to empty text are
    /// skipped and will be retried on the next scan.
    pub fn scan(&self, html: &str, store: &mut BlockStore, images: &mut ImageRefs) -> usize {
        let snapshot = Html::parse_fragment(html);
        let mut added = 0;

        for block in snapshot.select(&self.block_selector) {
            let Some(block_id) = block.value().attr(BLOCK_ID_ATTR) else {
                continue;
            };
            if store.contains(block_id) {
                continue;
            }

            let copy = copy_element(block, &is_print_hidden);
            let text = markdown::convert(&copy, images);
            if text.is_empty() {
                ::log::trace!("Block {} converted to nothing", block_id);
                continue;
            }

            store.insert(block_id, text);
            added += 1;
        }

        ::log::debug!("Scan added {} blocks ({} total)", added, store.len());
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="page-block-children">
          <div data-block-id="b1" data-block-type="heading1"><span>Title</span></div>
          <div data-block-id="b2" data-block-type="text"><span>Body text</span><span data-print-hidden="1">print only</span></div>
          <div data-block-id="b3" data-block-type="text"></div>
          <div data-block-id="b4" data-block-type="image"><img src="//cdn.example.com/a.png"></div>
        </div>"#;

    #[test]
    fn test_scan_converts_blocks_in_order() {
        let harvester = Harvester::default();
        let mut store = BlockStore::new();
        let mut images = ImageRefs::default();

        let added = harvester.scan(PAGE, &mut store, &mut images);

        assert_eq!(added, 3);
        assert_eq!(store.ids().collect::<Vec<_>>(), vec!["b1", "b2", "b4"]);
        assert_eq!(
            store.values().collect::<Vec<_>>(),
            vec!["# Title", "Body text", "![image](https://cdn.example.com/a.png)"]
        );
        assert!(images.contains("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let harvester = Harvester::default();
        let mut store = BlockStore::new();
        let mut images = ImageRefs::default();

        harvester.scan(PAGE, &mut store, &mut images);
        let first = store.clone();
        let added = harvester.scan(PAGE, &mut store, &mut images);

        assert_eq!(added, 0);
        assert_eq!(store, first);
    }

    #[test]
    fn test_known_ids_are_not_reconverted() {
        let harvester = Harvester::default();
        let mut store = BlockStore::new();
        let mut images = ImageRefs::default();
        store.insert("b1", "kept".to_string());

        harvester.scan(PAGE, &mut store, &mut images);
        assert_eq!(store.values().next(), Some("kept"));
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        assert!(Harvester::new("div[").is_err());
    }
}
