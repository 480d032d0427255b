//! In-memory stand-in for a lazily rendered document.

use super::viewport::{ScrollMetrics, Viewport};
use crate::error::Result;
use crate::session::StopHandle;

/// Blocks are mounted only while they are within one screen of the window
pub(crate) struct FakeViewport {
    pub has_container: bool,
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
    /// (offset at which the block sits, block html)
    pub blocks: Vec<(f64, String)>,
    /// Scrolling never passes this offset when set
    pub stuck_at: Option<f64>,
    pub snapshots: u32,
    /// Request a stop once this many snapshots were taken
    pub stop_after: Option<(u32, StopHandle)>,
    pub page_title: String,
    pub page_html: String,
}

impl FakeViewport {
    /// `block_count` text blocks, `spacing` pixels apart
    pub fn new(block_count: usize, spacing: f64) -> Self {
        let blocks = (0..block_count)
            .map(|i| {
                format!(
                    r#"<div data-block-id="b{i}" data-block-type="text"><span>Block {i}</span></div>"#
                )
            })
            .collect();
        Self::with_blocks(blocks, spacing)
    }

    pub fn with_blocks(blocks: Vec<String>, spacing: f64) -> Self {
        let scroll_height = blocks.len() as f64 * spacing + 600.0;
        Self {
            has_container: true,
            scroll_top: 0.0,
            client_height: 600.0,
            scroll_height,
            blocks: blocks
                .into_iter()
                .enumerate()
                .map(|(i, html)| (i as f64 * spacing, html))
                .collect(),
            stuck_at: None,
            snapshots: 0,
            stop_after: None,
            page_title: String::new(),
            page_html: String::new(),
        }
    }
}

impl Viewport for FakeViewport {
    async fn locate_container(&mut self) -> Result<bool> {
        Ok(self.has_container)
    }

    async fn metrics(&mut self) -> Result<ScrollMetrics> {
        Ok(ScrollMetrics {
            scroll_top: self.scroll_top,
            client_height: self.client_height,
            scroll_height: self.scroll_height,
        })
    }

    async fn scroll_to(&mut self, top: f64) -> Result<()> {
        let limit = self
            .stuck_at
            .unwrap_or(self.scroll_height - self.client_height);
        self.scroll_top = top.min(limit).max(0.0);
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<String> {
        self.snapshots += 1;
        if let Some((after, stop)) = &self.stop_after {
            if self.snapshots >= *after {
                stop.request_stop();
            }
        }

        let mounted_from = self.scroll_top - self.client_height;
        let mounted_to = self.scroll_top + self.client_height;
        let visible: String = self
            .blocks
            .iter()
            .filter(|(offset, _)| *offset >= mounted_from && *offset < mounted_to)
            .map(|(_, html)| html.as_str())
            .collect();
        Ok(format!(r#"<div class="bear-render-container">{}</div>"#, visible))
    }

    async fn page_title(&mut self) -> Result<String> {
        Ok(self.page_title.clone())
    }

    async fn page_html(&mut self) -> Result<String> {
        Ok(self.page_html.clone())
    }
}
