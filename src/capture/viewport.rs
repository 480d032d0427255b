use serde::Deserialize;

use crate::error::Result;

/// Scroll position of the document container, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    /// Percentage of the document seen so far, capped at 100
    pub fn progress(&self) -> u8 {
        if self.scroll_height <= 0.0 {
            return 100;
        }
        let seen = (self.scroll_top + self.client_height) / self.scroll_height * 100.0;
        seen.round().clamp(0.0, 100.0) as u8
    }

    /// Whether the visible window is within `tolerance` pixels of the bottom
    pub fn at_bottom(&self, tolerance: f64) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - tolerance
    }
}

/// Access to the live, lazily rendered document.
///
/// Implementations never mutate the page content; `snapshot` returns
/// serialized HTML of the content region.
#[allow(async_fn_in_trait)]
pub trait Viewport {
    /// Find the scrollable document container; false if none exists
    async fn locate_container(&mut self) -> Result<bool>;

    async fn metrics(&mut self) -> Result<ScrollMetrics>;

    /// Scroll the container to an absolute offset
    async fn scroll_to(&mut self, top: f64) -> Result<()>;

    /// HTML of the content region as currently rendered
    async fn snapshot(&mut self) -> Result<String>;

    /// The page's title metadata
    async fn page_title(&mut self) -> Result<String>;

    /// Full page HTML, used for title lookup
    async fn page_html(&mut self) -> Result<String>;
}
