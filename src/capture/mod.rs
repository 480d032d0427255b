pub mod viewport;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

pub use viewport::{ScrollMetrics, Viewport};
pub use webdriver::WebDriverViewport;

use std::time::Duration;

use crate::error::{ExportError, Result};
use crate::harvest::Harvester;
use crate::session::{CaptureSession, CaptureState};

/// Pacing and termination parameters of the scroll loop
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Pixels advanced per iteration
    pub scroll_step: f64,

    /// Pause after each iteration so the renderer can mount new blocks
    pub delay: Duration,

    /// Distance from the bottom that counts as the end of the document
    pub bottom_tolerance: f64,

    /// Consecutive iterations without new blocks that end the capture
    pub idle_threshold: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scroll_step: 300.0,
            delay: Duration::from_millis(600),
            bottom_tolerance: 50.0,
            idle_threshold: 5,
        }
    }
}

/// Scroll through the document, harvesting blocks until the end is reached,
/// the content stops growing, or a stop is requested.
///
/// Returns the terminal state: `Done` or `Stopping`. Both leave the captured
/// blocks in `session` for export.
pub async fn run_capture<V: Viewport>(
    viewport: &mut V,
    session: &mut CaptureSession,
    harvester: &Harvester,
    options: &CaptureOptions,
) -> Result<CaptureState> {
    session.begin()?;

    match capture_loop(viewport, session, harvester, options).await {
        Ok(state) => {
            session.transition(state);
            ::log::info!(
                "Capture finished in state {:?}: {} blocks, {} images after {} iterations",
                state,
                session.blocks.len(),
                session.images.len(),
                session.iterations
            );
            Ok(state)
        }
        Err(e) => {
            session.transition(CaptureState::Error);
            ::log::error!("Capture failed: {}", e);
            Err(e)
        }
    }
}

async fn capture_loop<V: Viewport>(
    viewport: &mut V,
    session: &mut CaptureSession,
    harvester: &Harvester,
    options: &CaptureOptions,
) -> Result<CaptureState> {
    if !viewport.locate_container().await? {
        return Err(ExportError::NoContainerFound);
    }

    loop {
        if session.stop_requested() {
            ::log::info!("Stop requested, keeping {} blocks", session.blocks.len());
            return Ok(CaptureState::Stopping);
        }

        let previous_count = session.blocks.len();
        let metrics = viewport.metrics().await?;

        viewport
            .scroll_to(metrics.scroll_top + options.scroll_step)
            .await?;

        let html = viewport.snapshot().await?;
        harvester.scan(&html, &mut session.blocks, &mut session.images);

        session.progress = metrics.progress();
        session.record_iteration(previous_count);
        ::log::info!(
            "Capturing... {}% ({} blocks)",
            session.progress,
            session.blocks.len()
        );

        if metrics.at_bottom(options.bottom_tolerance) {
            ::log::debug!("Reached the bottom of the document");
            return Ok(CaptureState::Done);
        }
        if session.no_new_block_streak >= options.idle_threshold {
            ::log::debug!(
                "No new blocks for {} iterations, assuming the end",
                session.no_new_block_streak
            );
            return Ok(CaptureState::Done);
        }

        tokio::time::sleep(options.delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::FakeViewport;

    fn fast_options() -> CaptureOptions {
        CaptureOptions {
            delay: Duration::ZERO,
            ..CaptureOptions::default()
        }
    }

    #[tokio::test]
    async fn test_capture_reaches_bottom_with_all_blocks() {
        let mut viewport = FakeViewport::new(20, 150.0);
        let mut session = CaptureSession::new();
        let harvester = Harvester::default();

        let state = run_capture(&mut viewport, &mut session, &harvester, &fast_options())
            .await
            .unwrap();

        assert_eq!(state, CaptureState::Done);
        assert_eq!(session.state(), CaptureState::Done);
        assert_eq!(session.blocks.len(), 20);
        let ids: Vec<_> = session.blocks.ids().collect();
        assert_eq!(ids.first(), Some(&"b0"));
        assert_eq!(ids.last(), Some(&"b19"));
        assert_eq!(session.progress, 100);
    }

    #[tokio::test]
    async fn test_capture_terminates_when_content_stops_growing() {
        let mut viewport = FakeViewport::new(3, 100.0);
        viewport.scroll_height = 1_000_000.0;
        viewport.stuck_at = Some(0.0);
        let mut session = CaptureSession::new();
        let harvester = Harvester::default();

        let state = run_capture(&mut viewport, &mut session, &harvester, &fast_options())
            .await
            .unwrap();

        assert_eq!(state, CaptureState::Done);
        assert_eq!(session.blocks.len(), 3);
        assert_eq!(session.no_new_block_streak, 5);
        // One productive iteration followed by five idle ones
        assert_eq!(session.iterations, 6);
    }

    #[tokio::test]
    async fn test_stop_request_keeps_partial_capture() {
        let mut session = CaptureSession::new();
        let mut viewport = FakeViewport::new(50, 300.0);
        viewport.stop_after = Some((2, session.stop_handle()));
        let harvester = Harvester::default();

        let state = run_capture(&mut viewport, &mut session, &harvester, &fast_options())
            .await
            .unwrap();

        assert_eq!(state, CaptureState::Stopping);
        assert_eq!(session.iterations, 2);
        assert!(!session.blocks.is_empty());
        assert!(session.blocks.len() < 50);
    }

    #[tokio::test]
    async fn test_missing_container_is_an_error() {
        let mut viewport = FakeViewport::new(1, 100.0);
        viewport.has_container = false;
        let mut session = CaptureSession::new();

        let result = run_capture(
            &mut viewport,
            &mut session,
            &Harvester::default(),
            &fast_options(),
        )
        .await;

        assert!(matches!(result, Err(ExportError::NoContainerFound)));
        assert_eq!(session.state(), CaptureState::Error);
    }
}
