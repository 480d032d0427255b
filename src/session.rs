use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ExportError, Result};
use crate::results::{BlockStore, ImageRefs};

/// Lifecycle of a capture session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
    /// A stop was requested; the partial capture is still exported
    Stopping,
    Done,
    Error,
}

/// Cooperative stop flag, cloneable across tasks
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// All mutable state of one capture, owned by the caller
#[derive(Debug, Default)]
pub struct CaptureSession {
    state: CaptureState,
    stop: StopHandle,
    pub blocks: BlockStore,
    pub images: ImageRefs,
    pub no_new_block_streak: u32,
    pub progress: u8,
    pub iterations: u32,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally created stop handle (e.g. wired to Ctrl-C)
    pub fn with_stop_handle(stop: StopHandle) -> Self {
        Self {
            stop,
            ..Self::default()
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Reset every field and enter `Capturing`
    pub fn begin(&mut self) -> Result<()> {
        if self.state == CaptureState::Capturing {
            return Err(ExportError::SessionActive);
        }
        self.blocks.clear();
        self.images.clear();
        self.no_new_block_streak = 0;
        self.progress = 0;
        self.iterations = 0;
        self.stop.reset();
        self.state = CaptureState::Capturing;
        Ok(())
    }

    pub(crate) fn transition(&mut self, state: CaptureState) {
        ::log::debug!("Capture state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_stop_requested()
    }

    /// Update the no-new-content streak from the previous block count
    pub(crate) fn record_iteration(&mut self, previous_count: usize) {
        self.iterations += 1;
        if self.blocks.len() == previous_count {
            self.no_new_block_streak += 1;
        } else {
            self.no_new_block_streak = 0;
        }
    }
}
