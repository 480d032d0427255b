use thiserror::Error;

/// Errors raised while capturing, assembling or saving a document
#[derive(Debug, Error)]
pub enum ExportError {
    /// No scrollable document container exists on the page
    #[error("document container not found")]
    NoContainerFound,

    /// A full capture pass finished without a single block
    #[error("no content captured")]
    NoContentCaptured,

    /// A stop was requested before scrolling began
    #[error("capture cancelled before it started")]
    CaptureCancelled,

    /// A capture session is already running
    #[error("a capture session is already active")]
    SessionActive,

    /// A single image could not be fetched
    #[error("failed to fetch image {url}: {reason}")]
    ImageFetchFailed { url: String, reason: String },

    /// The target refused the write (conflict, read-only location)
    #[error("persistence denied: {0}")]
    PersistenceDenied(String),

    /// The process lacks permission on the target location
    #[error("persistence permission error: {0}")]
    PersistencePermission(String),

    /// The user aborted the save step
    #[error("persistence cancelled")]
    PersistenceCancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not connect to a WebDriver server at {0}")]
    WebDriverConnect(String),

    #[error("WebDriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("unexpected script result: {0}")]
    ScriptResult(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Whether a failed primary save may be retried on the fallback target
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            ExportError::PersistenceDenied(_) | ExportError::PersistencePermission(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
