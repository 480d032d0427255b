// Re-export modules
pub mod assets;
pub mod capture;
pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod filter;
pub mod harvest;
pub mod markdown;
pub mod persist;
pub mod results;
pub mod session;
pub mod settings;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::ExportConfig;
pub use error::ExportError;
pub use results::{BlockStore, ExportBundle, ImageRefs};
pub use session::{CaptureSession, CaptureState, StopHandle};
pub use settings::ExportMode;

use std::path::Path;

use assets::{HttpFetcher, ImageFetcher, resolve_images};
use capture::{Viewport, WebDriverViewport, run_capture};
use export::{TitleSources, assemble};
use harvest::Harvester;
use persist::{DirectoryStore, SaveOutcome, save_bundle};

/// Summary of a finished export
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// `Done`, or `Stopping` for a partial capture
    pub state: CaptureState,
    pub title: String,
    pub blocks: usize,
    pub images_saved: usize,
    pub images_failed: Vec<String>,
    pub outcome: SaveOutcome,
}

/// Main builder for exporting one document
pub struct Exporter {
    config: ExportConfig,
    stop: StopHandle,
}

impl Exporter {
    /// Create a new Exporter for the document at `url`
    pub fn new(url: &str) -> Self {
        Self {
            config: ExportConfig::new(url),
            stop: StopHandle::new(),
        }
    }

    /// Replace the configuration. A config without a URL keeps the current one.
    pub fn with_config(mut self, mut config: ExportConfig) -> Self {
        if config.url.is_empty() {
            config.url = std::mem::take(&mut self.config.url);
        }
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(
        self,
        path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = ExportConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config = ExportConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    pub fn with_webdriver_url(mut self, webdriver_url: &str) -> Self {
        self.config.webdriver_url = webdriver_url.to_string();
        self
    }

    pub fn with_output_dir(mut self, output_dir: &str) -> Self {
        self.config.output_dir = output_dir.to_string();
        self
    }

    pub fn with_export_mode(mut self, mode: ExportMode) -> Self {
        self.config.export_mode = Some(mode);
        self
    }

    /// Share a stop handle, e.g. one triggered by Ctrl-C
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Open the document in the browser, capture it and save the export
    pub async fn run(self) -> Result<ExportReport, Box<dyn std::error::Error>> {
        let mut config = self.config;
        config.apply_env();
        if config.url.is_empty() {
            return Err(Box::new(ExportError::Config("no document URL".to_string())));
        }

        let mut viewport = WebDriverViewport::connect(&config.webdriver_url).await?;
        let result = async {
            viewport.open(&config.url).await?;
            viewport
                .wait_until_ready(config.ready_timeout(), config.ready_poll_interval())
                .await?;

            let mut session = CaptureSession::with_stop_handle(self.stop.clone());
            export_document(&mut viewport, &HttpFetcher::new(), &config, &mut session).await
        }
        .await;

        if let Err(e) = viewport.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
        Ok(result?)
    }
}

/// Capture the document shown in `viewport`, then assemble, resolve images and
/// save according to `config`.
pub async fn export_document<V, F>(
    viewport: &mut V,
    fetcher: &F,
    config: &ExportConfig,
    session: &mut CaptureSession,
) -> Result<ExportReport, ExportError>
where
    V: Viewport,
    F: ImageFetcher,
{
    let harvester = Harvester::new(&config.block_selector).map_err(ExportError::Config)?;

    // `begin` clears the stop flag, so a stop raised while the page loaded is honored here
    if session.stop_requested() {
        ::log::info!("Stop requested before capture started");
        return Err(ExportError::CaptureCancelled);
    }
    let state = run_capture(viewport, session, &harvester, &config.capture_options()).await?;

    let sources = TitleSources {
        page_html: viewport
            .page_html()
            .await
            .inspect_err(|e| ::log::warn!("Page HTML unavailable: {}", e))
            .ok(),
        page_title: viewport
            .page_title()
            .await
            .inspect_err(|e| ::log::warn!("Page title unavailable: {}", e))
            .ok(),
    };

    let Some(bundle) = assemble(
        &session.blocks,
        &sources,
        &config.title_prefix,
        &chrono::Local::now(),
    ) else {
        ::log::warn!("Capture ended without any content");
        return Err(ExportError::NoContentCaptured);
    };

    let images = resolve_images(&bundle.image_urls, fetcher, config.image_concurrency).await;

    let mode = config.export_mode.unwrap_or_default();
    let primary = match mode {
        ExportMode::Folder => DirectoryStore::new(&config.output_dir),
        ExportMode::Download => DirectoryStore::new(&config.download_dir),
    };
    let fallback = DirectoryStore::new(&config.download_dir);
    let outcome = save_bundle(&bundle, &images, &primary, Some(&fallback))?;

    Ok(ExportReport {
        state,
        title: bundle.title,
        blocks: session.blocks.len(),
        images_saved: images.len(),
        images_failed: images.failed_urls().map(str::to_string).collect(),
        outcome,
    })
}
