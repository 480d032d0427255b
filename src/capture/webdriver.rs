use std::time::Duration;

use fantoccini::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::json;

use super::viewport::{ScrollMetrics, Viewport};
use crate::error::{ExportError, Result};

/// Selectors for the scrollable editor container, in priority order
pub const CONTAINER_SELECTORS: &[&str] = &[
    ".bear-render-container",
    ".docx-editor-container",
    "#docx > div",
];

/// Looser selectors accepted while waiting for the page to render
pub const READY_SELECTORS: &[&str] = &[
    ".bear-render-container",
    ".docx-editor-container",
    "#docx > div",
    "[class*=\"editor\"]",
    "[class*=\"render\"]",
];

/// Common WebDriver endpoints tried when the configured one is unreachable
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // geckodriver / Selenium default
    "http://127.0.0.1:4444",
];

const READY_SCRIPT: &str = r#"
const selectors = arguments[0];
let container = null;
for (const selector of selectors) {
    container = document.querySelector(selector);
    if (container) break;
}
if (!container) {
    return { ready: false, reason: "document container not found", blockCount: 0 };
}
const blocks = document.querySelectorAll("div[data-block-id]").length;
if (blocks === 0 && container.textContent.trim().length <= 50) {
    return { ready: false, reason: "document is empty or still loading", blockCount: 0 };
}
return { ready: true, reason: null, blockCount: blocks };
"#;

const LOCATE_SCRIPT: &str = r#"
for (const selector of arguments[0]) {
    if (document.querySelector(selector)) return selector;
}
return null;
"#;

const METRICS_SCRIPT: &str = r#"
const c = document.querySelector(arguments[0]);
if (!c) return null;
return { scrollTop: c.scrollTop, clientHeight: c.clientHeight, scrollHeight: c.scrollHeight };
"#;

const SCROLL_SCRIPT: &str = r#"
const c = document.querySelector(arguments[0]);
if (c) c.scrollTo({ top: arguments[1], behavior: "instant" });
"#;

// Serializes a detached clone. Live-only state (computed cell alignment,
// checkbox state) is copied onto the clone as attributes.
const SNAPSHOT_SCRIPT: &str = r#"
const c = document.querySelector(arguments[0]);
if (!c) return null;
const clone = c.cloneNode(true);
const liveCells = c.querySelectorAll("td, th");
const cloneCells = clone.querySelectorAll("td, th");
liveCells.forEach((cell, i) => {
    const align = getComputedStyle(cell).textAlign;
    if (cloneCells[i] && align) cloneCells[i].setAttribute("data-computed-align", align);
});
const liveBoxes = c.querySelectorAll('input[type="checkbox"]');
const cloneBoxes = clone.querySelectorAll('input[type="checkbox"]');
liveBoxes.forEach((box, i) => {
    if (!cloneBoxes[i]) return;
    if (box.checked) cloneBoxes[i].setAttribute("checked", "");
    else cloneBoxes[i].removeAttribute("checked");
});
return clone.outerHTML;
"#;

/// Result of the page readiness check
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyStatus {
    pub ready: bool,
    pub reason: Option<String>,
    pub block_count: usize,
}

/// A `Viewport` backed by a browser session driven over WebDriver
pub struct WebDriverViewport {
    client: Client,
    container_selector: Option<String>,
}

impl WebDriverViewport {
    /// Connect to `webdriver_url`, falling back to common local endpoints
    pub async fn connect(webdriver_url: &str) -> Result<Self> {
        let client = connect_to_webdriver(webdriver_url).await?;
        Ok(Self {
            client,
            container_selector: None,
        })
    }

    /// Navigate to the document
    pub async fn open(&mut self, url: &str) -> Result<()> {
        ::log::info!("Opening {}", url);
        self.container_selector = None;
        self.client.goto(url).await?;
        Ok(())
    }

    /// Run the readiness check once
    pub async fn check_ready(&self) -> Result<ReadyStatus> {
        let value = self
            .client
            .execute(READY_SCRIPT, vec![json!(READY_SELECTORS)])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Poll the readiness check until the document has rendered or `timeout`
    /// elapses. Returns the last status either way.
    pub async fn wait_until_ready(
        &self,
        timeout: Duration,
        interval: Duration,
    ) -> Result<ReadyStatus> {
        let started = std::time::Instant::now();
        loop {
            let status = self.check_ready().await?;
            if status.ready {
                ::log::info!("Page ready with {} blocks", status.block_count);
                return Ok(status);
            }
            if started.elapsed() >= timeout {
                ::log::warn!(
                    "Page not ready after {:.1}s: {}",
                    started.elapsed().as_secs_f64(),
                    status.reason.as_deref().unwrap_or("unknown")
                );
                return Ok(status);
            }
            ::log::debug!(
                "Waiting for page: {}",
                status.reason.as_deref().unwrap_or("not ready")
            );
            tokio::time::sleep(interval).await;
        }
    }

    /// End the browser session
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }

    fn selector(&self) -> Result<&str> {
        self.container_selector
            .as_deref()
            .ok_or(ExportError::NoContainerFound)
    }
}

impl Viewport for WebDriverViewport {
    async fn locate_container(&mut self) -> Result<bool> {
        let value = self
            .client
            .execute(LOCATE_SCRIPT, vec![json!(CONTAINER_SELECTORS)])
            .await?;
        self.container_selector = value.as_str().map(str::to_string);
        match &self.container_selector {
            Some(selector) => {
                ::log::debug!("Using document container {}", selector);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn metrics(&mut self) -> Result<ScrollMetrics> {
        let selector = self.selector()?.to_string();
        let value = self
            .client
            .execute(METRICS_SCRIPT, vec![json!(selector)])
            .await?;
        if value.is_null() {
            return Err(ExportError::NoContainerFound);
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn scroll_to(&mut self, top: f64) -> Result<()> {
        let selector = self.selector()?.to_string();
        self.client
            .execute(SCROLL_SCRIPT, vec![json!(selector), json!(top)])
            .await?;
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<String> {
        let selector = self.selector()?.to_string();
        let value = self
            .client
            .execute(SNAPSHOT_SCRIPT, vec![json!(selector)])
            .await?;
        match value {
            serde_json::Value::String(html) => Ok(html),
            serde_json::Value::Null => Err(ExportError::NoContainerFound),
            other => Err(ExportError::ScriptResult(format!(
                "expected snapshot HTML, got {}",
                other
            ))),
        }
    }

    async fn page_title(&mut self) -> Result<String> {
        Ok(self.client.title().await?)
    }

    async fn page_html(&mut self) -> Result<String> {
        Ok(self.client.source().await?)
    }
}

/// Connect to the WebDriver instance, trying the fallbacks after `webdriver_url`
async fn connect_to_webdriver(webdriver_url: &str) -> Result<Client> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                webdriver_url,
                e
            );
        }
    }

    for url in FALLBACK_WEBDRIVER_URLS.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(ExportError::WebDriverConnect(webdriver_url.to_string()))
}
