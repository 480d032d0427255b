use futures_util::future::join_all;
use indexmap::IndexMap;
use regex::Captures;

use crate::error::{ExportError, Result};
use crate::export::IMAGE_LINK;
use crate::results::ImageRefs;
use crate::utils::image_path;

/// Images fetched at once; each batch completes before the next starts
pub const DEFAULT_FETCH_CONCURRENCY: usize = 3;

/// Extension used when the response declares no usable media type
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// Raw bytes of a downloaded image
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// The binary fetch capability
#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

/// Fetches images over HTTP(S)
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        ::log::trace!("Fetched {} ({} bytes)", url, bytes.len());
        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

/// A downloaded image and its place in the export folder
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// 1-based position of the URL in discovery order
    pub index: usize,
    /// Relative path, e.g. `assets/images/image_001.png`
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Outcome of resolving every image of a document
#[derive(Debug, Default)]
pub struct ResolvedImages {
    resolved: IndexMap<String, ResolvedImage>,
    failed: Vec<ExportError>,
}

impl ResolvedImages {
    /// Local path for `url`, if it was fetched
    pub fn path_for(&self, url: &str) -> Option<&str> {
        self.resolved.get(url).map(|image| image.path.as_str())
    }

    /// Fetched images in discovery order
    pub fn images(&self) -> impl Iterator<Item = &ResolvedImage> {
        self.resolved.values()
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// One `ImageFetchFailed` per URL that could not be fetched
    pub fn failures(&self) -> &[ExportError] {
        &self.failed
    }

    pub fn failed_urls(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().filter_map(|e| match e {
            ExportError::ImageFetchFailed { url, .. } => Some(url.as_str()),
            _ => None,
        })
    }
}

/// Download every URL in `urls`, `concurrency` at a time.
///
/// A failed fetch never affects the others; it is recorded and the image keeps
/// its discovery index, so later images are not renumbered.
pub async fn resolve_images<F: ImageFetcher>(
    urls: &ImageRefs,
    fetcher: &F,
    concurrency: usize,
) -> ResolvedImages {
    let urls: Vec<&str> = urls.iter().collect();
    let total = urls.len();
    let mut result = ResolvedImages::default();
    let mut completed = 0;

    for (batch_no, batch) in urls.chunks(concurrency.max(1)).enumerate() {
        let start = batch_no * concurrency.max(1);
        let fetches = batch.iter().map(|url| fetcher.fetch(url));
        let outcomes = join_all(fetches).await;

        for (offset, (url, outcome)) in batch.iter().zip(outcomes).enumerate() {
            let index = start + offset + 1;
            completed += 1;
            match outcome {
                Ok(image) => {
                    let extension = extension_for(image.content_type.as_deref());
                    let path = image_path(index, &extension);
                    ::log::debug!("Image {}/{}: {} -> {}", completed, total, url, path);
                    result.resolved.insert(
                        url.to_string(),
                        ResolvedImage {
                            index,
                            path,
                            bytes: image.bytes,
                        },
                    );
                }
                Err(e) => {
                    ::log::warn!("Image {}/{} failed: {}: {}", completed, total, url, e);
                    result.failed.push(match e {
                        failed @ ExportError::ImageFetchFailed { .. } => failed,
                        other => ExportError::ImageFetchFailed {
                            url: url.to_string(),
                            reason: other.to_string(),
                        },
                    });
                }
            }
        }
    }

    if !result.failed.is_empty() {
        ::log::warn!("{} of {} images could not be fetched", result.failed.len(), total);
    }
    result
}

/// File extension for a declared media type: the subtype without
/// parameters or structured-syntax suffix, `png` when unknown
pub fn extension_for(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .and_then(|mime| mime.trim().split('/').nth(1))
        .and_then(|subtype| subtype.split('+').next())
        .map(|ext| ext.trim().to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty()
                && ext
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        })
        .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string())
}

/// Point every image whose URL was fetched at its local copy.
/// Alt text is kept; unresolved images are left untouched.
pub fn rewrite_image_links(markdown: &str, images: &ResolvedImages) -> String {
    IMAGE_LINK
        .replace_all(markdown, |caps: &Captures| match images.path_for(caps[2].trim()) {
            Some(path) => format!("![{}]({})", &caps[1], path),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeFetcher {
        responses: HashMap<String, Option<&'static str>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeFetcher {
        fn ok(mut self, url: &str, content_type: Option<&'static str>) -> Self {
            self.responses.insert(url.to_string(), content_type);
            self
        }
    }

    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedImage> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.responses.get(url) {
                Some(content_type) => Ok(FetchedImage {
                    bytes: url.as_bytes().to_vec(),
                    content_type: content_type.map(str::to_string),
                }),
                None => Err(ExportError::ImageFetchFailed {
                    url: url.to_string(),
                    reason: "HTTP 404".to_string(),
                }),
            }
        }
    }

    fn refs(urls: &[&str]) -> ImageRefs {
        urls.iter().collect()
    }

    #[tokio::test]
    async fn test_failures_keep_indices_and_do_not_abort() {
        let fetcher = FakeFetcher::default()
            .ok("https://x/1.png", Some("image/png"))
            .ok("https://x/3.jpg", Some("image/jpeg"))
            .ok("https://x/4", None);
        let urls = refs(&[
            "https://x/1.png",
            "https://x/2.png",
            "https://x/3.jpg",
            "https://x/4",
        ]);

        let resolved = resolve_images(&urls, &fetcher, DEFAULT_FETCH_CONCURRENCY).await;

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved.path_for("https://x/1.png"), Some("assets/images/image_001.png"));
        assert_eq!(resolved.path_for("https://x/2.png"), None);
        assert_eq!(resolved.path_for("https://x/3.jpg"), Some("assets/images/image_003.jpeg"));
        assert_eq!(resolved.path_for("https://x/4"), Some("assets/images/image_004.png"));
        assert_eq!(resolved.failed_urls().collect::<Vec<_>>(), vec!["https://x/2.png"]);
    }

    #[tokio::test]
    async fn test_fetches_are_bounded_by_concurrency() {
        let mut fetcher = FakeFetcher::default();
        let urls: Vec<String> = (0..8).map(|i| format!("https://x/{}.png", i)).collect();
        for url in &urls {
            fetcher = fetcher.ok(url, Some("image/png"));
        }

        let resolved = resolve_images(&urls.iter().collect(), &fetcher, 3).await;

        assert_eq!(resolved.len(), 8);
        assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 3);
        let indices: Vec<_> = resolved.images().map(|image| image.index).collect();
        assert_eq!(indices, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_extension_for_media_types() {
        assert_eq!(extension_for(Some("image/png")), "png");
        assert_eq!(extension_for(Some("image/jpeg; charset=binary")), "jpeg");
        assert_eq!(extension_for(Some("image/svg+xml")), "svg");
        assert_eq!(extension_for(Some("IMAGE/WEBP")), "webp");
        assert_eq!(extension_for(Some("")), "png");
        assert_eq!(extension_for(None), "png");
    }

    #[tokio::test]
    async fn test_rewrite_replaces_every_occurrence() {
        let fetcher = FakeFetcher::default().ok("https://x/y.png", Some("image/png"));
        let resolved = resolve_images(&refs(&["https://x/y.png"]), &fetcher, 3).await;

        let markdown = "![alt](https://x/y.png)\n\ntext\n\n![alt](https://x/y.png)\n![other](https://x/z.png)\n";
        let rewritten = rewrite_image_links(markdown, &resolved);

        assert_eq!(
            rewritten,
            "![alt](assets/images/image_001.png)\n\ntext\n\n![alt](assets/images/image_001.png)\n![other](https://x/z.png)\n"
        );
    }

    #[tokio::test]
    async fn test_every_extracted_url_is_rewritten() {
        let markdown = "![image](https://x/a b.png)\n";
        let urls = crate::export::extract_image_urls(markdown);
        let fetcher = FakeFetcher::default().ok("https://x/a b.png", Some("image/png"));

        let resolved = resolve_images(&urls, &fetcher, 3).await;

        assert_eq!(resolved.len(), 1);
        assert_eq!(
            rewrite_image_links(markdown, &resolved),
            "![image](assets/images/image_001.png)\n"
        );
    }
}
