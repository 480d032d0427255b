use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::filter::normalize_image_url;

/// Converted blocks keyed by the editor's block id, in discovery order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockStore {
    blocks: IndexMap<String, String>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, block_id: &str) -> bool {
        self.blocks.contains_key(block_id)
    }

    /// Insert a converted block. An id already present is never overwritten.
    pub fn insert(&mut self, block_id: &str, markdown: String) -> bool {
        if self.blocks.contains_key(block_id) {
            return false;
        }
        self.blocks.insert(block_id.to_string(), markdown);
        true
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Block markdown in insertion order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.blocks.values().map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }
}

/// Deduplicated absolute image URLs in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRefs {
    urls: IndexSet<String>,
}

impl ImageRefs {
    /// Admit a raw source after normalization; returns true if newly added
    pub fn insert(&mut self, raw: impl AsRef<str>) -> bool {
        match normalize_image_url(raw.as_ref()) {
            Some(url) => self.urls.insert(url),
            None => false,
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn clear(&mut self) {
        self.urls.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for ImageRefs {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut refs = ImageRefs::default();
        for url in iter {
            refs.insert(url);
        }
        refs
    }
}

/// The assembled document handed to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    /// Normalized Markdown, ending in a single newline
    pub markdown: String,

    /// Image URLs referenced by `markdown`, in order of first appearance
    pub image_urls: ImageRefs,

    /// Sanitized title, usable as a file and folder name
    pub title: String,
}

impl ExportBundle {
    pub fn new(markdown: String, image_urls: ImageRefs, title: String) -> Self {
        Self {
            markdown,
            image_urls,
            title,
        }
    }
}
