//! Display handles for extracted images.
//!
//! A handle is what a front end renders: an opaque URI plus a MIME type.
//! Handles are minted through [`HandleMinter`] and stay resolvable until
//! the minter releases them, so every handle a parser hands out must
//! eventually be released or it keeps its image bytes alive.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::images::mime_type;

/// Renderable reference to image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageHandle {
    pub uri: String,
    pub mime: String,
}

impl ImageHandle {
    /// Stand-in for an image whose bytes were unavailable.
    pub fn placeholder() -> Self {
        Self {
            uri: String::new(),
            mime: mime_guess::mime::APPLICATION_OCTET_STREAM.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.uri.is_empty()
    }
}

/// Source of display handles
#[async_trait]
pub trait HandleMinter: Send + Sync {
    /// Create a handle for the image at `path` with contents `data`
    async fn mint(&self, path: &str, data: Bytes) -> Result<ImageHandle>;

    /// Release the given handles; returns how many were still live.
    ///
    /// Handles this minter did not issue, placeholders and handles that were
    /// already released are ignored, so several owners can share one minter
    /// and each release only what it minted.
    fn release(&self, handles: &[ImageHandle]) -> usize;
}

/// Keeps minted images in memory behind `mem://` URIs.
#[derive(Debug, Default)]
pub struct MemoryHandleStore {
    next_id: AtomicU64,
    images: Mutex<HashMap<String, Bytes>>,
}

impl MemoryHandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes behind a live handle.
    pub fn resolve(&self, handle: &ImageHandle) -> Option<Bytes> {
        self.images
            .lock()
            .ok()
            .and_then(|images| images.get(&handle.uri).cloned())
    }

    /// Number of handles not yet released.
    pub fn live_count(&self) -> usize {
        self.images.lock().map(|images| images.len()).unwrap_or(0)
    }
}

#[async_trait]
impl HandleMinter for MemoryHandleStore {
    async fn mint(&self, path: &str, data: Bytes) -> Result<ImageHandle> {
        tokio::task::yield_now().await;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let name = path.rsplit('/').next().unwrap_or(path);
        let handle = ImageHandle {
            uri: format!("mem://image/{}/{}", id, name),
            mime: mime_type(path),
        };

        self.images
            .lock()
            .map_err(|_| anyhow::anyhow!("handle store lock poisoned"))?
            .insert(handle.uri.clone(), data);
        Ok(handle)
    }

    fn release(&self, handles: &[ImageHandle]) -> usize {
        match self.images.lock() {
            Ok(mut images) => handles
                .iter()
                .filter(|handle| images.remove(&handle.uri).is_some())
                .count(),
            Err(_) => 0,
        }
    }
}
