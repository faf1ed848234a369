//! Archive loading: ZIP bytes in, a flat path → bytes table out.

use anyhow::Context;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::MemoryReader;
use crate::zip::ZipExtractor;

/// Every file of an archive, keyed by its normalized in-archive path.
///
/// Keys are unique and never name a directory. Iteration follows the order
/// of the archive's Central Directory; when a name occurs twice the later
/// data wins but the key keeps its first position.
#[derive(Debug, Default, Clone)]
pub struct ArchiveTable {
    entries: Vec<(String, Bytes)>,
    index: HashMap<String, usize>,
}

impl ArchiveTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Bytes>) {
        let path = path.into();
        let data = data.into();
        match self.index.get(&path) {
            Some(&slot) => self.entries[slot].1 = data,
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, data));
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&Bytes> {
        self.index.get(path).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Paths in table order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all file sizes.
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|(_, data)| data.len() as u64).sum()
    }
}

/// Normalize an in-archive name to a forward-slash path relative to the root.
pub fn normalize_path(name: &str) -> String {
    let mut path = name.replace('\\', "/");
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest.to_string();
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest.to_string();
        } else {
            return path;
        }
    }
}

/// Whether `path` is archiver debris rather than export content.
///
/// macOS Finder adds a `__MACOSX/` tree of AppleDouble files (`._IMG_1.jpg`)
/// next to the real ones; any segment starting with a dot is treated the
/// same way.
pub fn is_hidden_path(path: &str) -> bool {
    path.split('/')
        .any(|segment| segment == "__MACOSX" || segment.starts_with('.'))
}

/// Decompress a ZIP archive held in memory into an [`ArchiveTable`].
///
/// Directory entries are skipped. Any entry that fails to decompress fails
/// the whole load; a partial table is never returned. Decompression runs on
/// the blocking pool, so other tasks keep running while a large export loads.
pub async fn load(bytes: impl Into<Bytes>) -> Result<ArchiveTable> {
    let reader = Arc::new(MemoryReader::new(bytes));
    let extractor = ZipExtractor::new(reader);

    let entries = extractor.list_files().await.map_err(Error::ArchiveCorrupt)?;
    debug!(entries = entries.len(), "read central directory");

    let mut table = ArchiveTable::new();
    for entry in entries.iter().filter(|e| !e.is_directory) {
        let data = extractor
            .extract_to_memory(entry)
            .await
            .with_context(|| format!("Failed to extract {}", entry.file_name))
            .map_err(Error::ArchiveCorrupt)?;

        let path = normalize_path(&entry.file_name);
        if path.is_empty() {
            continue;
        }
        table.insert(path, data);
    }

    info!(
        files = table.len(),
        bytes = table.total_bytes(),
        "loaded archive"
    );
    Ok(table)
}
