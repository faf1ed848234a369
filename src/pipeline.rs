//! The parse pipeline.
//!
//! [`ExportParser`] runs the stages in dependency order:
//!
//! ```text
//! load ─► resolve roots ─► locate images ─┐
//!                      └─► extract metadata ─► match ─► assemble
//! ```
//!
//! Each call to [`ExportParser::parse`] owns its archive table; the parser
//! itself only keeps the display handles it minted and the last run's
//! table and diagnostics, all of which [`ExportParser::teardown`] drops.

use bytes::Bytes;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::archive::{self, ArchiveTable};
use crate::assemble::{ParseResult, assemble};
use crate::config::ParserConfig;
use crate::error::{MetadataFileParseError, Result};
use crate::handle::{HandleMinter, ImageHandle, MemoryHandleStore};
use crate::images;
use crate::matcher::match_posts;
use crate::metadata;
use crate::roots::{DirectoryResolver, DirectoryRoots, RootDetector};

#[derive(Default)]
struct RunState {
    table: Option<Arc<ArchiveTable>>,
    diagnostics: Vec<MetadataFileParseError>,
    /// Handles minted by this parser and not yet released
    minted: Vec<ImageHandle>,
}

/// Parses export archives into posts.
///
/// The minter may be shared with other parsers; each parser remembers the
/// handles it minted and releases only those.
pub struct ExportParser<M: HandleMinter = MemoryHandleStore> {
    config: ParserConfig,
    resolver: DirectoryResolver,
    minter: Arc<M>,
    state: Mutex<RunState>,
}

impl ExportParser<MemoryHandleStore> {
    pub fn new(config: ParserConfig) -> Self {
        Self::with_minter(config, Arc::new(MemoryHandleStore::new()))
    }
}

impl Default for ExportParser<MemoryHandleStore> {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl<M: HandleMinter> ExportParser<M> {
    pub fn with_minter(config: ParserConfig, minter: Arc<M>) -> Self {
        let resolver = DirectoryResolver::from_config(&config);
        Self {
            config,
            resolver,
            minter,
            state: Mutex::new(RunState::default()),
        }
    }

    /// Replace the media root heuristic.
    pub fn with_media_detector(mut self, detector: impl RootDetector + 'static) -> Self {
        self.resolver = self.resolver.with_media_detector(detector);
        self
    }

    /// Replace the activity root heuristic.
    pub fn with_activity_detector(mut self, detector: impl RootDetector + 'static) -> Self {
        self.resolver = self.resolver.with_activity_detector(detector);
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn minter(&self) -> &Arc<M> {
        &self.minter
    }

    /// Parse an export archive.
    ///
    /// Fails only when the archive cannot be decompressed or lacks the
    /// media or activity tree. Unreadable metadata files are skipped and
    /// reported through [`diagnostics`](Self::diagnostics).
    pub async fn parse(&self, archive: impl Into<Bytes>) -> Result<ParseResult> {
        let table = Arc::new(archive::load(archive).await?);
        let DirectoryRoots {
            media_root,
            activity_root,
        } = self.resolver.resolve(&table)?;

        let images = images::locate(&table, &media_root, &self.config);
        let extraction = metadata::extract(&table, &activity_root, &self.config);
        if images.is_empty() {
            warn!(%media_root, "no images found under media root");
        }

        let pairs = match_posts(
            &extraction.posts,
            &images,
            &self.config,
            Utc::now().timestamp_millis(),
        );
        let result = assemble(
            pairs,
            images.len(),
            extraction.files,
            table.clone(),
            self.minter.as_ref(),
        )
        .await;

        info!(
            posts = result.total_posts,
            images = result.total_images,
            metadata_files = result.metadata_file_names.len(),
            skipped_files = extraction.skipped.len(),
            fallback = result.match_summary.is_fallback(),
            "parsed export"
        );

        if let Ok(mut state) = self.state.lock() {
            state.table = Some(table);
            state.diagnostics = extraction.skipped;
            state.minted.extend(
                result
                    .posts
                    .iter()
                    .filter(|post| !post.image.is_placeholder())
                    .map(|post| post.image.clone()),
            );
        }
        Ok(result)
    }

    /// Metadata files skipped by the last run.
    pub fn diagnostics(&self) -> Vec<MetadataFileParseError> {
        self.state
            .lock()
            .map(|state| state.diagnostics.clone())
            .unwrap_or_default()
    }

    /// Table of the last successful run, if not torn down.
    pub fn last_table(&self) -> Option<Arc<ArchiveTable>> {
        self.state.lock().ok().and_then(|state| state.table.clone())
    }

    /// Release every display handle this parser minted and drop retained
    /// run state. Safe to call repeatedly, and before any parse.
    pub fn teardown(&self) {
        let state = match self.state.lock() {
            Ok(mut state) => std::mem::take(&mut *state),
            Err(_) => return,
        };
        let released = self.minter.release(&state.minted);
        info!(released, "released image handles");
    }
}
