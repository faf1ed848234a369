//! Locating the media and activity subtrees of an export.
//!
//! Exports carry no manifest naming their top-level folders, and the
//! folder layout shifts between export-tool versions, so both roots are
//! found by scanning paths for marker substrings. Each scan is a
//! [`RootDetector`]; a stricter or alternative detector can be swapped in
//! without touching the rest of the pipeline.

use tracing::debug;

use crate::archive::{ArchiveTable, is_hidden_path};
use crate::config::ParserConfig;
use crate::error::{Error, Result, RootKind};

/// A strategy that picks a root prefix out of a set of archive paths.
pub trait RootDetector: Send + Sync {
    fn detect(&self, paths: &[&str]) -> Option<String>;
}

impl<F> RootDetector for F
where
    F: Fn(&[&str]) -> Option<String> + Send + Sync,
{
    fn detect(&self, paths: &[&str]) -> Option<String> {
        self(paths)
    }
}

/// Finds the first path containing the media marker followed by the posts
/// marker; the root is everything before the posts marker.
///
/// `media/posts/202301/IMG_1.jpg` gives `media/`.
#[derive(Debug, Clone)]
pub struct MediaRootDetector {
    media_marker: String,
    posts_marker: String,
}

impl MediaRootDetector {
    pub fn new(media_marker: impl Into<String>, posts_marker: impl Into<String>) -> Self {
        Self {
            media_marker: media_marker.into(),
            posts_marker: posts_marker.into(),
        }
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new(&config.media_marker, &config.posts_marker)
    }

    fn root_of(&self, path: &str) -> Option<String> {
        let media_at = path.find(&self.media_marker)?;
        let posts_at = media_at + path[media_at..].find(&self.posts_marker)?;
        Some(path[..posts_at].to_string())
    }
}

impl RootDetector for MediaRootDetector {
    fn detect(&self, paths: &[&str]) -> Option<String> {
        paths.iter().find_map(|path| self.root_of(path))
    }
}

/// Finds the first path containing the activity segment; the root is the
/// prefix up to and including it.
///
/// `data/your_instagram_activity/content/posts_1.json` gives
/// `data/your_instagram_activity`.
#[derive(Debug, Clone)]
pub struct ActivityRootDetector {
    segment: String,
}

impl ActivityRootDetector {
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
        }
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new(&config.activity_marker)
    }
}

impl RootDetector for ActivityRootDetector {
    fn detect(&self, paths: &[&str]) -> Option<String> {
        paths.iter().find_map(|path| {
            path.find(&self.segment)
                .map(|at| path[..at + self.segment.len()].to_string())
        })
    }
}

/// The two prefixes every relevant file lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRoots {
    pub media_root: String,
    pub activity_root: String,
}

/// Runs one detector per root over a table's paths.
pub struct DirectoryResolver {
    media: Box<dyn RootDetector>,
    activity: Box<dyn RootDetector>,
}

impl DirectoryResolver {
    pub fn new(media: Box<dyn RootDetector>, activity: Box<dyn RootDetector>) -> Self {
        Self { media, activity }
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new(
            Box::new(MediaRootDetector::from_config(config)),
            Box::new(ActivityRootDetector::from_config(config)),
        )
    }

    pub fn with_media_detector(mut self, detector: impl RootDetector + 'static) -> Self {
        self.media = Box::new(detector);
        self
    }

    pub fn with_activity_detector(mut self, detector: impl RootDetector + 'static) -> Self {
        self.activity = Box::new(detector);
        self
    }

    /// Resolve both roots, failing if either cannot be found.
    ///
    /// Detectors never see `__MACOSX` copies or dot-files.
    pub fn resolve(&self, table: &ArchiveTable) -> Result<DirectoryRoots> {
        let paths: Vec<&str> = table.paths().filter(|p| !is_hidden_path(p)).collect();

        let media_root = self
            .media
            .detect(&paths)
            .ok_or_else(|| Error::directory_not_found(RootKind::Media))?;
        let activity_root = self
            .activity
            .detect(&paths)
            .ok_or_else(|| Error::directory_not_found(RootKind::Activity))?;

        debug!(%media_root, %activity_root, "resolved export roots");
        Ok(DirectoryRoots {
            media_root,
            activity_root,
        })
    }
}

impl Default for DirectoryResolver {
    fn default() -> Self {
        Self::from_config(&ParserConfig::default())
    }
}
