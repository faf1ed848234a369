//! Error types for postzip.

use std::fmt;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Which of the two required export subtrees a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Media,
    Activity,
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootKind::Media => f.write_str("media"),
            RootKind::Activity => f.write_str("activity"),
        }
    }
}

/// Errors that abort a parse run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The buffer is not an openable ZIP archive, or an entry failed to decompress.
    #[error("failed to parse data: corrupt archive: {0}")]
    ArchiveCorrupt(#[source] anyhow::Error),

    /// The archive does not have the expected export layout.
    #[error("failed to parse data: {kind} directory not found in archive")]
    DirectoryNotFound { kind: RootKind },

    /// A configuration override could not be read.
    #[error("invalid parser configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub fn directory_not_found(kind: RootKind) -> Self {
        Self::DirectoryNotFound { kind }
    }

    /// True for failures caused by the archive bytes themselves.
    pub fn is_archive_error(&self) -> bool {
        matches!(self, Error::ArchiveCorrupt(_))
    }
}

/// A metadata file that was skipped during extraction.
///
/// Never aborts a run; collected and logged so the rest of the archive
/// can still be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("skipped metadata file {path}: {reason}")]
pub struct MetadataFileParseError {
    pub path: String,
    pub reason: String,
}
