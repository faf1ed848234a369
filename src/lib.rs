//! # postzip
//!
//! Rebuilds the posts of a social media data export from its ZIP archive.
//!
//! An export bundles image files with JSON metadata (captions, media
//! references, creation times) in a layout that is undocumented and varies
//! between export-tool versions. This crate decompresses the archive in
//! memory, finds the media and activity trees by path heuristics, reads
//! every metadata file it can, and pairs each metadata record with an image
//! file, falling back to generic posts when nothing pairs up.
//!
//! ## Pipeline
//!
//! - [`archive`]: ZIP bytes to a path → bytes [`ArchiveTable`]
//! - [`roots`]: locate the media and activity roots
//! - [`metadata`]: tolerant JSON extraction into [`PostInfo`] records
//! - [`images`]: image files under the media root
//! - [`matcher`]: pair records with images
//! - [`assemble`]: number posts and mint display handles
//!
//! ## Example
//!
//! ```no_run
//! use postzip::{ExportParser, ParserConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bytes = std::fs::read("instagram-export.zip")?;
//!
//!     let parser = ExportParser::new(ParserConfig::default());
//!     let result = parser.parse(bytes).await?;
//!     for post in &result.posts {
//!         println!("{} {} {}", post.id, post.image.uri, post.caption);
//!     }
//!
//!     // Release the image handles once the posts are no longer shown
//!     parser.teardown();
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod assemble;
pub mod config;
pub mod error;
pub mod handle;
pub mod images;
pub mod io;
pub mod matcher;
pub mod metadata;
pub mod pipeline;
pub mod roots;
pub mod zip;

#[cfg(test)]
mod test_support;

pub use archive::ArchiveTable;
pub use assemble::{MatchSummary, ParseResult, Post};
pub use config::ParserConfig;
pub use error::{Error, MetadataFileParseError, Result, RootKind};
pub use handle::{HandleMinter, ImageHandle, MemoryHandleStore};
pub use io::{MemoryReader, ReadAt};
pub use matcher::{MatchStrategy, MatchedPair};
pub use metadata::PostInfo;
pub use pipeline::ExportParser;
pub use roots::{DirectoryResolver, DirectoryRoots, RootDetector};
pub use crate::zip::{ZipExtractor, ZipFileEntry};
