//! Turning matched pairs into the posts handed back to the caller.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::archive::ArchiveTable;
use crate::handle::{HandleMinter, ImageHandle};
use crate::matcher::{MatchStrategy, MatchedPair};

/// A post ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// `post_<index>`, in output order
    pub id: String,
    pub image: ImageHandle,
    pub image_path: String,
    pub caption: String,
    /// Epoch milliseconds
    pub timestamp: Option<i64>,
    pub selected: bool,
    pub original_payload: Value,
}

/// How many posts each matching strategy produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub exact: usize,
    pub partial: usize,
    pub timestamp: usize,
    pub fallback: usize,
}

impl MatchSummary {
    pub fn from_pairs(pairs: &[MatchedPair]) -> Self {
        let mut summary = Self::default();
        for pair in pairs {
            match pair.strategy {
                MatchStrategy::ExactFilename => summary.exact += 1,
                MatchStrategy::PartialFilename => summary.partial += 1,
                MatchStrategy::Timestamp => summary.timestamp += 1,
                MatchStrategy::Fallback => summary.fallback += 1,
            }
        }
        summary
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback > 0
    }
}

/// Outcome of one parse run.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub posts: Vec<Post>,
    pub total_posts: usize,
    pub total_images: usize,
    pub metadata_file_names: Vec<String>,
    pub raw_files: Arc<ArchiveTable>,
    pub match_summary: MatchSummary,
}

/// Mint a handle per pair and number the posts in pair order.
///
/// A pair whose image is missing from the table, or whose handle cannot be
/// minted, still becomes a post, with a placeholder handle.
pub async fn assemble<M>(
    pairs: Vec<MatchedPair>,
    total_images: usize,
    metadata_file_names: Vec<String>,
    table: Arc<ArchiveTable>,
    minter: &M,
) -> ParseResult
where
    M: HandleMinter + ?Sized,
{
    let match_summary = MatchSummary::from_pairs(&pairs);
    let mut posts = Vec::with_capacity(pairs.len());

    for (index, pair) in pairs.into_iter().enumerate() {
        let image = match table.get(&pair.image_path) {
            Some(data) => match minter.mint(&pair.image_path, data.clone()).await {
                Ok(handle) => handle,
                Err(e) => {
                    warn!(path = %pair.image_path, error = %e, "could not create image handle");
                    ImageHandle::placeholder()
                }
            },
            None => {
                warn!(path = %pair.image_path, "image missing from archive");
                ImageHandle::placeholder()
            }
        };

        posts.push(Post {
            id: format!("post_{}", index),
            image,
            image_path: pair.image_path,
            caption: pair.caption,
            timestamp: pair.timestamp,
            selected: true,
            original_payload: pair.original_payload,
        });
    }

    ParseResult {
        total_posts: posts.len(),
        posts,
        total_images,
        metadata_file_names,
        raw_files: table,
        match_summary,
    }
}
