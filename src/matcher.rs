//! Pairing post records with image files.
//!
//! Exports carry no reliable key tying a metadata item to its image file,
//! so each [`PostInfo`] goes through a ladder of strategies and takes the
//! first that produces an image:
//!
//! 1. the last segment of its media URI equals an image file name
//! 2. an image file name contains one of its URI segments
//! 3. it has a timestamp, and there is at least one image
//!
//! Step 3 always picks the first image. No capture times are read from the
//! images, so this is a coarse heuristic kept for compatibility with
//! existing results rather than a temporal match.
//!
//! When nothing matched at all, the images themselves become posts
//! (fallback mode), so an export whose metadata is missing or unreadable
//! still yields something usable.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

use crate::config::ParserConfig;
use crate::metadata::PostInfo;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// How a pair was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    ExactFilename,
    PartialFilename,
    Timestamp,
    Fallback,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchStrategy::ExactFilename => "exact",
            MatchStrategy::PartialFilename => "partial",
            MatchStrategy::Timestamp => "timestamp",
            MatchStrategy::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub image_path: String,
    pub caption: String,
    pub timestamp: Option<i64>,
    pub original_payload: Value,
    pub strategy: MatchStrategy,
}

/// Image file names in first-seen order, each mapped to the path of the
/// last image carrying that name.
struct ImageIndex<'a> {
    names: Vec<&'a str>,
    paths: HashMap<&'a str, &'a str>,
}

impl<'a> ImageIndex<'a> {
    fn new(images: &'a [String]) -> Self {
        let mut names = Vec::new();
        let mut paths = HashMap::new();
        for path in images {
            let name = last_segment(path);
            if paths.insert(name, path.as_str()).is_none() {
                names.push(name);
            }
        }
        Self { names, paths }
    }

    fn exact(&self, uri: &str) -> Option<&'a str> {
        self.paths.get(last_segment(uri)).copied()
    }

    fn partial(&self, uri: &str) -> Option<&'a str> {
        let segments: Vec<&str> = uri.split('/').filter(|s| !s.is_empty()).collect();
        self.names
            .iter()
            .find(|name| segments.iter().any(|segment| name.contains(segment)))
            .and_then(|name| self.paths.get(name).copied())
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Pair posts with images.
///
/// `now_ms` anchors the synthetic timestamps of fallback mode.
pub fn match_posts(
    posts: &[PostInfo],
    images: &[String],
    config: &ParserConfig,
    now_ms: i64,
) -> Vec<MatchedPair> {
    let index = ImageIndex::new(images);
    let mut pairs = Vec::new();

    for post in posts {
        let found = index
            .exact(&post.media_uri)
            .map(|path| (path, MatchStrategy::ExactFilename))
            .or_else(|| {
                index
                    .partial(&post.media_uri)
                    .map(|path| (path, MatchStrategy::PartialFilename))
            })
            .or_else(|| {
                post.timestamp
                    .and(images.first())
                    .map(|path| (path.as_str(), MatchStrategy::Timestamp))
            });

        match found {
            Some((path, strategy)) => {
                debug!(uri = %post.media_uri, image = %path, %strategy, "matched post");
                pairs.push(MatchedPair {
                    image_path: path.to_string(),
                    caption: post.caption.clone(),
                    timestamp: post.timestamp,
                    original_payload: post.original_payload.clone(),
                    strategy,
                });
            }
            None => debug!(uri = %post.media_uri, "no image for post"),
        }
    }

    if pairs.is_empty() && !images.is_empty() {
        pairs = fallback_pairs(images, config, now_ms);
        info!(
            posts = pairs.len(),
            images = images.len(),
            "no post matched an image, using fallback posts"
        );
    }

    pairs
}

/// One generic post per image, newest first, at most `fallback_cap`.
pub fn fallback_pairs(images: &[String], config: &ParserConfig, now_ms: i64) -> Vec<MatchedPair> {
    images
        .iter()
        .take(config.fallback_cap)
        .enumerate()
        .map(|(i, path)| MatchedPair {
            image_path: path.clone(),
            caption: format!("{} {}", config.fallback_caption_prefix, i + 1),
            timestamp: Some(now_ms - i as i64 * DAY_MS),
            original_payload: Value::Null,
            strategy: MatchStrategy::Fallback,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    fn post(uri: &str, timestamp: Option<i64>) -> PostInfo {
        PostInfo {
            caption: format!("caption for {}", uri),
            media_uri: uri.to_string(),
            timestamp,
            original_payload: json!({ "uri": uri }),
        }
    }

    fn images(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn run(posts: &[PostInfo], imgs: &[String]) -> Vec<MatchedPair> {
        match_posts(posts, imgs, &ParserConfig::default(), NOW)
    }

    #[test]
    fn exact_filename_match() {
        let imgs = images(&["media/posts/2/other.jpg", "media/posts/1/IMG_1.jpg"]);
        let pairs = run(&[post("media/posts/1/IMG_1.jpg", Some(1000))], &imgs);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].image_path, "media/posts/1/IMG_1.jpg");
        assert_eq!(pairs[0].strategy, MatchStrategy::ExactFilename);
        assert_eq!(pairs[0].timestamp, Some(1000));
        assert_eq!(pairs[0].original_payload, json!({"uri": "media/posts/1/IMG_1.jpg"}));
    }

    #[test]
    fn exact_beats_partial() {
        // "IMG_1.jpg_edit.jpg" contains the URI's last segment, but the
        // exact name appears later in image order and must still win.
        let imgs = images(&["media/posts/a/IMG_1.jpg_edit.jpg", "media/posts/b/IMG_1.jpg"]);
        let pairs = run(&[post("x/IMG_1.jpg", None)], &imgs);
        assert_eq!(pairs[0].image_path, "media/posts/b/IMG_1.jpg");
        assert_eq!(pairs[0].strategy, MatchStrategy::ExactFilename);
    }

    #[test]
    fn partial_match_takes_first_candidate() {
        let imgs = images(&["media/posts/9/zzz.jpg", "media/posts/1/17890_n.jpg", "media/posts/2/17890_b.jpg"]);
        let pairs = run(&[post("https://cdn.example/17890/remote.heic", None)], &imgs);
        assert_eq!(pairs[0].image_path, "media/posts/1/17890_n.jpg");
        assert_eq!(pairs[0].strategy, MatchStrategy::PartialFilename);
    }

    #[test]
    fn duplicate_names_resolve_to_last_path() {
        let imgs = images(&["media/posts/1/a.jpg", "media/posts/2/a.jpg"]);
        let pairs = run(&[post("a.jpg", None)], &imgs);
        assert_eq!(pairs[0].image_path, "media/posts/2/a.jpg");
    }

    #[test]
    fn timestamp_fallback_uses_first_image() {
        let imgs = images(&["media/posts/1/first.jpg", "media/posts/1/second.jpg"]);
        let pairs = run(
            &[post("gone/nothing.png", Some(42)), post("gone/nothing.png", None)],
            &imgs,
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].image_path, "media/posts/1/first.jpg");
        assert_eq!(pairs[0].strategy, MatchStrategy::Timestamp);
    }

    #[test]
    fn unmatched_posts_with_images_trigger_fallback() {
        let imgs = images(&["m/1.jpg", "m/2.jpg", "m/3.jpg"]);
        let pairs = run(&[post("q/nothing.png", None)], &imgs);

        let captions: Vec<_> = pairs.iter().map(|p| p.caption.as_str()).collect();
        assert_eq!(captions, ["Instagram post 1", "Instagram post 2", "Instagram post 3"]);
        let stamps: Vec<_> = pairs.iter().map(|p| p.timestamp.unwrap()).collect();
        assert_eq!(stamps, [NOW, NOW - DAY_MS, NOW - 2 * DAY_MS]);
        assert!(pairs.iter().all(|p| p.strategy == MatchStrategy::Fallback));
        assert!(pairs.iter().all(|p| p.original_payload.is_null()));
    }

    #[test]
    fn fallback_is_capped() {
        let paths: Vec<String> = (0..50).map(|i| format!("media/posts/{:02}.jpg", i)).collect();
        let pairs = run(&[], &paths);
        assert_eq!(pairs.len(), 20);
        for (pair, path) in pairs.iter().zip(&paths) {
            assert_eq!(&pair.image_path, path);
        }
    }

    #[test]
    fn no_images_no_pairs() {
        assert!(run(&[post("a.jpg", Some(1))], &[]).is_empty());
        assert!(run(&[], &[]).is_empty());
    }

    #[test]
    fn one_match_suppresses_fallback() {
        let imgs = images(&["m/a.jpg", "m/b.jpg", "m/c.jpg"]);
        let pairs = run(&[post("z/none.png", None), post("a.jpg", None)], &imgs);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].image_path, "m/a.jpg");
    }

    #[test]
    fn strategy_names() {
        assert_eq!(MatchStrategy::ExactFilename.to_string(), "exact");
        assert_eq!(MatchStrategy::Fallback.to_string(), "fallback");
    }
}
