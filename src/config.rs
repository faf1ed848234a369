//! Parser configuration.
//!
//! Every heuristic the pipeline applies to an export (which JSON fields to
//! probe, which files to read first, which extensions count as images) is
//! a value here rather than a constant in the code. Overrides can be given
//! as partial JSON; missing keys keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Fields probed, in order, for a post caption
    pub caption_fields: Vec<String>,
    /// Fields probed, in order, for the media reference
    pub media_uri_fields: Vec<String>,
    /// Fields probed, in order, for the creation time
    pub timestamp_fields: Vec<String>,
    /// Keys of a top-level object that may hold the item array
    pub item_container_keys: Vec<String>,
    /// Keys of an item that may hold its nested media array
    pub nested_media_keys: Vec<String>,
    /// Recognized image extensions, lowercase, without the dot
    pub image_extensions: Vec<String>,
    /// Metadata file names read first, in this order
    pub metadata_filename_priority: Vec<String>,
    /// Maximum number of synthetic posts produced in fallback mode
    pub fallback_cap: usize,
    /// Caption used when an item has none
    pub default_caption: String,
    /// Fallback posts are captioned "<prefix> <n>"
    pub fallback_caption_prefix: String,
    /// Path marker for the media tree
    pub media_marker: String,
    /// Path marker for the posts folder inside the media tree
    pub posts_marker: String,
    /// Path segment naming the metadata tree
    pub activity_marker: String,
    /// Undo Latin-1 escaping of UTF-8 text in captions
    pub repair_text_encoding: bool,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            caption_fields: strings(&["title", "caption", "description", "text", "content"]),
            media_uri_fields: strings(&["uri", "media_uri", "file_path", "path", "url"]),
            timestamp_fields: strings(&[
                "creation_timestamp",
                "timestamp",
                "created_time",
                "date",
                "time",
            ]),
            item_container_keys: strings(&["media", "posts", "data", "items"]),
            nested_media_keys: strings(&["media"]),
            image_extensions: strings(&["jpg", "jpeg", "png", "bmp", "webp"]),
            metadata_filename_priority: strings(&[
                "posts_1.json",
                "posts_2.json",
                "media.json",
                "saved_posts.json",
            ]),
            fallback_cap: 20,
            default_caption: "Instagram post".to_string(),
            fallback_caption_prefix: "Instagram post".to_string(),
            media_marker: "media/".to_string(),
            posts_marker: "posts/".to_string(),
            activity_marker: "your_instagram_activity".to_string(),
            repair_text_encoding: true,
        }
    }
}

impl ParserConfig {
    /// Build a configuration from a (possibly partial) JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.image_extensions = config
            .image_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Ok(config)
    }

    /// True when `ext` (without the dot, any case) is a recognized image extension.
    pub fn is_image_extension(&self, ext: &str) -> bool {
        self.image_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }

    /// Sort key of a metadata file name; unlisted names sort last.
    pub fn metadata_priority(&self, file_name: &str) -> usize {
        self.metadata_filename_priority
            .iter()
            .position(|name| name == file_name)
            .unwrap_or(self.metadata_filename_priority.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.fallback_cap, 20);
        assert_eq!(config.caption_fields[0], "title");
        assert_eq!(config.media_uri_fields[0], "uri");
        assert_eq!(config.timestamp_fields[0], "creation_timestamp");
        assert!(config.is_image_extension("JPG"));
        assert!(config.is_image_extension("webp"));
        assert!(!config.is_image_extension("mp4"));
    }

    #[test]
    fn partial_json_override_keeps_defaults() {
        let config =
            ParserConfig::from_json(r#"{"fallback_cap": 5, "image_extensions": [".HEIC", "jpg"]}"#)
                .unwrap();
        assert_eq!(config.fallback_cap, 5);
        assert!(config.is_image_extension("heic"));
        assert!(!config.is_image_extension("png"));
        assert_eq!(config.default_caption, "Instagram post");
    }

    #[test]
    fn invalid_json_is_config_error() {
        let err = ParserConfig::from_json("{ fallback_cap: }").unwrap_err();
        assert!(err.to_string().starts_with("invalid parser configuration"));
    }

    #[test]
    fn priority_order() {
        let config = ParserConfig::default();
        assert_eq!(config.metadata_priority("posts_1.json"), 0);
        assert_eq!(config.metadata_priority("saved_posts.json"), 3);
        assert_eq!(config.metadata_priority("liked_posts.json"), 4);
    }
}
