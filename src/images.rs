//! Image discovery under the media root.

use crate::archive::{ArchiveTable, is_hidden_path};
use crate::config::ParserConfig;

/// Paths of recognized images under `media_root`, in table order.
///
/// `__MACOSX` copies and dot-files are never images, even when their
/// extension says so.
pub fn locate(table: &ArchiveTable, media_root: &str, config: &ParserConfig) -> Vec<String> {
    table
        .paths()
        .filter(|path| path.starts_with(media_root) && !is_hidden_path(path))
        .filter(|path| extension(path).is_some_and(|ext| config.is_image_extension(ext)))
        .map(str::to_string)
        .collect()
}

/// Text after the last '.', if any.
pub fn extension(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(_, ext)| ext)
}

/// MIME type guessed from the file extension.
pub fn mime_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_images_under_root_only() {
        let mut table = ArchiveTable::new();
        for path in [
            "media/posts/1/a.JPG",
            "media/posts/1/clip.mp4",
            "media/stories/b.png",
            "media/posts/2/c.webp",
            "other/media/posts/d.jpg",
            "media/posts/README",
        ] {
            table.insert(path, Vec::new());
        }

        let images = locate(&table, "media/", &ParserConfig::default());
        assert_eq!(
            images,
            ["media/posts/1/a.JPG", "media/stories/b.png", "media/posts/2/c.webp"]
        );
    }

    #[test]
    fn extension_and_mime() {
        assert_eq!(extension("a/b.c/file.jpeg"), Some("jpeg"));
        assert_eq!(extension("noext"), None);
        assert_eq!(mime_type("x/IMG_1.JPG"), "image/jpeg");
        assert_eq!(mime_type("x/IMG_1.webp"), "image/webp");
        assert_eq!(mime_type("x/scan.tif"), "image/tiff");
        assert_eq!(mime_type("x/unknown"), "application/octet-stream");
    }

    #[test]
    fn skips_finder_debris() {
        let mut table = ArchiveTable::new();
        for path in [
            "__MACOSX/media/posts/1/._IMG_1.jpg",
            "media/posts/1/._IMG_1.jpg",
            "media/posts/1/IMG_1.jpg",
        ] {
            table.insert(path, Vec::new());
        }

        assert_eq!(locate(&table, "media/", &ParserConfig::default()), ["media/posts/1/IMG_1.jpg"]);
        assert_eq!(locate(&table, "", &ParserConfig::default()), ["media/posts/1/IMG_1.jpg"]);
    }
}
