#![allow(dead_code)]

use std::io::{Cursor, Write};

use serde_json::Value;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

pub const POSTS_1: &str = "your_instagram_activity/content/posts_1.json";
pub const POSTS_2: &str = "your_instagram_activity/content/posts_2.json";

/// Builds an export archive in memory.
///
/// JSON files are deflated and everything else is stored, which is how
/// export tools tend to write them.
pub struct Export {
    writer: zip::ZipWriter<Cursor<Vec<u8>>>,
}

impl Export {
    pub fn new() -> Self {
        Self {
            writer: zip::ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    pub fn file(mut self, path: &str, data: impl AsRef<[u8]>) -> Self {
        let method = if path.ends_with(".json") {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        let options = SimpleFileOptions::default().compression_method(method);
        self.writer.start_file(path, options).unwrap();
        self.writer.write_all(data.as_ref()).unwrap();
        self
    }

    pub fn json(self, path: &str, value: Value) -> Self {
        self.file(path, value.to_string())
    }

    pub fn build(self) -> Vec<u8> {
        self.writer.finish().unwrap().into_inner()
    }
}
