//! In-memory ZIP archives for unit tests.

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

pub fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

pub fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Builder for a ZIP archive written into a `Vec<u8>`.
///
/// Entries are written in call order; `options` applies to every entry
/// added after it.
pub struct ZipFixture {
    writer: zip::ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl ZipFixture {
    pub fn new() -> Self {
        Self {
            writer: zip::ZipWriter::new(Cursor::new(Vec::new())),
            options: deflated(),
        }
    }

    pub fn options(mut self, options: SimpleFileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        self.writer.start_file(name, self.options.clone()).unwrap();
        self.writer.write_all(data).unwrap();
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.writer.add_directory(name, self.options.clone()).unwrap();
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.writer.set_comment(comment);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.writer.finish().unwrap().into_inner()
    }
}
