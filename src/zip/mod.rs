//! ZIP archive reading.
//!
//! - [`structures`]: records of the ZIP format (EOCD, ZIP64 records, entries)
//! - [`parser`]: locating and decoding the Central Directory
//! - [`extractor`]: pulling entry data out and decompressing it
//!
//! The Central Directory is read first, from the end of the archive, so the
//! complete entry list is known before any file data is touched.
//!
//! ## Supported
//!
//! - ZIP64 archives (exports routinely exceed 4 GB)
//! - STORED and DEFLATE entries, verified against their CRC-32
//!
//! ## Not supported
//!
//! - Encrypted entries
//! - Multi-disk archives
//! - BZIP2, LZMA and other compression methods

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
