use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;
use tokio::task;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Extract and decompress one entry into memory.
    ///
    /// Inflating and checksumming run on tokio's blocking pool, so a large
    /// entry never stalls other tasks on the calling runtime.
    ///
    /// # Arguments
    ///
    /// * `entry` - An entry returned by [`list_files()`](Self::list_files)
    ///
    /// # Returns
    ///
    /// The uncompressed file contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is encrypted, uses an unsupported
    /// compression method, points outside the archive, or does not match
    /// the size and CRC-32 recorded in the Central Directory.
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("{} is encrypted", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        match data_offset.checked_add(entry.compressed_size) {
            Some(end) if end <= self.parser.size() => {}
            _ => bail!(
                "{} claims {} bytes of data past the end of the archive",
                entry.file_name,
                entry.compressed_size
            ),
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser.reader().read_at(data_offset, &mut raw).await?;

        let entry = entry.clone();
        task::spawn_blocking(move || decode(&entry, raw))
            .await
            .context("Decompression task failed")?
    }
}

/// Decompress the raw bytes of `entry` and verify them.
///
/// # Arguments
///
/// * `entry` - The Central Directory entry the bytes belong to
/// * `raw` - The entry's data exactly as stored in the archive
///
/// # Errors
///
/// Returns an error for unsupported methods, corrupt DEFLATE streams, and
/// size or CRC-32 mismatches.
fn decode(entry: &ZipFileEntry, raw: Vec<u8>) -> Result<Vec<u8>> {
    let data = match entry.compression_method {
        CompressionMethod::Stored => raw,
        CompressionMethod::Deflate => {
            let mut out = Vec::new();
            // Bound the output so a lying size field cannot balloon memory
            DeflateDecoder::new(raw.as_slice())
                .take(entry.uncompressed_size.saturating_add(1))
                .read_to_end(&mut out)
                .with_context(|| format!("Failed to inflate {}", entry.file_name))?;
            out
        }
        CompressionMethod::Unknown(method) => bail!(
            "Unsupported compression method {} for {}",
            method,
            entry.file_name
        ),
    };

    if data.len() as u64 != entry.uncompressed_size {
        bail!(
            "{} decompressed to {} bytes, expected {}",
            entry.file_name,
            data.len(),
            entry.uncompressed_size
        );
    }

    let mut crc = Crc::new();
    crc.update(&data);
    if crc.sum() != entry.crc32 {
        bail!(
            "CRC mismatch for {} (got {:08x}, expected {:08x})",
            entry.file_name,
            crc.sum(),
            entry.crc32
        );
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::test_support::{ZipFixture, stored};

    fn extractor(bytes: Vec<u8>) -> ZipExtractor<MemoryReader> {
        ZipExtractor::new(Arc::new(MemoryReader::new(bytes)))
    }

    #[tokio::test]
    async fn extracts_stored_and_deflated() {
        let text = "caption ".repeat(200);
        let bytes = ZipFixture::new()
            .file("deflated.json", text.as_bytes())
            .options(stored())
            .file("stored.jpg", b"\xFF\xD8\xFF\xE0")
            .build();

        let ex = extractor(bytes);
        let entries = ex.list_files().await.unwrap();
        assert_eq!(entries[0].compression_method, CompressionMethod::Deflate);
        assert_eq!(entries[1].compression_method, CompressionMethod::Stored);

        assert_eq!(ex.extract_to_memory(&entries[0]).await.unwrap(), text.as_bytes());
        assert_eq!(
            ex.extract_to_memory(&entries[1]).await.unwrap(),
            b"\xFF\xD8\xFF\xE0"
        );
    }

    #[tokio::test]
    async fn detects_corrupted_payload() {
        let mut bytes = ZipFixture::new()
            .options(stored())
            .file("a.txt", b"aaaaaaaa")
            .build();
        let pos = bytes
            .windows(8)
            .position(|w| w == b"aaaaaaaa")
            .unwrap();
        bytes[pos] = b'b';

        let ex = extractor(bytes);
        let entries = ex.list_files().await.unwrap();
        let err = ex.extract_to_memory(&entries[0]).await.unwrap_err();
        assert!(err.to_string().contains("CRC mismatch"));
    }

    #[tokio::test]
    async fn rejects_encrypted_and_unknown_methods() {
        let bytes = ZipFixture::new().options(stored()).file("a.txt", b"a").build();
        let ex = extractor(bytes);
        let entries = ex.list_files().await.unwrap();

        let mut encrypted = entries[0].clone();
        encrypted.flags |= 1;
        assert!(ex.extract_to_memory(&encrypted).await.is_err());

        let mut bzip = entries[0].clone();
        bzip.compression_method = CompressionMethod::Unknown(12);
        let err = ex.extract_to_memory(&bzip).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported compression method 12"));
    }
}
