//! Low-level ZIP archive parser.
//!
//! Reads the End of Central Directory from the tail of the archive, follows
//! it (through the ZIP64 records when the classic fields are saturated) to
//! the Central Directory, and turns every header there into a
//! [`ZipFileEntry`]. Every length read from the archive is checked against
//! the archive size before anything is allocated for it, so a corrupt
//! export fails with an error instead of a panic or a runaway allocation.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP64 extended information extra field id
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Low-level ZIP file parser, generic over its data source.
///
/// Normally used through [`ZipExtractor`](super::ZipExtractor).
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    /// Wrap a data source.
    ///
    /// # Arguments
    ///
    /// * `reader` - The archive bytes behind a [`ReadAt`]
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record together with its offset in the archive. Archives
    /// with a trailing comment are handled by scanning backwards for the
    /// signature and checking that the comment length lines up with the
    /// end of the data.
    ///
    /// # Returns
    ///
    /// The parsed record and the offset it starts at.
    ///
    /// # Errors
    ///
    /// Returns an error if no signature with a consistent comment length
    /// exists in the last 64 KiB of the archive.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        if self.size < EndOfCentralDirectory::SIZE as u64 {
            bail!("Not a valid ZIP file (only {} bytes)", self.size);
        }

        // Common case: no comment, EOCD is the last 22 bytes
        let offset = self.size - EndOfCentralDirectory::SIZE as u64;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_at(offset, &mut buf).await?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
            let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
            return Ok((eocd, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_at(search_start, &mut buf).await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, search_start + i as u64));
            }
        }

        bail!("Not a valid ZIP file (no End of Central Directory)")
    }

    /// Read the ZIP64 End of Central Directory via the locator that sits
    /// immediately before the classic EOCD.
    ///
    /// # Arguments
    ///
    /// * `eocd_offset` - Where the classic EOCD starts
    ///
    /// # Errors
    ///
    /// Returns an error if the locator is missing or points outside the
    /// archive, or if the record it points at has a bad signature.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .context("ZIP64 locator would start before the archive")?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader.read_at(locator_offset, &mut locator_buf).await?;
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// List every entry (files and directories) in the Central Directory.
    ///
    /// # Returns
    ///
    /// Entries in Central Directory order.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory lies outside the archive, claims
    /// more entries than fit in its size, or holds a malformed header.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        match cd_offset.checked_add(cd_size) {
            Some(end) if end <= self.size => {}
            _ => bail!(
                "Central Directory ({} bytes at {}) lies outside the archive",
                cd_size,
                cd_offset
            ),
        }
        if total_entries > cd_size / CDFH_MIN_SIZE as u64 {
            bail!(
                "Central Directory of {} bytes cannot hold {} entries",
                cd_size,
                total_entries
            );
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_at(cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());
        for index in 0..total_entries {
            let entry = parse_cdfh(&mut cursor)
                .with_context(|| format!("Central Directory entry {} is malformed", index))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Offset of the first byte of an entry's (compressed) data.
    ///
    /// The Local File Header repeats the name and carries its own extra
    /// field, whose length may differ from the Central Directory copy, so
    /// the offset has to be computed from the local header itself.
    ///
    /// # Arguments
    ///
    /// * `entry` - An entry from [`list_files()`](Self::list_files)
    ///
    /// # Errors
    ///
    /// Returns an error if the Local File Header is unreadable or has a
    /// bad signature.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader.read_at(entry.lfh_offset, &mut lfh_buf).await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header for {}", entry.file_name);
        }

        let mut cursor = Cursor::new(&lfh_buf[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// The underlying data source.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Parse one Central Directory File Header.
///
/// # Arguments
///
/// * `cursor` - Positioned at the header's signature; left just past the
///   header's comment on success
///
/// # Errors
///
/// Returns an error on a bad signature or a header that runs past the end
/// of the directory.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    // Non-UTF8 names still need a key; lossy is good enough for matching
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();
    let is_directory = file_name.ends_with('/') || file_name.ends_with('\\');

    let extra_field_end = cursor.position() + extra_field_length as u64;
    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = cursor.position() + field_size;

        if header_id == ZIP64_EXTRA_ID {
            // Values appear only for header fields saturated at 0xFFFFFFFF,
            // always in this order
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }
        cursor.set_position(field_end);
    }

    cursor.set_position(extra_field_end + file_comment_length as u64);
    if cursor.position() > cursor.get_ref().len() as u64 {
        bail!("Central Directory File Header runs past the directory");
    }

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        flags,
        is_directory,
    })
}
