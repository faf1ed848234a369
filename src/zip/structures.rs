use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use anyhow::{Result, bail};

/// Compression methods an export archive may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    disk_entries: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        let mut cursor = Cursor::new(&data[4..]);
        // Multi-disk archives are not produced by export tools; the disk
        // numbers are read past and ignored.
        let _disk_number = cursor.read_u16::<LittleEndian>()?;
        let _disk_with_cd = cursor.read_u16::<LittleEndian>()?;

        Ok(Self {
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub eocd64_offset: u64,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 locator");
        }

        let mut cursor = Cursor::new(&data[4..]);
        let _disk_with_eocd64 = cursor.read_u32::<LittleEndian>()?;

        Ok(Self {
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 End of Central Directory");
        }

        // Skip record size, versions, disk numbers and per-disk entry count
        let mut cursor = Cursor::new(&data[4 + 8 + 2 + 2 + 4 + 4 + 8..]);

        Ok(Self {
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General purpose flag: entry is encrypted
const FLAG_ENCRYPTED: u16 = 0x0001;

/// One entry of the central directory
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub flags: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eocd_bytes(total: u16, cd_size: u32, cd_offset: u32) -> Vec<u8> {
        let mut buf = EndOfCentralDirectory::SIGNATURE.to_vec();
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&total.to_le_bytes());
        buf.extend_from_slice(&total.to_le_bytes());
        buf.extend_from_slice(&cd_size.to_le_bytes());
        buf.extend_from_slice(&cd_offset.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf
    }

    #[test]
    fn parses_plain_eocd() {
        let eocd = EndOfCentralDirectory::from_bytes(&eocd_bytes(3, 150, 900)).unwrap();
        assert_eq!(eocd.total_entries, 3);
        assert_eq!(eocd.cd_size, 150);
        assert_eq!(eocd.cd_offset, 900);
        assert!(!eocd.is_zip64());
    }

    #[test]
    fn saturated_fields_mean_zip64() {
        let eocd = EndOfCentralDirectory::from_bytes(&eocd_bytes(0xFFFF, 10, 0xFFFFFFFF)).unwrap();
        assert!(eocd.is_zip64());
    }

    #[test]
    fn rejects_bad_signature_and_short_input() {
        let mut bytes = eocd_bytes(1, 1, 1);
        bytes[3] = 0x07;
        assert!(EndOfCentralDirectory::from_bytes(&bytes).is_err());
        assert!(EndOfCentralDirectory::from_bytes(&bytes[..10]).is_err());
    }

    #[test]
    fn parses_zip64_eocd_counts() {
        let mut buf = Zip64EOCD::SIGNATURE.to_vec();
        buf.extend_from_slice(&44u64.to_le_bytes());
        buf.extend_from_slice(&45u16.to_le_bytes());
        buf.extend_from_slice(&45u16.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&7u64.to_le_bytes());
        buf.extend_from_slice(&7u64.to_le_bytes());
        buf.extend_from_slice(&500u64.to_le_bytes());
        buf.extend_from_slice(&(5u64 << 32).to_le_bytes());

        let eocd64 = Zip64EOCD::from_bytes(&buf).unwrap();
        assert_eq!(eocd64.total_entries, 7);
        assert_eq!(eocd64.cd_size, 500);
        assert_eq!(eocd64.cd_offset, 5u64 << 32);
    }

    #[test]
    fn encryption_flag() {
        let mut entry = ZipFileEntry {
            file_name: "a.json".to_string(),
            compression_method: CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            flags: 0x0008,
            is_directory: false,
        };
        assert!(!entry.is_encrypted());
        entry.flags |= 0x0001;
        assert!(entry.is_encrypted());
    }
}
