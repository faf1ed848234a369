use super::ReadAt;
use anyhow::{Result, bail};
use async_trait::async_trait;
use bytes::Bytes;

/// Random access over an archive that already lives in memory.
///
/// Reads never come up short: a request that runs past the end of the
/// buffer is an error, which is how truncated archives surface.
pub struct MemoryReader {
    data: Bytes,
}

impl MemoryReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let end = offset.checked_add(buf.len() as u64);
        match end {
            Some(end) if end <= self.data.len() as u64 => {
                let start = offset as usize;
                buf.copy_from_slice(&self.data[start..end as usize]);
                Ok(buf.len())
            }
            _ => bail!(
                "Read of {} bytes at offset {} exceeds archive size {}",
                buf.len(),
                offset,
                self.data.len()
            ),
        }
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_inside_buffer() {
        let reader = MemoryReader::new(b"PK\x03\x04hello".to_vec());
        let mut buf = [0u8; 5];
        let n = reader.read_at(4, &mut buf).await.unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(reader.size(), 9);
    }

    #[tokio::test]
    async fn read_past_end_fails() {
        let reader = MemoryReader::new(vec![0u8; 8]);
        let mut buf = [0u8; 4];
        assert!(reader.read_at(6, &mut buf).await.is_err());
        assert!(reader.read_at(u64::MAX, &mut buf).await.is_err());
    }

    #[tokio::test]
    async fn empty_read_is_ok() {
        let reader = MemoryReader::new(Vec::new());
        let mut buf = [0u8; 0];
        assert_eq!(reader.read_at(0, &mut buf).await.unwrap(), 0);
    }
}
