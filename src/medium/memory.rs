//! In-memory medium

use bytes::BytesMut;

use crate::error::Result;

use super::{check_range, Medium};

/// Growable in-memory buffer.
///
/// Intended for tests and embedding. Contents are lost on drop.
#[derive(Debug, Default, Clone)]
pub struct MemoryMedium {
    data: BytesMut,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing log bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: BytesMut::from(bytes),
        }
    }

    /// Everything written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Medium for MemoryMedium {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    fn read_range(&mut self, start: u64, end: u64) -> Result<Vec<u8>> {
        check_range(start, end, self.data.len() as u64)?;
        Ok(self.data[start as usize..end as usize].to_vec())
    }

    fn len(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn truncate(&mut self, len: u64) -> Result<()> {
        check_range(0, len, self.data.len() as u64)?;
        self.data.truncate(len as usize);
        Ok(())
    }
}
