//! Log entry definitions
//!
//! Defines the on-disk record and its encoding.

use std::io::{self, Read};

use bytes::{BufMut, BytesMut};

use crate::error::{CaskError, Result};

/// Record header size: KeyLen (4) + ValLen (4) = 8 bytes
pub const HEADER_SIZE: u64 = 8;

/// A single (key, value) record in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Entry {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Total number of bytes this entry occupies in the log
    pub fn encoded_len(&self) -> u64 {
        HEADER_SIZE + self.key.len() as u64 + self.value.len() as u64
    }

    /// Absolute offset of the value bytes for a record written at `record_start`
    pub fn value_offset(&self, record_start: u64) -> u64 {
        value_offset(record_start, self.key.len())
    }

    /// Encode to `[key_len][value_len][key][value]`
    pub fn encode(&self) -> Result<BytesMut> {
        encode(&self.key, &self.value)
    }

    /// Decode the next entry from `reader`
    ///
    /// `offset` is the position of the record in the log and is only used
    /// for error context.
    ///
    /// Returns:
    /// - `Ok(Some(entry))` — a complete record
    /// - `Ok(None)` — the stream ended cleanly on a record boundary
    /// - `Err(CorruptRecord)` — the stream ended inside a record
    /// - `Err(Io)` — the stream itself failed
    pub fn decode<R: Read>(reader: &mut R, offset: u64) -> Result<Option<Self>> {
        let mut key_len = [0u8; 4];
        match fill(reader, &mut key_len)? {
            0 => return Ok(None),
            4 => {}
            n => {
                return Err(CaskError::corrupt(
                    offset,
                    format!("truncated key length: {} of 4 bytes", n),
                ))
            }
        }

        let mut value_len = [0u8; 4];
        let n = fill(reader, &mut value_len)?;
        if n < 4 {
            return Err(CaskError::corrupt(
                offset,
                format!("truncated value length: {} of 4 bytes", n),
            ));
        }

        let key = read_field(reader, u32::from_be_bytes(key_len), offset, "key")?;
        let value = read_field(reader, u32::from_be_bytes(value_len), offset, "value")?;

        Ok(Some(Self { key, value }))
    }
}

/// Encode a record straight from borrowed key and value bytes
///
/// Fails with `EntryTooLarge` if either length does not fit in a `u32`.
pub fn encode(key: &[u8], value: &[u8]) -> Result<BytesMut> {
    let key_len = length_field("key", key.len())?;
    let value_len = length_field("value", value.len())?;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE as usize + key.len() + value.len());
    buf.put_u32(key_len);
    buf.put_u32(value_len);
    buf.put_slice(key);
    buf.put_slice(value);

    Ok(buf)
}

/// Value bytes start right after the header and the key
pub(crate) fn value_offset(record_start: u64, key_len: usize) -> u64 {
    record_start + HEADER_SIZE + key_len as u64
}

fn length_field(field: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| CaskError::EntryTooLarge { field, len })
}

/// Read until `buf` is full or the stream ends, returning the bytes read
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Read exactly `len` bytes of a key or value.
///
/// Grows the buffer as bytes arrive instead of allocating `len` up front, so
/// a damaged header cannot force a 4 GiB allocation.
fn read_field<R: Read>(reader: &mut R, len: u32, offset: u64, field: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.by_ref().take(u64::from(len)).read_to_end(&mut buf)?;

    if buf.len() < len as usize {
        return Err(CaskError::corrupt(
            offset,
            format!(
                "truncated {}: expected {} bytes, found {}",
                field,
                len,
                buf.len()
            ),
        ));
    }

    Ok(buf)
}
