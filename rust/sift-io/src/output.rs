use sift_common::{Error, Result};
use xxhash_rust::xxh3::Xxh3;

use crate::{DataOutput, StreamSink};

const BUFFER_SIZE: usize = 8 * 1024;

/// Append-only output stream with a monotonically increasing file pointer and a
/// running xxh3 checksum over every byte written so far.
pub struct IndexOutput {
    name: String,
    sink: Box<dyn StreamSink>,
    buffer: Vec<u8>,
    flushed: u64,
    hasher: Xxh3,
}

impl IndexOutput {
    pub fn new(name: impl Into<String>, sink: Box<dyn StreamSink>) -> IndexOutput {
        IndexOutput {
            name: name.into(),
            sink,
            buffer: Vec::with_capacity(BUFFER_SIZE),
            flushed: 0,
            hasher: Xxh3::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bytes written so far.
    pub fn file_pointer(&self) -> u64 {
        self.flushed + self.buffer.len() as u64
    }

    /// Checksum of all bytes written so far.
    pub fn checksum(&self) -> u64 {
        self.hasher.digest()
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.sink
                .append(&self.buffer)
                .map_err(|e| Error::io(self.name.as_str(), e))?;
            self.flushed += self.buffer.len() as u64;
            self.buffer.clear();
        }
        Ok(())
    }

    /// Flushes the remaining bytes and commits the sink. Returns the
    /// final length of the stream.
    pub fn close(mut self) -> Result<u64> {
        self.flush_buffer()?;
        self.sink
            .commit()
            .map_err(|e| Error::io(self.name.as_str(), e))?;
        Ok(self.flushed)
    }
}

impl DataOutput for IndexOutput {
    fn write_byte(&mut self, b: u8) -> Result<()> {
        self.write_bytes(&[b])
    }

    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.hasher.update(src);
        if self.buffer.len() + src.len() > BUFFER_SIZE {
            self.flush_buffer()?;
        }
        if src.len() >= BUFFER_SIZE {
            self.sink
                .append(src)
                .map_err(|e| Error::io(self.name.as_str(), e))?;
            self.flushed += src.len() as u64;
        } else {
            self.buffer.extend_from_slice(src);
        }
        Ok(())
    }
}

impl std::fmt::Debug for IndexOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexOutput")
            .field("name", &self.name)
            .field("file_pointer", &self.file_pointer())
            .finish()
    }
}
