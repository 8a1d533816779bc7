use std::sync::Arc;

use sift_common::{Error, Result};

use crate::{DataInput, StreamSource, utils::eof_error};

const BUFFER_SIZE: usize = 1024;

/// Buffered, seekable cursor over a shared, immutable [`StreamSource`].
///
/// Cloning produces an independent cursor at the same file pointer that shares the
/// underlying source but not the read buffer, so a clone never observes another
/// cursor's reads and costs no I/O until it is first read.
pub struct IndexInput {
    name: Arc<str>,
    source: Arc<dyn StreamSource>,
    length: u64,
    buffer_size: usize,
    buffer: Vec<u8>,
    buffer_start: u64,
    buffer_pos: usize,
}

impl IndexInput {
    /// Opens a cursor positioned at the start of `source`.
    pub fn open(name: impl Into<Arc<str>>, source: Arc<dyn StreamSource>) -> Result<IndexInput> {
        let name = name.into();
        let length = source.len();
        let buffer_size = BUFFER_SIZE.min(source.max_read_size()).max(1);
        Ok(IndexInput {
            name,
            source,
            length,
            buffer_size,
            buffer: Vec::new(),
            buffer_start: 0,
            buffer_pos: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total length of the underlying stream in bytes.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Current read position.
    pub fn file_pointer(&self) -> u64 {
        self.buffer_start + self.buffer_pos as u64
    }

    /// Repositions the cursor. Seeking to exactly `len()` is allowed; reading
    /// from there fails.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.length {
            return Err(Error::io(
                self.name.as_ref(),
                eof_error(&self.name, pos, self.length),
            ));
        }
        let buffer_end = self.buffer_start + self.buffer.len() as u64;
        if pos >= self.buffer_start && pos < buffer_end {
            self.buffer_pos = (pos - self.buffer_start) as usize;
        } else {
            self.buffer.clear();
            self.buffer_start = pos;
            self.buffer_pos = 0;
        }
        Ok(())
    }

    /// Moves the cursor forward by `count` bytes without reading them.
    pub fn skip_bytes(&mut self, count: u64) -> Result<()> {
        self.seek(self.file_pointer() + count)
    }

    fn refill(&mut self) -> Result<()> {
        let start = self.file_pointer();
        if start >= self.length {
            return Err(Error::io(
                self.name.as_ref(),
                eof_error(&self.name, start, self.length),
            ));
        }
        let end = (start + self.buffer_size as u64).min(self.length);
        let bytes = self
            .source
            .read_range(start..end)
            .map_err(|e| Error::io(self.name.as_ref(), e))?;
        if bytes.is_empty() {
            return Err(Error::io(
                self.name.as_ref(),
                eof_error(&self.name, start, self.length),
            ));
        }
        self.buffer = bytes;
        self.buffer_start = start;
        self.buffer_pos = 0;
        Ok(())
    }
}

impl Clone for IndexInput {
    fn clone(&self) -> IndexInput {
        IndexInput {
            name: self.name.clone(),
            source: self.source.clone(),
            length: self.length,
            buffer_size: self.buffer_size,
            buffer: Vec::new(),
            buffer_start: self.file_pointer(),
            buffer_pos: 0,
        }
    }
}

impl std::fmt::Debug for IndexInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexInput")
            .field("name", &self.name)
            .field("length", &self.length)
            .field("file_pointer", &self.file_pointer())
            .finish()
    }
}

impl DataInput for IndexInput {
    fn read_byte(&mut self) -> Result<u8> {
        if self.buffer_pos >= self.buffer.len() {
            self.refill()?;
        }
        let b = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, mut dst: &mut [u8]) -> Result<()> {
        while !dst.is_empty() {
            if self.buffer_pos >= self.buffer.len() {
                self.refill()?;
            }
            let n = dst.len().min(self.buffer.len() - self.buffer_pos);
            dst[..n].copy_from_slice(&self.buffer[self.buffer_pos..self.buffer_pos + n]);
            self.buffer_pos += n;
            dst = &mut dst[n..];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{DataInput, DataOutput, IndexInput};

    fn make_input(len: usize) -> IndexInput {
        let data = (0..len).map(|i| (i % 251) as u8).collect::<Vec<_>>();
        IndexInput::open("test", Arc::new(data)).unwrap()
    }

    #[test]
    fn test_sequential_reads_cross_buffers() {
        let mut input = make_input(5000);
        let mut buf = vec![0u8; 3000];
        input.read_bytes(&mut buf).unwrap();
        assert!(buf.iter().enumerate().all(|(i, &b)| b == (i % 251) as u8));
        assert_eq!(input.file_pointer(), 3000);
        assert_eq!(input.read_byte().unwrap(), (3000 % 251) as u8);
    }

    #[test]
    fn test_seek_and_clone_are_independent() {
        let mut input = make_input(5000);
        input.seek(100).unwrap();
        assert_eq!(input.read_byte().unwrap(), 100);

        let mut clone = input.clone();
        assert_eq!(clone.file_pointer(), 101);
        clone.seek(4000).unwrap();
        assert_eq!(clone.read_byte().unwrap(), (4000 % 251) as u8);

        assert_eq!(input.file_pointer(), 101);
        assert_eq!(input.read_byte().unwrap(), 101);

        input.seek(50).unwrap();
        assert_eq!(input.read_byte().unwrap(), 50);
        input.skip_bytes(9).unwrap();
        assert_eq!(input.read_byte().unwrap(), 60);
    }

    #[test]
    fn test_read_past_eof() {
        let mut input = make_input(10);
        input.seek(10).unwrap();
        assert!(input.read_byte().is_err());
        assert!(input.seek(11).is_err());

        let mut input = make_input(10);
        let mut buf = [0u8; 11];
        assert!(input.read_bytes(&mut buf).is_err());
    }

    #[test]
    fn test_vints_through_cursor() {
        let mut data = Vec::new();
        for i in 0..2000u32 {
            data.write_vint(i * 977).unwrap();
        }
        let mut input = IndexInput::open("vints", Arc::new(data)).unwrap();
        for i in 0..2000u32 {
            assert_eq!(input.read_vint().unwrap(), i * 977);
        }
    }
}
