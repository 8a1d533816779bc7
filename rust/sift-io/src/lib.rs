//! Stream layer for the postings codec.
//!
//! A segment is a handful of named, write-once byte streams. Writers append to a
//! [`StreamSink`] through an [`IndexOutput`], which tracks the file pointer and a
//! running checksum. Readers open a [`StreamSource`] through an [`IndexInput`],
//! a buffered cursor that can be cloned and seeked independently.
//! [`Directory`] maps stream names to sources and sinks.

use std::ops::Range;

pub mod codec_util;
pub mod data;
pub mod directory;
pub mod fs;
pub mod input;
pub mod output;
pub mod utils;

pub use data::{ByteArrayInput, DataInput, DataOutput};
pub use directory::{Directory, MemoryDirectory, segment_file_name};
pub use fs::FsDirectory;
pub use input::IndexInput;
pub use output::IndexOutput;

/// Immutable bytes of a sealed stream, readable at any offset from any thread.
pub trait StreamSource: Send + Sync + 'static {
    /// Length of the stream in bytes. Fixed once the stream is sealed.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bytes in `range`, truncated at the end of the stream.
    fn read_range(&self, range: Range<u64>) -> std::io::Result<Vec<u8>>;

    /// Largest read worth issuing in one call. [`IndexInput`] never buffers more.
    fn max_read_size(&self) -> usize {
        64 * 1024
    }
}

/// Destination of a stream under construction. Nothing written becomes visible
/// to readers until [`commit`](StreamSink::commit) succeeds.
pub trait StreamSink: Send {
    fn append(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Makes the stream durable and visible. Appending afterwards fails.
    fn commit(&mut self) -> std::io::Result<()>;
}

impl StreamSource for Vec<u8> {
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn read_range(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        let end = range.end.min(self.as_slice().len() as u64) as usize;
        let start = (range.start as usize).min(end);
        Ok(self[start..end].to_vec())
    }
}
