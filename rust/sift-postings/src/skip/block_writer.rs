use sift_common::Result;
use sift_io::{DataOutput, IndexOutput};

use super::multi_level_writer::{MultiLevelSkipListWriter, SkipDataWriter};
use crate::format::{BLOCK_SIZE, FieldCaps, SKIP_MULTIPLIER};

/// Stream positions at the start of a document block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipPoint {
    /// Last document of the previous block.
    pub doc: u32,
    pub doc_pointer: u64,
    pub pos_pointer: u64,
    pub pay_pointer: u64,
    /// Positions of the block's documents already buffered (not yet flushed)
    /// in the position block starting at `pos_pointer`.
    pub pos_buffer_upto: u32,
    /// Payload bytes already buffered for those positions.
    pub payload_byte_upto: u32,
}

/// Per-level state: every entry is stored as a delta against the previous entry
/// of the same level.
#[derive(Debug)]
struct EntryEncoder {
    caps: FieldCaps,
    last: Vec<SkipPoint>,
    current: SkipPoint,
}

impl SkipDataWriter for EntryEncoder {
    fn write_skip_data(&mut self, level: usize, buffer: &mut Vec<u8>) -> Result<()> {
        let cur = self.current;
        let last = &mut self.last[level];
        buffer.write_vint(cur.doc - last.doc)?;
        buffer.write_vlong(cur.doc_pointer - last.doc_pointer)?;
        if self.caps.positions {
            buffer.write_vlong(cur.pos_pointer - last.pos_pointer)?;
            buffer.write_vint(cur.pos_buffer_upto)?;
            if self.caps.payloads {
                buffer.write_vint(cur.payload_byte_upto)?;
            }
            if self.caps.offsets || self.caps.payloads {
                buffer.write_vlong(cur.pay_pointer - last.pay_pointer)?;
            }
        }
        *last = cur;
        Ok(())
    }
}

/// Skip list writer for block postings: one entry per full document block.
#[derive(Debug)]
pub struct SkipWriter {
    inner: MultiLevelSkipListWriter,
    encoder: EntryEncoder,
}

impl SkipWriter {
    /// Creates a writer for a segment of `segment_doc_count` documents.
    pub fn new(max_skip_levels: usize, segment_doc_count: u32) -> SkipWriter {
        let inner = MultiLevelSkipListWriter::new(
            BLOCK_SIZE as u32,
            SKIP_MULTIPLIER,
            max_skip_levels,
            segment_doc_count,
        );
        let levels = inner.number_of_skip_levels();
        SkipWriter {
            inner,
            encoder: EntryEncoder {
                caps: FieldCaps::default(),
                last: vec![SkipPoint::default(); levels],
                current: SkipPoint::default(),
            },
        }
    }

    pub(crate) fn set_field(&mut self, caps: FieldCaps) {
        self.encoder.caps = caps;
    }

    /// Starts the skip list of a new term whose postings begin at the given
    /// stream positions.
    pub fn reset_skip(&mut self, doc_pointer: u64, pos_pointer: u64, pay_pointer: u64) {
        self.inner.reset();
        let start = SkipPoint {
            doc_pointer,
            pos_pointer,
            pay_pointer,
            ..Default::default()
        };
        self.encoder.last.fill(start);
    }

    /// Records a skip point after `doc_count` documents of the term.
    pub fn buffer_skip(&mut self, point: SkipPoint, doc_count: u32) -> Result<()> {
        self.encoder.current = point;
        self.inner.buffer_skip(doc_count, &mut self.encoder)
    }

    /// Appends the skip list to `doc_out` and returns the offset it starts at.
    pub fn write_skip(&self, doc_out: &mut IndexOutput) -> Result<u64> {
        let skip_pointer = doc_out.file_pointer();
        self.inner.write_skip(doc_out)?;
        Ok(skip_pointer)
    }
}
