use sift_common::Result;
use sift_io::{DataInput, IndexInput};

use super::block_writer::SkipPoint;
use super::multi_level_reader::{MultiLevelSkipListReader, SkipDataReader, SkipStream};
use crate::format::{BLOCK_SIZE, FieldCaps, SKIP_MULTIPLIER};

/// Per-level decoded pointers.
#[derive(Debug)]
struct EntryDecoder {
    caps: FieldCaps,
    points: Vec<SkipPoint>,
    last: SkipPoint,
}

impl SkipDataReader for EntryDecoder {
    fn read_skip_data(&mut self, level: usize, stream: &mut SkipStream) -> Result<u32> {
        let point = &mut self.points[level];
        let delta = stream.read_vint()?;
        point.doc_pointer = point.doc_pointer.saturating_add(stream.read_vlong()?);
        if self.caps.positions {
            point.pos_pointer = point.pos_pointer.saturating_add(stream.read_vlong()?);
            point.pos_buffer_upto = stream.read_vint()?;
            if self.caps.payloads {
                point.payload_byte_upto = stream.read_vint()?;
            }
            if self.caps.offsets || self.caps.payloads {
                point.pay_pointer = point.pay_pointer.saturating_add(stream.read_vlong()?);
            }
        }
        Ok(delta)
    }

    fn set_last_skip_data(&mut self, level: usize) {
        self.last = self.points[level];
    }

    fn seek_child(&mut self, level: usize) {
        self.points[level] = self.last;
    }
}

/// Skip list reader for block postings.
///
/// The number of entries is derived from the term's document frequency. When
/// it is an exact multiple of the block size the last block gets no entry, since
/// the writer only records a skip point once a following document exists.
#[derive(Debug)]
pub struct SkipReader {
    inner: MultiLevelSkipListReader,
    decoder: EntryDecoder,
}

impl SkipReader {
    pub(crate) fn new(doc_in: IndexInput, max_skip_levels: usize, caps: FieldCaps) -> SkipReader {
        SkipReader {
            inner: MultiLevelSkipListReader::new(
                doc_in,
                max_skip_levels,
                BLOCK_SIZE as u32,
                SKIP_MULTIPLIER,
            ),
            decoder: EntryDecoder {
                caps,
                points: vec![SkipPoint::default(); max_skip_levels],
                last: SkipPoint::default(),
            },
        }
    }

    /// Prepares for skipping over a term's postings.
    pub fn init(
        &mut self,
        skip_pointer: u64,
        doc_base_pointer: u64,
        pos_base_pointer: u64,
        pay_base_pointer: u64,
        doc_freq: u32,
    ) {
        self.inner.init(skip_pointer, trim(doc_freq));
        let base = SkipPoint {
            doc_pointer: doc_base_pointer,
            pos_pointer: pos_base_pointer,
            pay_pointer: pay_base_pointer,
            ..Default::default()
        };
        self.decoder.last = base;
        self.decoder.points.fill(base);
    }

    /// See [`MultiLevelSkipListReader::skip_to`].
    pub fn skip_to(&mut self, target: u32) -> Result<i64> {
        self.inner.skip_to(target, &mut self.decoder)
    }

    /// Document of the next entry on level 0.
    pub fn next_skip_doc(&self) -> u32 {
        self.inner.next_skip_doc()
    }

    /// Stream positions of the last entry passed by [`skip_to`](Self::skip_to).
    pub fn last_point(&self) -> SkipPoint {
        SkipPoint {
            doc: self.inner.last_doc(),
            ..self.decoder.last
        }
    }
}

fn trim(doc_freq: u32) -> u32 {
    if doc_freq as usize % BLOCK_SIZE == 0 {
        doc_freq - 1
    } else {
        doc_freq
    }
}
