use std::sync::Arc;

use sift_common::{Error, Result, verify_arg, verify_data};
use sift_io::{DataInput, IndexInput};

use super::cursor::DocBlockCursor;
use crate::for_util::{MAX_DATA_SIZE, MAX_ENCODED_SIZE};
use crate::format::{BLOCK_SIZE, DocId, NO_MORE_DOCS};
use crate::iter::{DocIterator, PositionIterator};
use crate::live_docs::LiveDocs;
use crate::term_state::IntBlockTermState;

/// Start of the vint-encoded position tail of a term, `None` when the term's
/// positions fill whole blocks exactly.
pub(crate) fn last_pos_block_fp(
    total_term_freq: u64,
    pos_start_fp: u64,
    offset: Option<u64>,
) -> Result<Option<u64>> {
    let block = BLOCK_SIZE as u64;
    if total_term_freq < block {
        Ok(Some(pos_start_fp))
    } else if total_term_freq == block {
        Ok(None)
    } else {
        let offset = offset.ok_or_else(|| {
            Error::invalid_format("term state", "last position block offset missing")
        })?;
        Ok(Some(pos_start_fp + offset))
    }
}

/// Enumerates documents and positions without reading `.pay`. Offsets and
/// payloads are never reported.
///
/// Positions are decoded only when asked for: document iteration just counts the
/// positions it passes over, and the first `next_position` call on a document
/// seeks and skips ahead as needed.
pub struct BlockDocsAndPositionsEnum {
    docs: DocBlockCursor,
    pos_in: IndexInput,
    encoded: Box<[u8]>,
    pos_delta_buffer: Box<[u32]>,
    pos_buffer_upto: usize,
    position: u32,
    /// Positions of consumed documents not yet read from `pos_in`.
    pos_pending_count: u64,
    /// Where `pos_in` must be moved before the next read.
    pos_pending_fp: Option<u64>,
    last_pos_block_fp: Option<u64>,
}

impl BlockDocsAndPositionsEnum {
    pub(crate) fn new(docs: DocBlockCursor, pos_in: &IndexInput) -> BlockDocsAndPositionsEnum {
        BlockDocsAndPositionsEnum {
            docs,
            pos_in: pos_in.clone(),
            encoded: vec![0u8; MAX_ENCODED_SIZE].into_boxed_slice(),
            pos_delta_buffer: vec![0u32; MAX_DATA_SIZE].into_boxed_slice(),
            pos_buffer_upto: BLOCK_SIZE,
            position: 0,
            pos_pending_count: 0,
            pos_pending_fp: None,
            last_pos_block_fp: None,
        }
    }

    pub(crate) fn cursor(&self) -> &DocBlockCursor {
        &self.docs
    }

    pub(crate) fn reset(
        &mut self,
        state: &IntBlockTermState,
        live_docs: Option<Arc<dyn LiveDocs>>,
    ) -> Result<()> {
        self.docs.reset(state, live_docs, true)?;
        self.pos_pending_fp = Some(self.docs.pos_term_start_fp);
        self.pos_pending_count = 0;
        self.position = 0;
        self.last_pos_block_fp = last_pos_block_fp(
            self.docs.total_term_freq,
            self.docs.pos_term_start_fp,
            state.last_pos_block_offset,
        )?;
        Ok(())
    }

    fn refill_positions(&mut self) -> Result<()> {
        if Some(self.pos_in.file_pointer()) == self.last_pos_block_fp {
            let count = (self.docs.total_term_freq % BLOCK_SIZE as u64) as usize;
            let mut payload_length = 0;
            for i in 0..count {
                let code = self.pos_in.read_vint()?;
                if self.docs.caps.payloads {
                    if code & 1 != 0 {
                        payload_length = self.pos_in.read_vint()?;
                    }
                    self.pos_delta_buffer[i] = code >> 1;
                    if payload_length != 0 {
                        self.pos_in.skip_bytes(payload_length as u64)?;
                    }
                } else {
                    self.pos_delta_buffer[i] = code;
                }
                if self.docs.caps.offsets && self.pos_in.read_vint()? & 1 != 0 {
                    self.pos_in.read_vint()?;
                }
            }
        } else {
            self.docs.for_util().read_block(
                &mut self.pos_in,
                &mut self.encoded,
                &mut self.pos_delta_buffer,
            )?;
        }
        Ok(())
    }

    fn skip_positions(&mut self) -> Result<()> {
        let mut to_skip = self.pos_pending_count - self.docs.freq as u64;
        let left_in_block = (BLOCK_SIZE - self.pos_buffer_upto) as u64;
        if to_skip < left_in_block {
            self.pos_buffer_upto += to_skip as usize;
        } else {
            to_skip -= left_in_block;
            while to_skip >= BLOCK_SIZE as u64 {
                verify_data!(
                    pos_in,
                    Some(self.pos_in.file_pointer()) != self.last_pos_block_fp
                );
                self.docs.for_util().skip_block(&mut self.pos_in)?;
                to_skip -= BLOCK_SIZE as u64;
            }
            self.refill_positions()?;
            self.pos_buffer_upto = to_skip as usize;
        }
        self.position = 0;
        Ok(())
    }

    fn on_skip(&mut self, pos_pointer: u64, pos_buffer_upto: u32) {
        self.pos_pending_fp = Some(pos_pointer);
        self.pos_pending_count = pos_buffer_upto as u64;
    }
}

impl DocIterator for BlockDocsAndPositionsEnum {
    fn doc_id(&self) -> DocId {
        self.docs.doc
    }

    fn freq(&self) -> u32 {
        self.docs.freq
    }

    fn next_doc(&mut self) -> Result<DocId> {
        loop {
            if !self.docs.read_next()? {
                self.docs.doc = NO_MORE_DOCS;
                return Ok(NO_MORE_DOCS);
            }
            self.pos_pending_count += self.docs.freq as u64;
            if self.docs.is_live(self.docs.accum) {
                self.docs.doc = self.docs.accum;
                self.position = 0;
                return Ok(self.docs.doc);
            }
        }
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if let Some(point) = self.docs.skip_to(target)? {
            self.on_skip(point.pos_pointer, point.pos_buffer_upto);
        }
        loop {
            if !self.docs.read_next()? {
                self.docs.doc = NO_MORE_DOCS;
                return Ok(NO_MORE_DOCS);
            }
            self.pos_pending_count += self.docs.freq as u64;
            if self.docs.accum >= target {
                break;
            }
        }
        if self.docs.is_live(self.docs.accum) {
            self.docs.doc = self.docs.accum;
            self.position = 0;
            Ok(self.docs.doc)
        } else {
            self.next_doc()
        }
    }

    fn cost(&self) -> u64 {
        self.docs.doc_freq as u64
    }
}

impl PositionIterator for BlockDocsAndPositionsEnum {
    fn next_position(&mut self) -> Result<u32> {
        if let Some(fp) = self.pos_pending_fp.take() {
            self.pos_in.seek(fp)?;
            self.pos_buffer_upto = BLOCK_SIZE;
        }
        if self.pos_pending_count > self.docs.freq as u64 {
            self.skip_positions()?;
            self.pos_pending_count = self.docs.freq as u64;
        }
        verify_arg!(next_position, self.pos_pending_count > 0);
        if self.pos_buffer_upto == BLOCK_SIZE {
            self.refill_positions()?;
            self.pos_buffer_upto = 0;
        }
        self.position = self
            .position
            .saturating_add(self.pos_delta_buffer[self.pos_buffer_upto]);
        self.pos_buffer_upto += 1;
        self.pos_pending_count -= 1;
        Ok(self.position)
    }

    fn start_offset(&self) -> Option<u32> {
        None
    }

    fn end_offset(&self) -> Option<u32> {
        None
    }

    fn payload(&self) -> Option<&[u8]> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::last_pos_block_fp;

    #[test]
    fn test_last_pos_block_fp() {
        assert_eq!(last_pos_block_fp(1, 40, None).unwrap(), Some(40));
        assert_eq!(last_pos_block_fp(127, 40, None).unwrap(), Some(40));
        assert_eq!(last_pos_block_fp(128, 40, None).unwrap(), None);
        assert_eq!(last_pos_block_fp(129, 40, Some(60)).unwrap(), Some(100));
        assert!(last_pos_block_fp(300, 40, None).unwrap_err().is_data_error());
    }
}
