use std::sync::Arc;

use sift_common::{Result, verify_arg, verify_data};
use sift_io::{DataInput, IndexInput};

use super::cursor::DocBlockCursor;
use super::positions::last_pos_block_fp;
use crate::for_util::{MAX_DATA_SIZE, MAX_ENCODED_SIZE};
use crate::format::{BLOCK_SIZE, DocId, NO_MORE_DOCS};
use crate::iter::{DocIterator, PositionIterator, PositionsFlags};
use crate::live_docs::LiveDocs;
use crate::term_state::IntBlockTermState;

/// Enumerates documents, positions, payloads and offsets.
///
/// Full position blocks keep payload lengths, payload bytes and offsets in
/// `.pay`, read in lockstep with `.pos`. Whatever was not requested is skipped
/// block by block, and never reported.
pub struct EverythingEnum {
    docs: DocBlockCursor,
    pos_in: IndexInput,
    pay_in: IndexInput,
    encoded: Box<[u8]>,

    pos_delta_buffer: Box<[u32]>,
    payload_length_buffer: Box<[u32]>,
    offset_start_delta_buffer: Box<[u32]>,
    offset_length_buffer: Box<[u32]>,
    pos_buffer_upto: usize,

    payload_bytes: Vec<u8>,
    payload_byte_upto: usize,
    payload_length: u32,
    payload_start: usize,

    needs_offsets: bool,
    needs_payloads: bool,

    position: u32,
    last_start_offset: u32,
    start_offset: u32,
    end_offset: u32,

    pos_pending_count: u64,
    pos_pending_fp: Option<u64>,
    pay_pending_fp: Option<u64>,
    last_pos_block_fp: Option<u64>,
}

impl EverythingEnum {
    pub(crate) fn new(
        docs: DocBlockCursor,
        pos_in: &IndexInput,
        pay_in: &IndexInput,
    ) -> EverythingEnum {
        let buffer = || vec![0u32; MAX_DATA_SIZE].into_boxed_slice();
        EverythingEnum {
            docs,
            pos_in: pos_in.clone(),
            pay_in: pay_in.clone(),
            encoded: vec![0u8; MAX_ENCODED_SIZE].into_boxed_slice(),
            pos_delta_buffer: buffer(),
            payload_length_buffer: buffer(),
            offset_start_delta_buffer: buffer(),
            offset_length_buffer: buffer(),
            pos_buffer_upto: BLOCK_SIZE,
            payload_bytes: Vec::new(),
            payload_byte_upto: 0,
            payload_length: 0,
            payload_start: 0,
            needs_offsets: false,
            needs_payloads: false,
            position: 0,
            last_start_offset: 0,
            start_offset: 0,
            end_offset: 0,
            pos_pending_count: 0,
            pos_pending_fp: None,
            pay_pending_fp: None,
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
        flags: PositionsFlags,
    ) -> Result<()> {
        self.docs.reset(state, live_docs, true)?;
        self.needs_offsets = self.docs.caps.offsets && flags.contains(PositionsFlags::OFFSETS);
        self.needs_payloads = self.docs.caps.payloads && flags.contains(PositionsFlags::PAYLOADS);
        self.pos_pending_fp = Some(self.docs.pos_term_start_fp);
        self.pay_pending_fp = Some(self.docs.pay_term_start_fp);
        self.pos_pending_count = 0;
        self.position = 0;
        self.last_start_offset = 0;
        self.payload_length = 0;
        self.last_pos_block_fp = last_pos_block_fp(
            self.docs.total_term_freq,
            self.docs.pos_term_start_fp,
            state.last_pos_block_offset,
        )?;
        Ok(())
    }

    fn refill_positions(&mut self) -> Result<()> {
        let caps = self.docs.caps;
        if Some(self.pos_in.file_pointer()) == self.last_pos_block_fp {
            let count = (self.docs.total_term_freq % BLOCK_SIZE as u64) as usize;
            let mut payload_length = 0;
            let mut offset_length = 0;
            self.payload_bytes.clear();
            for i in 0..count {
                let code = self.pos_in.read_vint()?;
                if caps.payloads {
                    if code & 1 != 0 {
                        payload_length = self.pos_in.read_vint()?;
                    }
                    self.payload_length_buffer[i] = payload_length;
                    self.pos_delta_buffer[i] = code >> 1;
                    if payload_length != 0 {
                        let start = self.payload_bytes.len();
                        self.payload_bytes.resize(start + payload_length as usize, 0);
                        self.pos_in.read_bytes(&mut self.payload_bytes[start..])?;
                    }
                } else {
                    self.pos_delta_buffer[i] = code;
                }
                if caps.offsets {
                    let delta_code = self.pos_in.read_vint()?;
                    if delta_code & 1 != 0 {
                        offset_length = self.pos_in.read_vint()?;
                    }
                    self.offset_start_delta_buffer[i] = delta_code >> 1;
                    self.offset_length_buffer[i] = offset_length;
                }
            }
            self.payload_byte_upto = 0;
        } else {
            let for_util = self.docs.for_util();
            for_util.read_block(&mut self.pos_in, &mut self.encoded, &mut self.pos_delta_buffer)?;
            if caps.payloads {
                if self.needs_payloads {
                    for_util.read_block(
                        &mut self.pay_in,
                        &mut self.encoded,
                        &mut self.payload_length_buffer,
                    )?;
                    let num_bytes = self.pay_in.read_vint()? as usize;
                    verify_data!(
                        num_bytes,
                        num_bytes as u64 <= self.pay_in.len() - self.pay_in.file_pointer()
                    );
                    self.payload_bytes.resize(num_bytes, 0);
                    self.pay_in.read_bytes(&mut self.payload_bytes)?;
                } else {
                    // Lengths block, then the byte count and the bytes.
                    for_util.skip_block(&mut self.pay_in)?;
                    let num_bytes = self.pay_in.read_vint()?;
                    self.pay_in.skip_bytes(num_bytes as u64)?;
                }
                self.payload_byte_upto = 0;
            }
            if caps.offsets {
                if self.needs_offsets {
                    for_util.read_block(
                        &mut self.pay_in,
                        &mut self.encoded,
                        &mut self.offset_start_delta_buffer,
                    )?;
                    for_util.read_block(
                        &mut self.pay_in,
                        &mut self.encoded,
                        &mut self.offset_length_buffer,
                    )?;
                } else {
                    for_util.skip_block(&mut self.pay_in)?;
                    for_util.skip_block(&mut self.pay_in)?;
                }
            }
        }
        Ok(())
    }

    fn skip_positions(&mut self) -> Result<()> {
        let caps = self.docs.caps;
        let mut to_skip = self.pos_pending_count - self.docs.freq as u64;
        let left_in_block = (BLOCK_SIZE - self.pos_buffer_upto) as u64;
        if to_skip < left_in_block {
            let end = self.pos_buffer_upto + to_skip as usize;
            self.skip_payload_bytes(self.pos_buffer_upto..end);
            self.pos_buffer_upto = end;
        } else {
            to_skip -= left_in_block;
            while to_skip >= BLOCK_SIZE as u64 {
                verify_data!(
                    pos_in,
                    Some(self.pos_in.file_pointer()) != self.last_pos_block_fp
                );
                let for_util = self.docs.for_util();
                for_util.skip_block(&mut self.pos_in)?;
                if caps.payloads {
                    for_util.skip_block(&mut self.pay_in)?;
                    let num_bytes = self.pay_in.read_vint()?;
                    self.pay_in.skip_bytes(num_bytes as u64)?;
                }
                if caps.offsets {
                    for_util.skip_block(&mut self.pay_in)?;
                    for_util.skip_block(&mut self.pay_in)?;
                }
                to_skip -= BLOCK_SIZE as u64;
            }
            self.refill_positions()?;
            self.payload_byte_upto = 0;
            self.skip_payload_bytes(0..to_skip as usize);
            self.pos_buffer_upto = to_skip as usize;
        }
        self.position = 0;
        self.last_start_offset = 0;
        Ok(())
    }

    /// Moves the payload byte cursor past the payloads of `positions` in the
    /// current block.
    fn skip_payload_bytes(&mut self, positions: std::ops::Range<usize>) {
        if self.needs_payloads {
            self.payload_byte_upto += self.payload_length_buffer[positions]
                .iter()
                .map(|&len| len as usize)
                .sum::<usize>();
        }
    }

    fn on_skip(&mut self, pos_pointer: u64, pay_pointer: u64, pos_buffer_upto: u32, payload_byte_upto: u32) {
        self.pos_pending_fp = Some(pos_pointer);
        self.pay_pending_fp = Some(pay_pointer);
        self.pos_pending_count = pos_buffer_upto as u64;
        self.last_start_offset = 0;
        self.payload_byte_upto = payload_byte_upto as usize;
    }
}

impl DocIterator for EverythingEnum {
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
                self.last_start_offset = 0;
                return Ok(self.docs.doc);
            }
        }
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if let Some(point) = self.docs.skip_to(target)? {
            self.on_skip(
                point.pos_pointer,
                point.pay_pointer,
                point.pos_buffer_upto,
                point.payload_byte_upto,
            );
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
            self.last_start_offset = 0;
            Ok(self.docs.doc)
        } else {
            self.next_doc()
        }
    }

    fn cost(&self) -> u64 {
        self.docs.doc_freq as u64
    }
}

impl PositionIterator for EverythingEnum {
    fn next_position(&mut self) -> Result<u32> {
        if let Some(fp) = self.pos_pending_fp.take() {
            self.pos_in.seek(fp)?;
            if let Some(fp) = self.pay_pending_fp.take() {
                self.pay_in.seek(fp)?;
            }
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

        let i = self.pos_buffer_upto;
        self.position = self.position.saturating_add(self.pos_delta_buffer[i]);
        if self.needs_payloads {
            self.payload_length = self.payload_length_buffer[i];
            self.payload_start = self.payload_byte_upto;
            self.payload_byte_upto += self.payload_length as usize;
        }
        if self.needs_offsets {
            self.start_offset = self
                .last_start_offset
                .saturating_add(self.offset_start_delta_buffer[i]);
            self.end_offset = self.start_offset.saturating_add(self.offset_length_buffer[i]);
            self.last_start_offset = self.start_offset;
        }
        self.pos_buffer_upto += 1;
        self.pos_pending_count -= 1;
        Ok(self.position)
    }

    fn start_offset(&self) -> Option<u32> {
        self.needs_offsets.then_some(self.start_offset)
    }

    fn end_offset(&self) -> Option<u32> {
        self.needs_offsets.then_some(self.end_offset)
    }

    fn payload(&self) -> Option<&[u8]> {
        if !self.needs_payloads || self.payload_length == 0 {
            return None;
        }
        self.payload_bytes
            .get(self.payload_start..self.payload_start + self.payload_length as usize)
    }
}
