//! Document and frequency decoding shared by every enumerator variant.

use std::sync::Arc;

use sift_common::{Error, Result, verify_data};
use sift_io::{DataInput, IndexInput};

use crate::for_util::{ForUtil, MAX_DATA_SIZE, MAX_ENCODED_SIZE};
use crate::format::{BLOCK_SIZE, DocId, FieldCaps, MAX_SKIP_LEVELS, NO_MORE_DOCS, UNPOSITIONED};
use crate::live_docs::LiveDocs;
use crate::skip::{SkipPoint, SkipReader};
use crate::term_state::IntBlockTermState;

pub(crate) struct DocBlockCursor {
    pub reader_id: u64,
    pub caps: FieldCaps,
    for_util: Arc<ForUtil>,
    start_doc_in: IndexInput,
    /// Cloned from `start_doc_in` by the first term with more than one document.
    doc_in: Option<IndexInput>,
    /// Decode frequency blocks rather than skipping them.
    needs_freq: bool,

    encoded: Box<[u8]>,
    doc_delta_buffer: Box<[u32]>,
    freq_buffer: Box<[u32]>,
    doc_buffer_upto: usize,

    skipper: Option<SkipReader>,
    skip_initialized: bool,
    next_skip_doc: DocId,

    live_docs: Option<Arc<dyn LiveDocs>>,

    pub doc_freq: u32,
    pub total_term_freq: u64,
    pub doc_term_start_fp: u64,
    pub pos_term_start_fp: u64,
    pub pay_term_start_fp: u64,
    skip_offset: Option<u64>,
    singleton_doc_id: Option<DocId>,

    /// Postings consumed so far.
    doc_upto: u32,
    /// Document of the last consumed posting.
    pub accum: DocId,
    /// Frequency of the last consumed posting.
    pub freq: u32,
    pub doc: DocId,
}

impl DocBlockCursor {
    pub fn new(
        reader_id: u64,
        for_util: Arc<ForUtil>,
        doc_in: &IndexInput,
        caps: FieldCaps,
    ) -> DocBlockCursor {
        let mut freq_buffer = vec![0u32; MAX_DATA_SIZE].into_boxed_slice();
        if !caps.freqs {
            freq_buffer.fill(1);
        }
        DocBlockCursor {
            reader_id,
            caps,
            for_util,
            start_doc_in: doc_in.clone(),
            doc_in: None,
            needs_freq: true,
            encoded: vec![0u8; MAX_ENCODED_SIZE].into_boxed_slice(),
            doc_delta_buffer: vec![0u32; MAX_DATA_SIZE].into_boxed_slice(),
            freq_buffer,
            doc_buffer_upto: BLOCK_SIZE,
            skipper: None,
            skip_initialized: false,
            next_skip_doc: BLOCK_SIZE as DocId - 1,
            live_docs: None,
            doc_freq: 0,
            total_term_freq: 0,
            doc_term_start_fp: 0,
            pos_term_start_fp: 0,
            pay_term_start_fp: 0,
            skip_offset: None,
            singleton_doc_id: None,
            doc_upto: 0,
            accum: 0,
            freq: 0,
            doc: UNPOSITIONED,
        }
    }

    pub fn for_util(&self) -> &ForUtil {
        &self.for_util
    }

    pub fn can_reuse(&self, reader_id: u64, caps: FieldCaps) -> bool {
        self.reader_id == reader_id && self.caps == caps
    }

    pub fn reset(
        &mut self,
        state: &IntBlockTermState,
        live_docs: Option<Arc<dyn LiveDocs>>,
        needs_freq: bool,
    ) -> Result<()> {
        self.live_docs = live_docs;
        self.needs_freq = needs_freq;
        self.doc_freq = state.doc_freq;
        self.total_term_freq = if self.caps.freqs {
            state.total_term_freq
        } else {
            state.doc_freq as u64
        };
        self.doc_term_start_fp = state.doc_start_fp;
        self.pos_term_start_fp = state.pos_start_fp;
        self.pay_term_start_fp = state.pay_start_fp;
        self.skip_offset = state.skip_offset;
        self.singleton_doc_id = state.singleton_doc_id;
        if self.doc_freq > 1 {
            let doc_in = self
                .doc_in
                .get_or_insert_with(|| self.start_doc_in.clone());
            doc_in.seek(self.doc_term_start_fp)?;
        }

        self.doc = UNPOSITIONED;
        self.accum = 0;
        self.freq = 0;
        self.doc_upto = 0;
        self.next_skip_doc = BLOCK_SIZE as DocId - 1;
        self.doc_buffer_upto = BLOCK_SIZE;
        self.skip_initialized = false;
        Ok(())
    }

    pub fn is_live(&self, doc: DocId) -> bool {
        self.live_docs.as_ref().is_none_or(|live| live.is_live(doc))
    }

    /// Consumes the next posting into `accum` and `freq`. Returns false once all
    /// `doc_freq` postings were consumed.
    pub fn read_next(&mut self) -> Result<bool> {
        if self.doc_upto == self.doc_freq {
            return Ok(false);
        }
        if self.doc_buffer_upto == BLOCK_SIZE {
            self.refill_docs()?;
        }
        let delta = self.doc_delta_buffer[self.doc_buffer_upto];
        self.accum = self
            .accum
            .checked_add(delta)
            .filter(|&doc| doc < NO_MORE_DOCS)
            .ok_or_else(|| {
                Error::invalid_format("doc block", format!("doc delta {delta} overflows"))
            })?;
        self.freq = self.freq_buffer[self.doc_buffer_upto];
        self.doc_buffer_upto += 1;
        self.doc_upto += 1;
        Ok(true)
    }

    fn refill_docs(&mut self) -> Result<()> {
        let left = self.doc_freq - self.doc_upto;
        if left as usize >= BLOCK_SIZE {
            let doc_in = self.doc_in.as_mut().ok_or_else(missing_doc_stream)?;
            self.for_util
                .read_block(doc_in, &mut self.encoded, &mut self.doc_delta_buffer)?;
            if self.caps.freqs {
                if self.needs_freq {
                    self.for_util
                        .read_block(doc_in, &mut self.encoded, &mut self.freq_buffer)?;
                } else {
                    self.for_util.skip_block(doc_in)?;
                    self.freq_buffer[..BLOCK_SIZE].fill(1);
                }
            }
        } else if self.doc_freq == 1 {
            self.doc_delta_buffer[0] = self
                .singleton_doc_id
                .ok_or_else(|| Error::invalid_format("term state", "singleton doc id missing"))?;
            self.freq_buffer[0] = u32::try_from(self.total_term_freq).map_err(|_| {
                Error::invalid_format("term state", "total term freq out of range")
            })?;
        } else {
            let doc_in = self.doc_in.as_mut().ok_or_else(missing_doc_stream)?;
            for i in 0..left as usize {
                let code = doc_in.read_vint()?;
                if self.caps.freqs {
                    self.doc_delta_buffer[i] = code >> 1;
                    self.freq_buffer[i] = if code & 1 != 0 {
                        1
                    } else {
                        doc_in.read_vint()?
                    };
                } else {
                    self.doc_delta_buffer[i] = code;
                }
            }
        }
        self.doc_buffer_upto = 0;
        Ok(())
    }

    /// Jumps over whole blocks with the skip list when `target` lies beyond the
    /// current block. Returns the skip point landed on, if the cursor moved.
    pub fn skip_to(&mut self, target: DocId) -> Result<Option<SkipPoint>> {
        if self.doc_freq as usize <= BLOCK_SIZE || target <= self.next_skip_doc {
            return Ok(None);
        }
        let skipper = self.skipper.get_or_insert_with(|| {
            SkipReader::new(self.start_doc_in.clone(), MAX_SKIP_LEVELS, self.caps)
        });
        if !self.skip_initialized {
            let skip_offset = self.skip_offset.ok_or_else(|| {
                Error::invalid_format("term state", "skip offset missing for a multi-block term")
            })?;
            skipper.init(
                self.doc_term_start_fp + skip_offset,
                self.doc_term_start_fp,
                self.pos_term_start_fp,
                self.pay_term_start_fp,
                self.doc_freq,
            );
            self.skip_initialized = true;
        }

        let new_doc_upto = skipper.skip_to(target)? + 1;
        let mut landed = None;
        if new_doc_upto > self.doc_upto as i64 {
            verify_data!(new_doc_upto, new_doc_upto % BLOCK_SIZE as i64 == 0);
            let point = skipper.last_point();
            self.doc_upto = new_doc_upto as u32;
            self.doc_buffer_upto = BLOCK_SIZE;
            self.accum = point.doc;
            self.doc_in
                .as_mut()
                .ok_or_else(missing_doc_stream)?
                .seek(point.doc_pointer)?;
            landed = Some(point);
        }
        self.next_skip_doc = skipper.next_skip_doc();
        Ok(landed)
    }
}

fn missing_doc_stream() -> Error {
    Error::invalid_operation("doc stream not positioned for this term")
}
