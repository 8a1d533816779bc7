//! Encode-time state machine.
//!
//! Per term the caller drives `start_term`, then for every document
//! `start_doc`, `add_position` (once per occurrence, positional fields only) and
//! `finish_doc`, and finally `finish_term`. Full blocks of 128 document deltas,
//! frequencies and positions are packed with [`ForUtil`]; the trailing partial
//! block is written as vints when the term finishes.

use sift_common::{Error, Result, verify_arg};
use sift_io::{DataOutput, Directory, IndexOutput, codec_util, segment_file_name};

use crate::for_util::{ForUtil, MAX_DATA_SIZE, MAX_ENCODED_SIZE};
use crate::format::{
    BLOCK_SIZE, DOC_CODEC, DOC_EXTENSION, DocId, FieldCaps, FieldInfo, FieldInfos,
    MAX_SKIP_LEVELS, NO_MORE_DOCS, PAY_CODEC, PAY_EXTENSION, POS_CODEC, POS_EXTENSION,
    TERMS_CODEC, VERSION_CURRENT,
};
use crate::skip::{SkipPoint, SkipWriter};
use crate::term_state::IntBlockTermState;

/// Construction-time settings of a [`PostingsWriter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostingsWriterOptions {
    /// Extra space per packed value the block codec may spend for faster
    /// decoding, as a fraction of the value width. Clamped to
    /// `sift_packed::COMPACT..=sift_packed::FASTEST`.
    pub acceptable_overhead_ratio: f32,
    /// Number of documents in the segment. Bounds the height of skip lists.
    pub segment_doc_count: u32,
}

impl Default for PostingsWriterOptions {
    fn default() -> Self {
        PostingsWriterOptions {
            acceptable_overhead_ratio: sift_packed::COMPACT,
            segment_doc_count: NO_MORE_DOCS,
        }
    }
}

/// Statistics of a finished term, as counted by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermStats {
    pub doc_freq: u32,
    /// Sum of the frequencies passed to `start_doc`. Ignored for fields without
    /// frequencies.
    pub total_term_freq: u64,
}

pub struct PostingsWriter {
    doc_out: IndexOutput,
    pos_out: Option<IndexOutput>,
    pay_out: Option<IndexOutput>,
    for_util: ForUtil,
    skip_writer: SkipWriter,

    field: FieldCaps,
    last_state: IntBlockTermState,

    doc_start_fp: u64,
    pos_start_fp: u64,
    pay_start_fp: u64,

    doc_delta_buffer: Box<[u32]>,
    freq_buffer: Box<[u32]>,
    doc_buffer_upto: usize,
    last_doc_id: DocId,
    doc_count: u32,
    total_freq: u64,

    pos_delta_buffer: Box<[u32]>,
    payload_length_buffer: Box<[u32]>,
    offset_start_delta_buffer: Box<[u32]>,
    offset_length_buffer: Box<[u32]>,
    pos_buffer_upto: usize,
    payload_bytes: Vec<u8>,
    last_position: u32,
    last_start_offset: u32,

    /// Stream positions after the last full document block, recorded as a skip
    /// point once the next document arrives.
    pending_skip: Option<SkipPoint>,

    encoded: Box<[u8]>,
}

impl PostingsWriter {
    /// Creates the `.doc` stream of the segment, plus `.pos` when any field
    /// indexes positions and `.pay` when any field also indexes payloads or
    /// offsets, and writes their headers.
    pub fn create(
        dir: &dyn Directory,
        segment: &str,
        suffix: &str,
        field_infos: &FieldInfos,
        options: PostingsWriterOptions,
    ) -> Result<PostingsWriter> {
        let mut doc_out = dir.create_output(&segment_file_name(segment, suffix, DOC_EXTENSION))?;
        codec_util::write_header(&mut doc_out, DOC_CODEC, VERSION_CURRENT)?;
        let for_util = ForUtil::create(options.acceptable_overhead_ratio, &mut doc_out)?;

        let (pos_out, pay_out) = if field_infos.has_positions() {
            let mut pos_out =
                dir.create_output(&segment_file_name(segment, suffix, POS_EXTENSION))?;
            codec_util::write_header(&mut pos_out, POS_CODEC, VERSION_CURRENT)?;
            let pay_out = if field_infos.has_payloads() || field_infos.has_offsets() {
                let mut pay_out =
                    dir.create_output(&segment_file_name(segment, suffix, PAY_EXTENSION))?;
                codec_util::write_header(&mut pay_out, PAY_CODEC, VERSION_CURRENT)?;
                Some(pay_out)
            } else {
                None
            };
            (Some(pos_out), pay_out)
        } else {
            (None, None)
        };

        log::debug!(
            "postings writer for segment {segment}: doc={}, pos={:?}, pay={:?}",
            doc_out.name(),
            pos_out.as_ref().map(IndexOutput::name),
            pay_out.as_ref().map(IndexOutput::name),
        );

        let buffer = || vec![0u32; MAX_DATA_SIZE].into_boxed_slice();
        Ok(PostingsWriter {
            doc_out,
            pos_out,
            pay_out,
            for_util,
            skip_writer: SkipWriter::new(MAX_SKIP_LEVELS, options.segment_doc_count),
            field: FieldCaps::default(),
            last_state: IntBlockTermState::default(),
            doc_start_fp: 0,
            pos_start_fp: 0,
            pay_start_fp: 0,
            doc_delta_buffer: buffer(),
            freq_buffer: buffer(),
            doc_buffer_upto: 0,
            last_doc_id: 0,
            doc_count: 0,
            total_freq: 0,
            pos_delta_buffer: buffer(),
            payload_length_buffer: buffer(),
            offset_start_delta_buffer: buffer(),
            offset_length_buffer: buffer(),
            pos_buffer_upto: 0,
            payload_bytes: Vec::new(),
            last_position: 0,
            last_start_offset: 0,
            pending_skip: None,
            encoded: vec![0u8; MAX_ENCODED_SIZE].into_boxed_slice(),
        })
    }

    /// Writes the terms dictionary handshake: a header and the block size.
    pub fn init(&mut self, terms_out: &mut IndexOutput) -> Result<()> {
        codec_util::write_header(terms_out, TERMS_CODEC, VERSION_CURRENT)?;
        terms_out.write_vint(BLOCK_SIZE as u32)
    }

    pub fn new_term_state(&self) -> IntBlockTermState {
        IntBlockTermState::new()
    }

    /// Switches to a new field and returns how many file pointer deltas
    /// ("longs") [`encode_term`](Self::encode_term) produces per term: 1 for
    /// `.doc`, 2 with `.pos`, 3 with `.pay`.
    pub fn set_field(&mut self, field: &FieldInfo) -> Result<usize> {
        let caps = field.caps();
        if (caps.positions && self.pos_out.is_none()) || (caps.has_pay_data() && self.pay_out.is_none())
        {
            return Err(Error::invalid_arg(
                "field",
                format!("field {} needs a stream this segment was not created with", field.name),
            ));
        }
        self.field = caps;
        self.skip_writer.set_field(caps);
        self.last_state = IntBlockTermState::default();
        Ok(caps.longs_size())
    }

    pub fn start_term(&mut self) {
        self.doc_start_fp = self.doc_out.file_pointer();
        self.pos_start_fp = 0;
        self.pay_start_fp = 0;
        if self.field.positions {
            self.pos_start_fp = self.pos_out.as_ref().map_or(0, IndexOutput::file_pointer);
            if self.field.has_pay_data() {
                self.pay_start_fp = self.pay_out.as_ref().map_or(0, IndexOutput::file_pointer);
            }
        }
        self.last_doc_id = 0;
        self.pending_skip = None;
        self.skip_writer
            .reset_skip(self.doc_start_fp, self.pos_start_fp, self.pay_start_fp);
    }

    /// Adds document `doc_id`, in which the term occurs `term_doc_freq` times.
    ///
    /// Document IDs must strictly increase within a term; a violation fails
    /// with `CorruptIndex` and leaves the term unusable.
    pub fn start_doc(&mut self, doc_id: DocId, term_doc_freq: u32) -> Result<()> {
        verify_arg!(doc_id, doc_id < NO_MORE_DOCS);
        verify_arg!(term_doc_freq, !self.field.freqs || term_doc_freq > 0);

        if self.doc_buffer_upto == 0 {
            if let Some(mut point) = self.pending_skip.take() {
                point.doc_pointer = self.doc_out.file_pointer();
                self.skip_writer.buffer_skip(point, self.doc_count)?;
            }
        }

        if self.doc_count > 0 && doc_id <= self.last_doc_id {
            return Err(Error::corrupt_index(format!(
                "docs out of order ({doc_id} <= {}) in {}",
                self.last_doc_id,
                self.doc_out.name()
            )));
        }

        self.doc_delta_buffer[self.doc_buffer_upto] = doc_id - self.last_doc_id;
        if self.field.freqs {
            self.freq_buffer[self.doc_buffer_upto] = term_doc_freq;
            self.total_freq += term_doc_freq as u64;
        }
        self.doc_buffer_upto += 1;
        self.doc_count += 1;

        if self.doc_buffer_upto == BLOCK_SIZE {
            self.for_util
                .write_block(&self.doc_delta_buffer, &mut self.encoded, &mut self.doc_out)?;
            if self.field.freqs {
                self.for_util
                    .write_block(&self.freq_buffer, &mut self.encoded, &mut self.doc_out)?;
            }
            // The buffer index is reset by finish_doc, which records the skip
            // point for this block.
        }

        self.last_doc_id = doc_id;
        self.last_position = 0;
        self.last_start_offset = 0;
        Ok(())
    }

    /// Adds an occurrence of the term in the current document.
    ///
    /// `payload` is ignored unless the field stores payloads, the offsets unless
    /// it indexes offsets. A missing payload is stored as an empty one.
    pub fn add_position(
        &mut self,
        position: u32,
        payload: Option<&[u8]>,
        start_offset: u32,
        end_offset: u32,
    ) -> Result<()> {
        if !self.field.positions {
            return Err(Error::invalid_operation(
                "add_position on a field without positions",
            ));
        }
        verify_arg!(position, position >= self.last_position);

        let upto = self.pos_buffer_upto;
        self.pos_delta_buffer[upto] = position - self.last_position;
        if self.field.payloads {
            match payload {
                Some(payload) if !payload.is_empty() => {
                    self.payload_length_buffer[upto] = u32::try_from(payload.len())
                        .map_err(|_| Error::invalid_arg("payload", "payload too large"))?;
                    self.payload_bytes.extend_from_slice(payload);
                }
                _ => self.payload_length_buffer[upto] = 0,
            }
        }
        if self.field.offsets {
            verify_arg!(start_offset, start_offset >= self.last_start_offset);
            verify_arg!(end_offset, end_offset >= start_offset);
            self.offset_start_delta_buffer[upto] = start_offset - self.last_start_offset;
            self.offset_length_buffer[upto] = end_offset - start_offset;
            self.last_start_offset = start_offset;
        }

        self.pos_buffer_upto += 1;
        self.last_position = position;

        if self.pos_buffer_upto == BLOCK_SIZE {
            let pos_out = self.pos_out.as_mut().ok_or_else(|| missing_stream(POS_EXTENSION))?;
            self.for_util
                .write_block(&self.pos_delta_buffer, &mut self.encoded, pos_out)?;

            if self.field.has_pay_data() {
                let pay_out = self.pay_out.as_mut().ok_or_else(|| missing_stream(PAY_EXTENSION))?;
                if self.field.payloads {
                    self.for_util
                        .write_block(&self.payload_length_buffer, &mut self.encoded, pay_out)?;
                    pay_out.write_vint(self.payload_bytes.len() as u32)?;
                    pay_out.write_bytes(&self.payload_bytes)?;
                    self.payload_bytes.clear();
                }
                if self.field.offsets {
                    self.for_util
                        .write_block(&self.offset_start_delta_buffer, &mut self.encoded, pay_out)?;
                    self.for_util
                        .write_block(&self.offset_length_buffer, &mut self.encoded, pay_out)?;
                }
            }
            self.pos_buffer_upto = 0;
        }
        Ok(())
    }

    pub fn finish_doc(&mut self) {
        if self.doc_buffer_upto == BLOCK_SIZE {
            self.pending_skip = Some(SkipPoint {
                doc: self.last_doc_id,
                doc_pointer: 0,
                pos_pointer: self.pos_out.as_ref().map_or(0, IndexOutput::file_pointer),
                pay_pointer: self.pay_out.as_ref().map_or(0, IndexOutput::file_pointer),
                pos_buffer_upto: self.pos_buffer_upto as u32,
                payload_byte_upto: self.payload_bytes.len() as u32,
            });
            self.doc_buffer_upto = 0;
        }
    }

    /// Flushes the trailing partial blocks and the skip list of the current
    /// term and returns its metadata.
    pub fn finish_term(&mut self, stats: TermStats) -> Result<IntBlockTermState> {
        verify_arg!(stats, stats.doc_freq > 0 && stats.doc_freq == self.doc_count);
        verify_arg!(
            stats,
            !self.field.freqs || stats.total_term_freq == self.total_freq
        );

        let singleton_doc_id = if stats.doc_freq == 1 {
            Some(self.doc_delta_buffer[0])
        } else {
            for i in 0..self.doc_buffer_upto {
                let doc_delta = self.doc_delta_buffer[i];
                let freq = self.freq_buffer[i];
                if !self.field.freqs {
                    self.doc_out.write_vint(doc_delta)?;
                } else if freq == 1 {
                    self.doc_out.write_vint((doc_delta << 1) | 1)?;
                } else {
                    self.doc_out.write_vint(doc_delta << 1)?;
                    self.doc_out.write_vint(freq)?;
                }
            }
            None
        };

        let last_pos_block_offset = if self.field.positions {
            self.finish_positions(stats.total_term_freq)?
        } else {
            None
        };

        let skip_offset = if self.doc_count > BLOCK_SIZE as u32 {
            Some(self.skip_writer.write_skip(&mut self.doc_out)? - self.doc_start_fp)
        } else {
            None
        };

        let state = IntBlockTermState {
            doc_freq: stats.doc_freq,
            total_term_freq: if self.field.freqs {
                stats.total_term_freq
            } else {
                stats.doc_freq as u64
            },
            doc_start_fp: self.doc_start_fp,
            pos_start_fp: self.pos_start_fp,
            pay_start_fp: self.pay_start_fp,
            skip_offset,
            last_pos_block_offset,
            singleton_doc_id,
        };
        log::trace!(
            "finished term: doc_freq={}, total_term_freq={}, skip_offset={:?}, last_pos_block_offset={:?}",
            state.doc_freq,
            state.total_term_freq,
            state.skip_offset,
            state.last_pos_block_offset
        );

        self.doc_buffer_upto = 0;
        self.doc_count = 0;
        self.total_freq = 0;
        self.pending_skip = None;
        Ok(state)
    }

    /// Writes the residual positions as vints and returns the offset of that
    /// tail from the term's first position block, when the term has full
    /// position blocks at all.
    fn finish_positions(&mut self, total_term_freq: u64) -> Result<Option<u64>> {
        let pos_out = self.pos_out.as_mut().ok_or_else(|| missing_stream(POS_EXTENSION))?;
        let last_pos_block_offset = (total_term_freq > BLOCK_SIZE as u64)
            .then(|| pos_out.file_pointer() - self.pos_start_fp);

        if self.pos_buffer_upto > 0 {
            let mut last_payload_length = None;
            let mut last_offset_length = None;
            let mut payload_bytes_upto = 0;
            for i in 0..self.pos_buffer_upto {
                let pos_delta = self.pos_delta_buffer[i];
                if self.field.payloads {
                    let payload_length = self.payload_length_buffer[i];
                    if last_payload_length != Some(payload_length) {
                        last_payload_length = Some(payload_length);
                        pos_out.write_vint((pos_delta << 1) | 1)?;
                        pos_out.write_vint(payload_length)?;
                    } else {
                        pos_out.write_vint(pos_delta << 1)?;
                    }
                    if payload_length != 0 {
                        let end = payload_bytes_upto + payload_length as usize;
                        pos_out.write_bytes(&self.payload_bytes[payload_bytes_upto..end])?;
                        payload_bytes_upto = end;
                    }
                } else {
                    pos_out.write_vint(pos_delta)?;
                }

                if self.field.offsets {
                    let delta = self.offset_start_delta_buffer[i];
                    let length = self.offset_length_buffer[i];
                    if last_offset_length == Some(length) {
                        pos_out.write_vint(delta << 1)?;
                    } else {
                        pos_out.write_vint((delta << 1) | 1)?;
                        pos_out.write_vint(length)?;
                        last_offset_length = Some(length);
                    }
                }
            }
            self.payload_bytes.clear();
            self.pos_buffer_upto = 0;
        }
        Ok(last_pos_block_offset)
    }

    /// Serializes `state` for the terms dictionary: file pointer deltas against
    /// the previous term go to `longs`, everything else to `out`. With
    /// `absolute` the deltas are taken against zero.
    pub fn encode_term(
        &mut self,
        longs: &mut [u64],
        out: &mut dyn DataOutput,
        state: &IntBlockTermState,
        absolute: bool,
    ) -> Result<()> {
        if absolute {
            self.last_state = IntBlockTermState::default();
        }
        verify_arg!(longs, longs.len() >= self.field.longs_size());

        longs[0] = fp_delta(state.doc_start_fp, self.last_state.doc_start_fp)?;
        if self.field.positions {
            longs[1] = fp_delta(state.pos_start_fp, self.last_state.pos_start_fp)?;
            if self.field.has_pay_data() {
                longs[2] = fp_delta(state.pay_start_fp, self.last_state.pay_start_fp)?;
            }
        }
        if let Some(doc) = state.singleton_doc_id {
            out.write_vint(doc)?;
        }
        if self.field.positions {
            if let Some(offset) = state.last_pos_block_offset {
                out.write_vlong(offset)?;
            }
        }
        if let Some(offset) = state.skip_offset {
            out.write_vlong(offset)?;
        }
        self.last_state.clone_from(state);
        Ok(())
    }

    /// Writes the footers and seals every stream.
    pub fn close(mut self) -> Result<()> {
        codec_util::write_footer(&mut self.doc_out)?;
        let doc_len = self.doc_out.close()?;
        let pos_len = match self.pos_out {
            Some(mut out) => {
                codec_util::write_footer(&mut out)?;
                Some(out.close()?)
            }
            None => None,
        };
        let pay_len = match self.pay_out {
            Some(mut out) => {
                codec_util::write_footer(&mut out)?;
                Some(out.close()?)
            }
            None => None,
        };
        log::debug!("postings writer closed: doc={doc_len}, pos={pos_len:?}, pay={pay_len:?} bytes");
        Ok(())
    }
}

fn fp_delta(current: u64, last: u64) -> Result<u64> {
    current.checked_sub(last).ok_or_else(|| {
        Error::invalid_arg(
            "state",
            format!("term file pointers must not decrease ({current} < {last})"),
        )
    })
}

fn missing_stream(ext: &str) -> Error {
    Error::invalid_operation(format!("segment has no .{ext} stream"))
}

#[cfg(test)]
mod tests {
    use sift_common::ErrorKind;
    use sift_io::{Directory, MemoryDirectory};

    use super::{PostingsWriter, TermStats};
    use crate::format::{FieldInfo, FieldInfos, IndexOptions};

    fn writer(dir: &MemoryDirectory, fields: &[FieldInfo]) -> PostingsWriter {
        let field_infos = FieldInfos::new(fields.to_vec());
        PostingsWriter::create(dir, "_0", "", &field_infos, Default::default()).unwrap()
    }

    #[test]
    fn test_streams_follow_field_infos() {
        let dir = MemoryDirectory::new();
        writer(&dir, &[FieldInfo::new("a", 0, IndexOptions::DocsAndFreqs)])
            .close()
            .unwrap();
        assert_eq!(dir.list_all().unwrap(), vec!["_0.doc".to_string()]);

        let dir = MemoryDirectory::new();
        writer(
            &dir,
            &[FieldInfo::new("a", 0, IndexOptions::DocsAndFreqsAndPositions)],
        )
        .close()
        .unwrap();
        assert_eq!(dir.list_all().unwrap(), vec!["_0.doc", "_0.pos"]);

        let dir = MemoryDirectory::new();
        writer(
            &dir,
            &[FieldInfo::new("a", 0, IndexOptions::DocsAndFreqsAndPositions).with_payloads()],
        )
        .close()
        .unwrap();
        assert_eq!(dir.list_all().unwrap(), vec!["_0.doc", "_0.pay", "_0.pos"]);
    }

    #[test]
    fn test_longs_size() {
        let dir = MemoryDirectory::new();
        let fields = [
            FieldInfo::new("a", 0, IndexOptions::Docs),
            FieldInfo::new("b", 1, IndexOptions::DocsAndFreqsAndPositions),
            FieldInfo::new("c", 2, IndexOptions::DocsAndFreqsAndPositionsAndOffsets),
            FieldInfo::new("d", 3, IndexOptions::DocsAndFreqsAndPositions).with_payloads(),
        ];
        let mut w = writer(&dir, &fields);
        let sizes = fields
            .iter()
            .map(|f| w.set_field(f).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![1, 2, 3, 3]);
    }

    #[test]
    fn test_missing_stream_for_field() {
        let dir = MemoryDirectory::new();
        let mut w = writer(&dir, &[FieldInfo::new("a", 0, IndexOptions::DocsAndFreqs)]);
        let positional = FieldInfo::new("b", 1, IndexOptions::DocsAndFreqsAndPositions);
        let err = w.set_field(&positional).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_docs_out_of_order() {
        let dir = MemoryDirectory::new();
        let field = FieldInfo::new("a", 0, IndexOptions::DocsAndFreqs);
        let mut w = writer(&dir, &[field.clone()]);
        w.set_field(&field).unwrap();
        w.start_term();
        w.start_doc(10, 1).unwrap();
        w.finish_doc();
        let err = w.start_doc(10, 1).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::CorruptIndex { .. }));
    }

    #[test]
    fn test_positions_on_docs_field() {
        let dir = MemoryDirectory::new();
        let field = FieldInfo::new("a", 0, IndexOptions::DocsAndFreqs);
        let mut w = writer(&dir, &[field.clone()]);
        w.set_field(&field).unwrap();
        w.start_term();
        w.start_doc(1, 2).unwrap();
        let err = w.add_position(0, None, 0, 0).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    }

    #[test]
    fn test_term_stats_must_match() {
        let dir = MemoryDirectory::new();
        let field = FieldInfo::new("a", 0, IndexOptions::DocsAndFreqs);
        let mut w = writer(&dir, &[field.clone()]);
        w.set_field(&field).unwrap();
        w.start_term();
        for doc in 0..3 {
            w.start_doc(doc, 2).unwrap();
            w.finish_doc();
        }
        let err = w
            .finish_term(TermStats {
                doc_freq: 3,
                total_term_freq: 5,
            })
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_encode_term_deltas() {
        let dir = MemoryDirectory::new();
        let field = FieldInfo::new("a", 0, IndexOptions::DocsAndFreqsAndPositions);
        let mut w = writer(&dir, &[field.clone()]);
        let longs_size = w.set_field(&field).unwrap();

        let mut states = Vec::new();
        for term in 0..3u32 {
            w.start_term();
            for doc in 0..=term + 1 {
                w.start_doc(doc * 3, 1).unwrap();
                w.add_position(doc, None, 0, 0).unwrap();
                w.finish_doc();
            }
            states.push(
                w.finish_term(TermStats {
                    doc_freq: term + 2,
                    total_term_freq: term as u64 + 2,
                })
                .unwrap(),
            );
        }

        let mut longs = vec![0u64; longs_size];
        let mut meta = Vec::new();
        w.encode_term(&mut longs, &mut meta, &states[0], true).unwrap();
        assert_eq!(longs, vec![states[0].doc_start_fp, states[0].pos_start_fp]);
        w.encode_term(&mut longs, &mut meta, &states[1], false).unwrap();
        assert_eq!(
            longs,
            vec![
                states[1].doc_start_fp - states[0].doc_start_fp,
                states[1].pos_start_fp - states[0].pos_start_fp
            ]
        );
        // Nothing beyond the file pointers for small terms.
        assert!(meta.is_empty());

        w.encode_term(&mut longs, &mut meta, &states[2], true).unwrap();
        assert_eq!(longs, vec![states[2].doc_start_fp, states[2].pos_start_fp]);
        let err = w
            .encode_term(&mut longs, &mut meta, &states[0], false)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }
}
