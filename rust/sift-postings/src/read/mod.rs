//! Decode-time side: the per-segment [`PostingsReader`] and its enumerators.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sift_common::{Error, Result, verify_arg};
use sift_io::{DataInput, Directory, IndexInput, codec_util, segment_file_name};

use crate::for_util::ForUtil;
use crate::format::{
    BLOCK_SIZE, DOC_CODEC, DOC_EXTENSION, DocId, FieldInfo, FieldInfos, PAY_CODEC, PAY_EXTENSION,
    POS_CODEC, POS_EXTENSION, TERMS_CODEC, VERSION_CHECKSUM, VERSION_CURRENT, VERSION_META_ARRAY,
    VERSION_START,
};
use crate::iter::{DocIterator, DocsFlags, PositionIterator, PositionsFlags};
use crate::live_docs::LiveDocs;
use crate::term_state::IntBlockTermState;

mod cursor;
mod docs;
mod everything;
mod positions;

pub use docs::BlockDocsEnum;
pub use everything::EverythingEnum;
pub use positions::BlockDocsAndPositionsEnum;

use cursor::DocBlockCursor;

static NEXT_READER_ID: AtomicU64 = AtomicU64::new(1);

/// Reads the postings streams of one segment.
///
/// The reader owns the master cursors of `.doc`, `.pos` and `.pay`. Enumerators
/// clone them, so any number of enumerators may be alive at once, and the reader
/// itself is never moved by iteration.
#[derive(Debug)]
pub struct PostingsReader {
    id: u64,
    version: i32,
    doc_in: IndexInput,
    pos_in: Option<IndexInput>,
    pay_in: Option<IndexInput>,
    for_util: Arc<ForUtil>,
}

impl PostingsReader {
    /// Opens the streams of segment `segment` and validates their headers.
    ///
    /// `.pos` is opened when any field indexes positions, `.pay` when any field
    /// also indexes payloads or offsets. Both must carry the `.doc` version.
    pub fn open(
        dir: &dyn Directory,
        field_infos: &FieldInfos,
        segment: &str,
        suffix: &str,
    ) -> Result<PostingsReader> {
        let mut doc_in = dir.open_input(&segment_file_name(segment, suffix, DOC_EXTENSION))?;
        let version =
            codec_util::check_header(&mut doc_in, DOC_CODEC, VERSION_START, VERSION_CURRENT)?;
        let for_util = ForUtil::read(&mut doc_in)?;

        let (pos_in, pay_in) = if field_infos.has_positions() {
            let mut pos_in = dir.open_input(&segment_file_name(segment, suffix, POS_EXTENSION))?;
            codec_util::check_header(&mut pos_in, POS_CODEC, version, version)?;
            let pay_in = if field_infos.has_payloads() || field_infos.has_offsets() {
                let mut pay_in =
                    dir.open_input(&segment_file_name(segment, suffix, PAY_EXTENSION))?;
                codec_util::check_header(&mut pay_in, PAY_CODEC, version, version)?;
                Some(pay_in)
            } else {
                None
            };
            (Some(pos_in), pay_in)
        } else {
            (None, None)
        };

        log::debug!(
            "postings reader for segment {segment}: version {version}, doc={} bytes, pos={:?}, pay={:?}",
            doc_in.len(),
            pos_in.as_ref().map(IndexInput::len),
            pay_in.as_ref().map(IndexInput::len),
        );

        Ok(PostingsReader {
            id: NEXT_READER_ID.fetch_add(1, Ordering::Relaxed),
            version,
            doc_in,
            pos_in,
            pay_in,
            for_util: Arc::new(for_util),
        })
    }

    /// Format version of the segment's streams.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Validates the handshake written by
    /// [`PostingsWriter::init`](crate::PostingsWriter::init).
    pub fn init(&self, terms_in: &mut dyn DataInput) -> Result<()> {
        codec_util::check_header(terms_in, TERMS_CODEC, VERSION_START, VERSION_CURRENT)?;
        let block_size = terms_in.read_vint()?;
        if block_size as usize != BLOCK_SIZE {
            return Err(Error::invalid_format(
                "terms header",
                format!("index-time block size ({block_size}) != read-time block size ({BLOCK_SIZE})"),
            ));
        }
        Ok(())
    }

    pub fn new_term_state(&self) -> IntBlockTermState {
        IntBlockTermState::new()
    }

    /// Restores the writer-produced part of `state` from the term dictionary.
    /// `state.doc_freq` and `state.total_term_freq` must already be set.
    pub fn decode_term(
        &self,
        longs: &[u64],
        input: &mut dyn DataInput,
        field: &FieldInfo,
        state: &mut IntBlockTermState,
        absolute: bool,
    ) -> Result<()> {
        let caps = field.caps();
        if absolute {
            state.doc_start_fp = 0;
            state.pos_start_fp = 0;
            state.pay_start_fp = 0;
        }
        if self.version < VERSION_META_ARRAY {
            return decode_legacy_term(input, field, state);
        }

        verify_arg!(longs, longs.len() >= caps.longs_size());
        state.doc_start_fp = add_fp_delta(state.doc_start_fp, longs[0], DOC_EXTENSION)?;
        if caps.positions {
            state.pos_start_fp = add_fp_delta(state.pos_start_fp, longs[1], POS_EXTENSION)?;
            if caps.has_pay_data() {
                state.pay_start_fp = add_fp_delta(state.pay_start_fp, longs[2], PAY_EXTENSION)?;
            }
        }
        state.singleton_doc_id = if state.doc_freq == 1 {
            Some(input.read_vint()?)
        } else {
            None
        };
        state.last_pos_block_offset =
            if caps.positions && state.total_term_freq > BLOCK_SIZE as u64 {
                Some(input.read_vlong()?)
            } else {
                None
            };
        state.skip_offset = if state.doc_freq as usize > BLOCK_SIZE {
            Some(input.read_vlong()?)
        } else {
            None
        };
        Ok(())
    }

    /// Returns an enumerator over the documents of the term described by
    /// `state`, reusing `reuse` when it was created by this reader for a field
    /// with the same capabilities.
    pub fn docs(
        &self,
        field: &FieldInfo,
        state: &IntBlockTermState,
        live_docs: Option<Arc<dyn LiveDocs>>,
        flags: DocsFlags,
        reuse: Option<BlockDocsEnum>,
    ) -> Result<BlockDocsEnum> {
        let caps = field.caps();
        let mut docs = match reuse {
            Some(docs) if docs.cursor().can_reuse(self.id, caps) => docs,
            _ => BlockDocsEnum::new(self.doc_cursor(field)),
        };
        docs.reset(state, live_docs, flags)?;
        Ok(docs)
    }

    /// Returns an enumerator over the documents and positions of the term.
    ///
    /// The payload and offset streams are only read when `flags` requests them
    /// and the field indexes them. Fails with `InvalidOperation` for fields
    /// without positions.
    pub fn docs_and_positions(
        &self,
        field: &FieldInfo,
        state: &IntBlockTermState,
        live_docs: Option<Arc<dyn LiveDocs>>,
        flags: PositionsFlags,
        reuse: Option<DocsAndPositionsEnum>,
    ) -> Result<DocsAndPositionsEnum> {
        let caps = field.caps();
        if !caps.positions {
            return Err(Error::invalid_operation(format!(
                "field {} does not index positions",
                field.name
            )));
        }
        let pos_in = self.pos_in.as_ref().ok_or_else(|| missing_stream(POS_EXTENSION))?;

        let wants_offsets = caps.offsets && flags.contains(PositionsFlags::OFFSETS);
        let wants_payloads = caps.payloads && flags.contains(PositionsFlags::PAYLOADS);
        if !wants_offsets && !wants_payloads {
            let mut positions = match reuse {
                Some(DocsAndPositionsEnum::Positions(e)) if e.cursor().can_reuse(self.id, caps) => e,
                _ => BlockDocsAndPositionsEnum::new(self.doc_cursor(field), pos_in),
            };
            positions.reset(state, live_docs)?;
            Ok(DocsAndPositionsEnum::Positions(positions))
        } else {
            let pay_in = self.pay_in.as_ref().ok_or_else(|| missing_stream(PAY_EXTENSION))?;
            let mut everything = match reuse {
                Some(DocsAndPositionsEnum::Everything(e)) if e.cursor().can_reuse(self.id, caps) => e,
                _ => EverythingEnum::new(self.doc_cursor(field), pos_in, pay_in),
            };
            everything.reset(state, live_docs, flags)?;
            Ok(DocsAndPositionsEnum::Everything(everything))
        }
    }

    /// Verifies the footer checksum of every stream. A no-op for segments
    /// written before checksums were introduced.
    pub fn check_integrity(&self) -> Result<()> {
        if self.version < VERSION_CHECKSUM {
            return Ok(());
        }
        let doc = codec_util::checksum_entire_file(&self.doc_in)?;
        let pos = self
            .pos_in
            .as_ref()
            .map(codec_util::checksum_entire_file)
            .transpose()?;
        let pay = self
            .pay_in
            .as_ref()
            .map(codec_util::checksum_entire_file)
            .transpose()?;
        log::debug!("postings checksums verified: doc={doc:#x}, pos={pos:x?}, pay={pay:x?}");
        Ok(())
    }

    fn doc_cursor(&self, field: &FieldInfo) -> DocBlockCursor {
        DocBlockCursor::new(self.id, self.for_util.clone(), &self.doc_in, field.caps())
    }
}

/// Term metadata layout of segments older than `VERSION_META_ARRAY`, where
/// every file pointer delta is inline.
fn decode_legacy_term(
    input: &mut dyn DataInput,
    field: &FieldInfo,
    state: &mut IntBlockTermState,
) -> Result<()> {
    let caps = field.caps();
    if state.doc_freq == 1 {
        state.singleton_doc_id = Some(input.read_vint()?);
    } else {
        state.singleton_doc_id = None;
        state.doc_start_fp = add_fp_delta(state.doc_start_fp, input.read_vlong()?, DOC_EXTENSION)?;
    }
    state.last_pos_block_offset = None;
    if caps.positions {
        state.pos_start_fp = add_fp_delta(state.pos_start_fp, input.read_vlong()?, POS_EXTENSION)?;
        state.last_pos_block_offset = if state.total_term_freq > BLOCK_SIZE as u64 {
            Some(input.read_vlong()?)
        } else {
            None
        };
        if caps.has_pay_data() && state.total_term_freq >= BLOCK_SIZE as u64 {
            state.pay_start_fp = add_fp_delta(state.pay_start_fp, input.read_vlong()?, PAY_EXTENSION)?;
        }
    }
    state.skip_offset = if state.doc_freq as usize > BLOCK_SIZE {
        Some(input.read_vlong()?)
    } else {
        None
    };
    Ok(())
}

fn add_fp_delta(fp: u64, delta: u64, ext: &str) -> Result<u64> {
    fp.checked_add(delta).ok_or_else(|| {
        Error::invalid_format(
            "term metadata",
            format!(".{ext} file pointer {fp} + {delta} overflows"),
        )
    })
}

fn missing_stream(ext: &str) -> Error {
    Error::invalid_operation(format!("segment has no .{ext} stream"))
}

/// A positions enumerator, of whichever variant the requested data needs.
pub enum DocsAndPositionsEnum {
    Positions(BlockDocsAndPositionsEnum),
    Everything(EverythingEnum),
}

impl DocIterator for DocsAndPositionsEnum {
    fn doc_id(&self) -> DocId {
        match self {
            DocsAndPositionsEnum::Positions(e) => e.doc_id(),
            DocsAndPositionsEnum::Everything(e) => e.doc_id(),
        }
    }

    fn freq(&self) -> u32 {
        match self {
            DocsAndPositionsEnum::Positions(e) => e.freq(),
            DocsAndPositionsEnum::Everything(e) => e.freq(),
        }
    }

    fn next_doc(&mut self) -> Result<DocId> {
        match self {
            DocsAndPositionsEnum::Positions(e) => e.next_doc(),
            DocsAndPositionsEnum::Everything(e) => e.next_doc(),
        }
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        match self {
            DocsAndPositionsEnum::Positions(e) => e.advance(target),
            DocsAndPositionsEnum::Everything(e) => e.advance(target),
        }
    }

    fn cost(&self) -> u64 {
        match self {
            DocsAndPositionsEnum::Positions(e) => e.cost(),
            DocsAndPositionsEnum::Everything(e) => e.cost(),
        }
    }
}

impl PositionIterator for DocsAndPositionsEnum {
    fn next_position(&mut self) -> Result<u32> {
        match self {
            DocsAndPositionsEnum::Positions(e) => e.next_position(),
            DocsAndPositionsEnum::Everything(e) => e.next_position(),
        }
    }

    fn start_offset(&self) -> Option<u32> {
        match self {
            DocsAndPositionsEnum::Positions(e) => e.start_offset(),
            DocsAndPositionsEnum::Everything(e) => e.start_offset(),
        }
    }

    fn end_offset(&self) -> Option<u32> {
        match self {
            DocsAndPositionsEnum::Positions(e) => e.end_offset(),
            DocsAndPositionsEnum::Everything(e) => e.end_offset(),
        }
    }

    fn payload(&self) -> Option<&[u8]> {
        match self {
            DocsAndPositionsEnum::Positions(e) => e.payload(),
            DocsAndPositionsEnum::Everything(e) => e.payload(),
        }
    }
}
