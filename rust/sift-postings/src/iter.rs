//! Capabilities shared by the postings enumerators.

use bitflags::bitflags;
use sift_common::Result;

use crate::format::DocId;

bitflags! {
    /// Optional data requested from a document enumerator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DocsFlags: u32 {
        /// Decode term frequencies. Without it [`DocIterator::freq`] is only
        /// meaningful for fields that do not index frequencies.
        const FREQS = 1;
    }
}

bitflags! {
    /// Optional data requested from a position enumerator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PositionsFlags: u32 {
        const OFFSETS = 1;
        const PAYLOADS = 2;
    }
}

/// Forward-only cursor over the documents of a term, in increasing order.
pub trait DocIterator {
    /// Current document, [`UNPOSITIONED`](crate::UNPOSITIONED) before the first
    /// move and [`NO_MORE_DOCS`](crate::NO_MORE_DOCS) once exhausted.
    fn doc_id(&self) -> DocId;

    /// Occurrences of the term in the current document.
    fn freq(&self) -> u32;

    /// Moves to the next live document.
    fn next_doc(&mut self) -> Result<DocId>;

    /// Moves to the first live document at or after `target`, which must be
    /// greater than the current document.
    fn advance(&mut self, target: DocId) -> Result<DocId>;

    /// Upper bound on the number of documents this cursor visits.
    fn cost(&self) -> u64;
}

/// Document cursor that also walks the positions of each document.
pub trait PositionIterator: DocIterator {
    /// Returns the next position of the current document. May be called at
    /// most `freq()` times per document.
    fn next_position(&mut self) -> Result<u32>;

    /// Start offset of the current position, if offsets were requested and
    /// are indexed.
    fn start_offset(&self) -> Option<u32>;

    fn end_offset(&self) -> Option<u32>;

    /// Payload of the current position, if payloads were requested and the
    /// position has one.
    fn payload(&self) -> Option<&[u8]>;
}
