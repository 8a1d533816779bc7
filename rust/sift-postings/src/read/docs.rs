use std::sync::Arc;

use sift_common::Result;

use super::cursor::DocBlockCursor;
use crate::format::{DocId, NO_MORE_DOCS};
use crate::iter::{DocIterator, DocsFlags};
use crate::live_docs::LiveDocs;
use crate::term_state::IntBlockTermState;

/// Enumerates documents and frequencies, never touching `.pos` or `.pay`.
pub struct BlockDocsEnum {
    docs: DocBlockCursor,
}

impl BlockDocsEnum {
    pub(crate) fn new(docs: DocBlockCursor) -> BlockDocsEnum {
        BlockDocsEnum { docs }
    }

    pub(crate) fn cursor(&self) -> &DocBlockCursor {
        &self.docs
    }

    /// Repositions the enumerator on another term of the same field.
    pub(crate) fn reset(
        &mut self,
        state: &IntBlockTermState,
        live_docs: Option<Arc<dyn LiveDocs>>,
        flags: DocsFlags,
    ) -> Result<()> {
        self.docs
            .reset(state, live_docs, flags.contains(DocsFlags::FREQS))
    }
}

impl DocIterator for BlockDocsEnum {
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
            if self.docs.is_live(self.docs.accum) {
                self.docs.doc = self.docs.accum;
                return Ok(self.docs.doc);
            }
        }
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.docs.skip_to(target)?;
        loop {
            if !self.docs.read_next()? {
                self.docs.doc = NO_MORE_DOCS;
                return Ok(NO_MORE_DOCS);
            }
            if self.docs.accum >= target {
                break;
            }
        }
        if self.docs.is_live(self.docs.accum) {
            self.docs.doc = self.docs.accum;
            Ok(self.docs.doc)
        } else {
            self.next_doc()
        }
    }

    fn cost(&self) -> u64 {
        self.docs.doc_freq as u64
    }
}
