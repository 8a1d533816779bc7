//! Block-based postings lists.
//!
//! For every term of an inverted index, the postings record which documents
//! contain it, how often, and optionally at which positions, with which payloads
//! and at which character offsets. They are spread over three streams per
//! segment:
//!
//! - `.doc`: document deltas and frequencies, in packed blocks of 128 followed by
//!   a vint-encoded tail, plus a multi-level skip list per term with more than
//!   one block.
//! - `.pos`: position deltas, same block discipline. The vint tail also holds
//!   payloads and offsets.
//! - `.pay`: payload lengths and bytes and offsets belonging to full position
//!   blocks.
//!
//! [`PostingsWriter`] produces the streams and, per term, a small
//! [`IntBlockTermState`] the terms dictionary stores. [`PostingsReader`] turns
//! that state back into enumerators implementing [`DocIterator`] and
//! [`PositionIterator`].

pub mod for_util;
pub mod format;
pub mod iter;
pub mod live_docs;
pub mod read;
pub mod skip;
pub mod term_state;
pub mod writer;

pub use for_util::{BlockEncoding, ForUtil};
pub use format::{
    BLOCK_SIZE, DocId, FieldInfo, FieldInfos, IndexOptions, NO_MORE_DOCS, UNPOSITIONED,
};
pub use iter::{DocIterator, DocsFlags, PositionIterator, PositionsFlags};
pub use live_docs::LiveDocs;
pub use read::{
    BlockDocsAndPositionsEnum, BlockDocsEnum, DocsAndPositionsEnum, EverythingEnum,
    PostingsReader,
};
pub use term_state::IntBlockTermState;
pub use writer::{PostingsWriter, PostingsWriterOptions, TermStats};
