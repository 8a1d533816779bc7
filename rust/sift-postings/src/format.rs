//! Constants and field metadata shared by the postings writer and reader.

/// Document identifier within a segment.
pub type DocId = u32;

/// Sentinel returned by document iterators once they are exhausted.
pub const NO_MORE_DOCS: DocId = i32::MAX as DocId;

/// Reported by [`DocIterator::doc_id`](crate::DocIterator::doc_id) before the
/// first call to `next_doc` or `advance`.
pub const UNPOSITIONED: DocId = DocId::MAX;

/// Number of values in a packed block. Must be a multiple of 64.
pub const BLOCK_SIZE: usize = 128;

/// Upper bound on the number of levels in a term's skip list.
pub const MAX_SKIP_LEVELS: usize = 10;

/// Every entry on skip level `n + 1` covers this many entries on level `n`.
pub const SKIP_MULTIPLIER: u32 = 8;

pub const DOC_EXTENSION: &str = "doc";
pub const POS_EXTENSION: &str = "pos";
pub const PAY_EXTENSION: &str = "pay";

pub const TERMS_CODEC: &str = "SiftPostingsTerms";
pub const DOC_CODEC: &str = "SiftPostingsDoc";
pub const POS_CODEC: &str = "SiftPostingsPos";
pub const PAY_CODEC: &str = "SiftPostingsPay";

/// Initial layout: per-term file pointers are stored as deltas in the term
/// metadata bytes.
pub const VERSION_START: i32 = 0;

/// File pointer deltas moved into the term dictionary's "longs" array.
pub const VERSION_META_ARRAY: i32 = 1;

/// Streams carry a checksum footer.
pub const VERSION_CHECKSUM: i32 = 2;

pub const VERSION_CURRENT: i32 = VERSION_CHECKSUM;

/// What is indexed for each occurrence of a term in a field. Variants are ordered,
/// each one including everything the previous ones record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexOptions {
    Docs,
    DocsAndFreqs,
    DocsAndFreqsAndPositions,
    DocsAndFreqsAndPositionsAndOffsets,
}

impl IndexOptions {
    pub fn has_freqs(self) -> bool {
        self >= IndexOptions::DocsAndFreqs
    }

    pub fn has_positions(self) -> bool {
        self >= IndexOptions::DocsAndFreqsAndPositions
    }

    pub fn has_offsets(self) -> bool {
        self >= IndexOptions::DocsAndFreqsAndPositionsAndOffsets
    }
}

/// Per-field indexing capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub number: u32,
    pub index_options: IndexOptions,
    /// Positions of this field may carry payloads. Ignored unless positions
    /// are indexed.
    pub store_payloads: bool,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, number: u32, index_options: IndexOptions) -> FieldInfo {
        FieldInfo {
            name: name.into(),
            number,
            index_options,
            store_payloads: false,
        }
    }

    pub fn with_payloads(mut self) -> FieldInfo {
        self.store_payloads = true;
        self
    }

    pub fn has_freqs(&self) -> bool {
        self.index_options.has_freqs()
    }

    pub fn has_positions(&self) -> bool {
        self.index_options.has_positions()
    }

    pub fn has_offsets(&self) -> bool {
        self.index_options.has_offsets()
    }

    pub fn has_payloads(&self) -> bool {
        self.has_positions() && self.store_payloads
    }

    pub(crate) fn caps(&self) -> FieldCaps {
        FieldCaps {
            freqs: self.has_freqs(),
            positions: self.has_positions(),
            offsets: self.has_offsets(),
            payloads: self.has_payloads(),
        }
    }
}

/// The fields of a segment. Decides which of the position and payload streams
/// exist.
#[derive(Debug, Clone, Default)]
pub struct FieldInfos {
    fields: Vec<FieldInfo>,
}

impl FieldInfos {
    pub fn new(fields: Vec<FieldInfo>) -> FieldInfos {
        FieldInfos { fields }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter()
    }

    pub fn by_name(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_positions(&self) -> bool {
        self.fields.iter().any(FieldInfo::has_positions)
    }

    pub fn has_payloads(&self) -> bool {
        self.fields.iter().any(FieldInfo::has_payloads)
    }

    pub fn has_offsets(&self) -> bool {
        self.fields.iter().any(FieldInfo::has_offsets)
    }

    /// Whether the segment needs a `.pay` stream.
    pub fn needs_pay_stream(&self) -> bool {
        self.has_positions() && (self.has_payloads() || self.has_offsets())
    }
}

/// Flattened capability flags of a single field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FieldCaps {
    pub freqs: bool,
    pub positions: bool,
    pub offsets: bool,
    pub payloads: bool,
}

impl FieldCaps {
    /// Whether positions of this field have data in the `.pay` stream.
    pub fn has_pay_data(&self) -> bool {
        self.positions && (self.offsets || self.payloads)
    }

    /// Number of file pointers a term of this field starts at.
    pub fn longs_size(&self) -> usize {
        match (self.positions, self.has_pay_data()) {
            (false, _) => 1,
            (true, false) => 2,
            (true, true) => 3,
        }
    }
}
