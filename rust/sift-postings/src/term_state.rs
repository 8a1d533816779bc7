/// Where a term's postings live and how to read them.
///
/// `doc_freq` and `total_term_freq` are tracked by the term dictionary; the
/// remaining fields are produced by the writer and round-trip through
/// [`PostingsWriter::encode_term`](crate::PostingsWriter::encode_term) and
/// [`PostingsReader::decode_term`](crate::PostingsReader::decode_term).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntBlockTermState {
    pub doc_freq: u32,
    /// Sum of the term's frequencies. Equals `doc_freq` for fields without
    /// frequencies.
    pub total_term_freq: u64,
    pub doc_start_fp: u64,
    pub pos_start_fp: u64,
    pub pay_start_fp: u64,
    /// Offset of the skip list from `doc_start_fp`, present when the term has
    /// more than one block of documents.
    pub skip_offset: Option<u64>,
    /// Offset from `pos_start_fp` of the trailing, vint-encoded positions,
    /// present when the term has more than one block of positions.
    pub last_pos_block_offset: Option<u64>,
    /// The only document of a term with `doc_freq == 1`. Such a term has no
    /// data in the `.doc` stream.
    pub singleton_doc_id: Option<u32>,
}

impl IntBlockTermState {
    pub fn new() -> IntBlockTermState {
        Default::default()
    }

    /// Copies everything, statistics included, from `other`.
    pub fn copy_from(&mut self, other: &IntBlockTermState) {
        self.clone_from(other);
    }
}
