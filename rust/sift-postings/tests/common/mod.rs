#![allow(dead_code)]

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sift_common::Result;
use sift_io::{
    ByteArrayInput, DataInput, DataOutput, Directory, IndexInput, IndexOutput, MemoryDirectory,
    StreamSource, segment_file_name,
};
use sift_postings::{
    DocId, DocIterator, FieldInfo, FieldInfos, IntBlockTermState, NO_MORE_DOCS, PositionIterator,
    PostingsReader, PostingsWriter, PostingsWriterOptions, TermStats,
};

pub const SEGMENT: &str = "_0";
pub const TERMS_EXTENSION: &str = "tmd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub position: u32,
    pub payload: Option<Vec<u8>>,
    pub start_offset: u32,
    pub end_offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub doc: DocId,
    pub freq: u32,
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone)]
pub struct Term {
    pub field: FieldInfo,
    pub postings: Vec<Posting>,
}

impl Term {
    pub fn new(field: &FieldInfo, postings: Vec<Posting>) -> Term {
        Term {
            field: field.clone(),
            postings,
        }
    }

    pub fn total_term_freq(&self) -> u64 {
        self.postings.iter().map(|p| p.freq as u64).sum()
    }

    pub fn docs(&self) -> Vec<DocId> {
        self.postings.iter().map(|p| p.doc).collect()
    }
}

/// Generates `doc_freq` postings with random gaps, frequencies, positions,
/// payloads and offsets, as far as `field` indexes them.
pub fn random_postings(rng: &mut fastrand::Rng, field: &FieldInfo, doc_freq: usize) -> Vec<Posting> {
    let max_gap = rng.u32(1..=40);
    let mut doc = rng.u32(0..50);
    let mut postings = Vec::with_capacity(doc_freq);
    for i in 0..doc_freq {
        if i > 0 {
            doc += rng.u32(1..=max_gap);
        }
        let freq = if field.has_freqs() { rng.u32(1..=6) } else { 1 };
        let occurrences = if field.has_positions() {
            random_occurrences(rng, field, freq)
        } else {
            Vec::new()
        };
        postings.push(Posting {
            doc,
            freq,
            occurrences,
        });
    }
    postings
}

fn random_occurrences(rng: &mut fastrand::Rng, field: &FieldInfo, freq: u32) -> Vec<Occurrence> {
    let mut position = 0;
    let mut start_offset = 0;
    (0..freq)
        .map(|_| {
            position += rng.u32(0..=20);
            let payload = if field.has_payloads() && rng.u8(0..3) != 0 {
                Some((0..rng.usize(0..=6)).map(|_| rng.u8(..)).collect())
            } else {
                None
            };
            let (start, end) = if field.has_offsets() {
                start_offset += rng.u32(0..=10);
                (start_offset, start_offset + rng.u32(0..=8))
            } else {
                (0, 0)
            };
            Occurrence {
                position,
                payload,
                start_offset: start,
                end_offset: end,
            }
        })
        .collect()
}

/// Writes the postings of `terms` to `dir`, plus a term metadata stream the
/// way a terms dictionary would store it. Terms of a field must be adjacent.
pub fn write_segment(
    dir: &dyn Directory,
    field_infos: &FieldInfos,
    terms: &[Term],
    options: PostingsWriterOptions,
) -> Result<Vec<IntBlockTermState>> {
    let mut writer = PostingsWriter::create(dir, SEGMENT, "", field_infos, options)?;
    let mut terms_out = dir.create_output(&segment_file_name(SEGMENT, "", TERMS_EXTENSION))?;
    writer.init(&mut terms_out)?;

    let mut states = Vec::with_capacity(terms.len());
    let mut current_field: Option<u32> = None;
    let mut longs_size = 0;
    for term in terms {
        if current_field != Some(term.field.number) {
            longs_size = writer.set_field(&term.field)?;
            current_field = Some(term.field.number);
        }
        writer.start_term();
        for posting in &term.postings {
            writer.start_doc(posting.doc, posting.freq)?;
            for occ in &posting.occurrences {
                writer.add_position(
                    occ.position,
                    occ.payload.as_deref(),
                    occ.start_offset,
                    occ.end_offset,
                )?;
            }
            writer.finish_doc();
        }
        let state = writer.finish_term(TermStats {
            doc_freq: term.postings.len() as u32,
            total_term_freq: term.total_term_freq(),
        })?;

        let mut longs = vec![0u64; longs_size];
        let mut meta = Vec::new();
        writer.encode_term(&mut longs, &mut meta, &state, false)?;
        write_term_entry(&mut terms_out, &term.field, &state, &longs, &meta)?;
        states.push(state);
    }
    writer.close()?;
    terms_out.close()?;
    Ok(states)
}

pub fn write_term_entry(
    out: &mut IndexOutput,
    field: &FieldInfo,
    state: &IntBlockTermState,
    longs: &[u64],
    meta: &[u8],
) -> Result<()> {
    out.write_vint(field.number)?;
    out.write_vint(state.doc_freq)?;
    out.write_vlong(state.total_term_freq)?;
    out.write_vint(longs.len() as u32)?;
    for &long in longs {
        out.write_vlong(long)?;
    }
    out.write_vint(meta.len() as u32)?;
    out.write_bytes(meta)
}

/// Reads back the term metadata stream written by [`write_segment`].
pub fn read_term_states(
    dir: &dyn Directory,
    reader: &PostingsReader,
    field_infos: &FieldInfos,
    term_count: usize,
) -> Result<Vec<IntBlockTermState>> {
    let mut input = dir.open_input(&segment_file_name(SEGMENT, "", TERMS_EXTENSION))?;
    reader.init(&mut input)?;

    let mut states = Vec::with_capacity(term_count);
    let mut current_field: Option<u32> = None;
    let mut state = reader.new_term_state();
    for _ in 0..term_count {
        let number = input.read_vint()?;
        let field = field_infos
            .iter()
            .find(|f| f.number == number)
            .expect("unknown field number");
        let absolute = current_field != Some(number);
        current_field = Some(number);

        state.doc_freq = input.read_vint()?;
        state.total_term_freq = input.read_vlong()?;
        let longs = (0..input.read_vint()?)
            .map(|_| input.read_vlong())
            .collect::<Result<Vec<_>>>()?;
        let mut meta = vec![0u8; input.read_vint()? as usize];
        input.read_bytes(&mut meta)?;

        reader.decode_term(&longs, &mut ByteArrayInput::new(meta), field, &mut state, absolute)?;
        states.push(state.clone());
    }
    Ok(states)
}

/// Writes `terms` into a fresh memory directory and opens a reader over it.
pub fn build_segment(
    field_infos: &FieldInfos,
    terms: &[Term],
) -> (MemoryDirectory, PostingsReader, Vec<IntBlockTermState>) {
    let dir = MemoryDirectory::new();
    let written = write_segment(&dir, field_infos, terms, Default::default()).unwrap();
    let reader = PostingsReader::open(&dir, field_infos, SEGMENT, "").unwrap();
    let states = read_term_states(&dir, &reader, field_infos, terms.len()).unwrap();
    assert_eq!(states, written);
    (dir, reader, states)
}

pub fn collect_docs(docs: &mut dyn DocIterator) -> Vec<(DocId, u32)> {
    let mut result = Vec::new();
    loop {
        let doc = docs.next_doc().unwrap();
        if doc == NO_MORE_DOCS {
            return result;
        }
        result.push((doc, docs.freq()));
    }
}

/// Reads the positions of the current document, returning them in the shape
/// the expected occurrences take once `offsets`/`payloads` visibility is
/// applied.
pub fn read_occurrences(positions: &mut dyn PositionIterator) -> Vec<Occurrence> {
    (0..positions.freq())
        .map(|_| {
            let position = positions.next_position().unwrap();
            Occurrence {
                position,
                payload: positions.payload().map(<[u8]>::to_vec),
                start_offset: positions.start_offset().unwrap_or(0),
                end_offset: positions.end_offset().unwrap_or(0),
            }
        })
        .collect()
}

/// The occurrences an enumerator reports when offsets or payloads are only
/// visible if requested. Empty payloads are reported as absent.
pub fn visible(occurrences: &[Occurrence], offsets: bool, payloads: bool) -> Vec<Occurrence> {
    occurrences
        .iter()
        .map(|occ| Occurrence {
            position: occ.position,
            payload: if payloads {
                occ.payload.clone().filter(|p| !p.is_empty())
            } else {
                None
            },
            start_offset: if offsets { occ.start_offset } else { 0 },
            end_offset: if offsets { occ.end_offset } else { 0 },
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct ReadStats {
    pub reads: AtomicU64,
    pub bytes: AtomicU64,
    pub min_offset: AtomicU64,
}

impl ReadStats {
    pub fn reset(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.bytes.store(0, Ordering::SeqCst);
        self.min_offset.store(u64::MAX, Ordering::SeqCst);
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::SeqCst)
    }

    pub fn min_offset(&self) -> u64 {
        self.min_offset.load(Ordering::SeqCst)
    }
}

struct CountingSource {
    data: Vec<u8>,
    stats: Arc<ReadStats>,
}

impl StreamSource for CountingSource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_range(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        let start = (range.start as usize).min(self.data.len());
        let end = (range.end as usize).min(self.data.len());
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        self.stats
            .bytes
            .fetch_add((end - start) as u64, Ordering::SeqCst);
        self.stats.min_offset.fetch_min(range.start, Ordering::SeqCst);
        Ok(self.data[start..end].to_vec())
    }

    fn max_read_size(&self) -> usize {
        64
    }
}

/// Memory directory that records the reads issued against streams of one
/// extension, in small I/O units.
#[derive(Clone)]
pub struct CountingDirectory {
    inner: MemoryDirectory,
    extension: String,
    stats: Arc<ReadStats>,
}

impl CountingDirectory {
    pub fn new(inner: MemoryDirectory, extension: &str) -> CountingDirectory {
        let stats = Arc::new(ReadStats::default());
        stats.reset();
        CountingDirectory {
            inner,
            extension: format!(".{extension}"),
            stats,
        }
    }

    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }
}

impl Directory for CountingDirectory {
    fn create_output(&self, name: &str) -> Result<IndexOutput> {
        self.inner.create_output(name)
    }

    fn open_input(&self, name: &str) -> Result<IndexInput> {
        if !name.ends_with(&self.extension) {
            return self.inner.open_input(name);
        }
        let source = CountingSource {
            data: self.inner.file_bytes(name)?,
            stats: self.stats.clone(),
        };
        IndexInput::open(name, Arc::new(source))
    }

    fn file_exists(&self, name: &str) -> Result<bool> {
        self.inner.file_exists(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.inner.delete_file(name)
    }

    fn list_all(&self) -> Result<Vec<String>> {
        self.inner.list_all()
    }
}
