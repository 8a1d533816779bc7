mod common;

use sift_common::ErrorKind;
use sift_io::{DataInput, Directory, MemoryDirectory, codec_util, segment_file_name};
use sift_postings::for_util::{MAX_DATA_SIZE, MAX_ENCODED_SIZE};
use sift_postings::format::{
    DOC_CODEC, DOC_EXTENSION, POS_CODEC, SKIP_MULTIPLIER, VERSION_CURRENT, VERSION_START,
};
use sift_postings::skip::multi_level_writer::level_count;
use sift_postings::{
    BLOCK_SIZE, DocIterator, DocsAndPositionsEnum, DocsFlags, FieldInfo, FieldInfos, ForUtil,
    IndexOptions, NO_MORE_DOCS, PositionIterator, PositionsFlags, PostingsReader,
};

use common::{
    CountingDirectory, Occurrence, Posting, SEGMENT, Term, build_segment, random_postings,
    read_occurrences, read_term_states, visible, write_segment,
};

fn positions_field() -> FieldInfo {
    FieldInfo::new("body", 0, IndexOptions::DocsAndFreqsAndPositions)
}

fn payloads_field() -> FieldInfo {
    FieldInfo::new("tags", 1, IndexOptions::DocsAndFreqsAndPositions).with_payloads()
}

fn offsets_field() -> FieldInfo {
    FieldInfo::new("text", 2, IndexOptions::DocsAndFreqsAndPositionsAndOffsets)
}

fn full_field() -> FieldInfo {
    FieldInfo::new("all", 3, IndexOptions::DocsAndFreqsAndPositionsAndOffsets).with_payloads()
}

const ALL_FLAGS: [PositionsFlags; 4] = [
    PositionsFlags::empty(),
    PositionsFlags::OFFSETS,
    PositionsFlags::PAYLOADS,
    PositionsFlags::all(),
];

fn random_terms(rng: &mut fastrand::Rng, field: &FieldInfo) -> Vec<Term> {
    [1, 3, 60, 128, 129, 400, 2500]
        .into_iter()
        .map(|df| Term::new(field, random_postings(rng, field, df)))
        .collect()
}

/// Walks every document, reading the positions of a random subset of them so
/// that pending positions pile up between reads.
fn check_sequential(
    positions: &mut DocsAndPositionsEnum,
    term: &Term,
    offsets: bool,
    payloads: bool,
    rng: &mut fastrand::Rng,
) {
    for posting in &term.postings {
        assert_eq!(positions.next_doc().unwrap(), posting.doc);
        assert_eq!(positions.freq(), posting.freq);
        if rng.u8(0..3) != 0 {
            assert_eq!(
                read_occurrences(positions),
                visible(&posting.occurrences, offsets, payloads),
                "doc {}",
                posting.doc
            );
        }
    }
    assert_eq!(positions.next_doc().unwrap(), NO_MORE_DOCS);
}

fn check_advance(
    positions: &mut DocsAndPositionsEnum,
    term: &Term,
    offsets: bool,
    payloads: bool,
    rng: &mut fastrand::Rng,
) {
    let last = term.postings.last().unwrap().doc;
    let mut target = 0;
    loop {
        target += rng.u32(1..=last / 10 + 2);
        let doc = positions.advance(target).unwrap();
        let Some(posting) = term.postings.iter().find(|p| p.doc >= target) else {
            assert_eq!(doc, NO_MORE_DOCS);
            return;
        };
        assert_eq!(doc, posting.doc, "advance({target})");
        assert_eq!(positions.freq(), posting.freq);
        if rng.bool() {
            let expected = visible(&posting.occurrences, offsets, payloads);
            // Reading only a prefix must not disturb the next document.
            let take = rng.usize(1..=expected.len());
            for occ in &expected[..take] {
                assert_eq!(positions.next_position().unwrap(), occ.position);
                assert_eq!(positions.payload(), occ.payload.as_deref());
                if offsets {
                    assert_eq!(positions.start_offset(), Some(occ.start_offset));
                    assert_eq!(positions.end_offset(), Some(occ.end_offset));
                } else {
                    assert_eq!(positions.start_offset(), None);
                }
            }
        }
        target = doc;
    }
}

fn check_field(field: FieldInfo, seed: u64) {
    let mut rng = fastrand::Rng::with_seed(seed);
    let terms = random_terms(&mut rng, &field);
    let field_infos = FieldInfos::new(vec![field.clone()]);
    let (_dir, reader, states) = build_segment(&field_infos, &terms);

    for flags in ALL_FLAGS {
        let offsets = field.has_offsets() && flags.contains(PositionsFlags::OFFSETS);
        let payloads = field.has_payloads() && flags.contains(PositionsFlags::PAYLOADS);
        let mut reuse = None;
        for (term, state) in terms.iter().zip(&states) {
            let mut positions = reader
                .docs_and_positions(&field, state, None, flags, reuse.take())
                .unwrap();
            assert_eq!(
                matches!(positions, DocsAndPositionsEnum::Everything(_)),
                offsets || payloads
            );
            check_sequential(&mut positions, term, offsets, payloads, &mut rng);

            let mut positions = reader
                .docs_and_positions(&field, state, None, flags, Some(positions))
                .unwrap();
            check_advance(&mut positions, term, offsets, payloads, &mut rng);
            reuse = Some(positions);
        }
    }
}

#[test]
fn test_positions_only() {
    check_field(positions_field(), 41);
}

#[test]
fn test_payloads() {
    check_field(payloads_field(), 43);
}

#[test]
fn test_offsets() {
    check_field(offsets_field(), 47);
}

#[test]
fn test_payloads_and_offsets() {
    check_field(full_field(), 53);
}

#[test]
fn test_docs_of_positional_field() {
    let mut rng = fastrand::Rng::with_seed(59);
    let field = full_field();
    let terms = random_terms(&mut rng, &field);
    let field_infos = FieldInfos::new(vec![field.clone()]);
    let (_dir, reader, states) = build_segment(&field_infos, &terms);

    for (term, state) in terms.iter().zip(&states) {
        let mut docs = reader
            .docs(&field, state, None, DocsFlags::FREQS, None)
            .unwrap();
        let expected = term
            .postings
            .iter()
            .map(|p| (p.doc, p.freq))
            .collect::<Vec<_>>();
        assert_eq!(common::collect_docs(&mut docs), expected);
    }
}

#[test]
fn test_mixed_fields_share_streams() {
    let mut rng = fastrand::Rng::with_seed(61);
    let fields = [
        FieldInfo::new("id", 5, IndexOptions::Docs),
        positions_field(),
        full_field(),
        FieldInfo::new("count", 4, IndexOptions::DocsAndFreqs),
        payloads_field(),
    ];
    let terms = fields
        .iter()
        .flat_map(|field| {
            [2, 300, 130]
                .into_iter()
                .map(|df| Term::new(field, random_postings(&mut rng, field, df)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let field_infos = FieldInfos::new(fields.to_vec());
    let (_dir, reader, states) = build_segment(&field_infos, &terms);

    for (term, state) in terms.iter().zip(&states) {
        if term.field.has_positions() {
            let mut positions = reader
                .docs_and_positions(&term.field, state, None, PositionsFlags::all(), None)
                .unwrap();
            for posting in &term.postings {
                assert_eq!(positions.next_doc().unwrap(), posting.doc);
                assert_eq!(
                    read_occurrences(&mut positions),
                    visible(
                        &posting.occurrences,
                        term.field.has_offsets(),
                        term.field.has_payloads()
                    )
                );
            }
            assert_eq!(positions.next_doc().unwrap(), NO_MORE_DOCS);
        } else {
            let err = reader
                .docs_and_positions(&term.field, state, None, PositionsFlags::all(), None)
                .err()
                .expect("field without positions");
            assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
        }
    }
}

#[test]
fn test_empty_payloads_are_absent() {
    let field = payloads_field();
    let postings = (0..300u32)
        .map(|doc| Posting {
            doc,
            freq: 2,
            occurrences: vec![
                Occurrence {
                    position: 1,
                    payload: Some(Vec::new()),
                    start_offset: 0,
                    end_offset: 0,
                },
                Occurrence {
                    position: 4,
                    payload: (doc % 2 == 0).then(|| vec![doc as u8, 7]),
                    start_offset: 0,
                    end_offset: 0,
                },
            ],
        })
        .collect::<Vec<_>>();
    let terms = vec![Term::new(&field, postings)];
    let field_infos = FieldInfos::new(vec![field.clone()]);
    let (_dir, reader, states) = build_segment(&field_infos, &terms);

    let mut positions = reader
        .docs_and_positions(&field, &states[0], None, PositionsFlags::PAYLOADS, None)
        .unwrap();
    for doc in 0..300u32 {
        assert_eq!(positions.next_doc().unwrap(), doc);
        assert_eq!(positions.next_position().unwrap(), 1);
        assert_eq!(positions.payload(), None);
        assert_eq!(positions.next_position().unwrap(), 4);
        let expected = (doc % 2 == 0).then(|| vec![doc as u8, 7]);
        assert_eq!(positions.payload(), expected.as_deref());
    }
}

#[test]
fn test_advance_uses_skip_data() {
    let field = positions_field();
    let postings = (0..300u32)
        .map(|doc| {
            let freq = if doc % 2 == 0 { 1 } else { 3 };
            Posting {
                doc,
                freq,
                occurrences: (0..freq)
                    .map(|i| Occurrence {
                        position: i * 5,
                        payload: None,
                        start_offset: 0,
                        end_offset: 0,
                    })
                    .collect(),
            }
        })
        .collect::<Vec<_>>();
    let terms = vec![Term::new(&field, postings)];
    let field_infos = FieldInfos::new(vec![field.clone()]);
    let memory = MemoryDirectory::new();
    write_segment(&memory, &field_infos, &terms, Default::default()).unwrap();

    let dir = CountingDirectory::new(memory.clone(), "pos");
    let reader = PostingsReader::open(&dir, &field_infos, SEGMENT, "").unwrap();
    let states = read_term_states(&dir, &reader, &field_infos, 1).unwrap();
    let state = &states[0];
    assert_eq!(state.doc_freq, 300);
    assert_eq!(state.total_term_freq, 600);
    // 600 positions: four full blocks and a tail of 88.
    assert!(state.last_pos_block_offset.is_some());

    // Position deltas alternate between 0 and 5.
    let packed_block = 1 + 3 * 128 / 8;

    // Two full document blocks with their freq blocks, then a vint tail.
    let mut doc_in = memory
        .open_input(&segment_file_name(SEGMENT, "", DOC_EXTENSION))
        .unwrap();
    codec_util::check_header(&mut doc_in, DOC_CODEC, VERSION_START, VERSION_CURRENT).unwrap();
    let for_util = ForUtil::read(&mut doc_in).unwrap();
    assert_eq!(doc_in.file_pointer(), state.doc_start_fp);
    let mut encoded = [0u8; MAX_ENCODED_SIZE];
    let mut deltas = [0u32; MAX_DATA_SIZE];
    let mut freqs = [0u32; MAX_DATA_SIZE];
    let mut block_ends = Vec::new();
    for block in 0..2 {
        for_util.read_block(&mut doc_in, &mut encoded, &mut deltas).unwrap();
        for_util.read_block(&mut doc_in, &mut encoded, &mut freqs).unwrap();
        let first_delta = if block == 0 { 0 } else { 1 };
        assert_eq!(deltas[0], first_delta);
        assert!(deltas[1..BLOCK_SIZE].iter().all(|&d| d == 1));
        assert!(freqs[..BLOCK_SIZE].chunks(2).all(|pair| pair == [1, 3]));
        block_ends.push(doc_in.file_pointer());
    }
    for doc in 256..300u32 {
        let code = doc_in.read_vint().unwrap();
        assert_eq!(code >> 1, 1);
        if doc % 2 == 0 {
            assert_eq!(code & 1, 1);
        } else {
            assert_eq!(code & 1, 0);
            assert_eq!(doc_in.read_vint().unwrap(), 3);
        }
    }

    // One skip level holding an entry per full block.
    let skip_start = state.doc_start_fp + state.skip_offset.unwrap();
    assert_eq!(doc_in.file_pointer(), skip_start);
    assert_eq!(level_count(300, BLOCK_SIZE as u32, SKIP_MULTIPLIER), 1);
    let mut last_doc_fp = state.doc_start_fp;
    for (doc_delta, block_end) in [127, 128].into_iter().zip(block_ends) {
        assert_eq!(doc_in.read_vint().unwrap(), doc_delta);
        assert_eq!(doc_in.read_vlong().unwrap(), block_end - last_doc_fp);
        assert_eq!(doc_in.read_vlong().unwrap(), 2 * packed_block);
        assert_eq!(doc_in.read_vint().unwrap(), 0);
        last_doc_fp = block_end;
    }
    assert_eq!(doc_in.file_pointer() + codec_util::FOOTER_LENGTH, doc_in.len());

    dir.stats().reset();
    let mut positions = reader
        .docs_and_positions(&field, state, None, PositionsFlags::empty(), None)
        .unwrap();
    assert_eq!(positions.advance(250).unwrap(), 250);
    assert_eq!(positions.freq(), 1);
    assert_eq!(dir.stats().reads(), 0);

    assert_eq!(positions.next_position().unwrap(), 0);
    // The first two position blocks, which belong to the first document block,
    // are neither read nor skipped over.
    assert!(dir.stats().min_offset() >= codec_util::header_length(POS_CODEC) + 2 * packed_block);

    assert_eq!(positions.next_doc().unwrap(), 251);
    assert_eq!(
        (0..3)
            .map(|_| positions.next_position().unwrap())
            .collect::<Vec<_>>(),
        vec![0, 5, 10]
    );
}

#[test]
fn test_positions_are_read_lazily() {
    let mut rng = fastrand::Rng::with_seed(67);
    let field = positions_field();
    let terms = vec![Term::new(&field, random_postings(&mut rng, &field, 3000))];
    let field_infos = FieldInfos::new(vec![field.clone()]);
    let memory = MemoryDirectory::new();
    write_segment(&memory, &field_infos, &terms, Default::default()).unwrap();
    let pos_len = memory.file_bytes("_0.pos").unwrap().len() as u64;

    let dir = CountingDirectory::new(memory, "pos");
    let reader = PostingsReader::open(&dir, &field_infos, SEGMENT, "").unwrap();
    let states = read_term_states(&dir, &reader, &field_infos, 1).unwrap();

    dir.stats().reset();
    let mut positions = reader
        .docs_and_positions(&field, &states[0], None, PositionsFlags::empty(), None)
        .unwrap();
    let postings = &terms[0].postings;
    for i in (0..2900).step_by(150) {
        assert_eq!(positions.advance(postings[i].doc).unwrap(), postings[i].doc);
        assert_eq!(positions.next_doc().unwrap(), postings[i + 1].doc);
    }
    assert_eq!(dir.stats().reads(), 0);

    let target = &postings[2950];
    assert_eq!(positions.advance(target.doc).unwrap(), target.doc);
    assert_eq!(
        read_occurrences(&mut positions),
        visible(&target.occurrences, false, false)
    );
    assert!(dir.stats().reads() > 0);
    assert!(
        dir.stats().bytes() * 2 < pos_len,
        "read {} of {pos_len} bytes",
        dir.stats().bytes()
    );
}
