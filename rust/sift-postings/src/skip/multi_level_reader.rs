//! Generic multi-level skip list reader, the counterpart of
//! [`MultiLevelSkipListWriter`](super::MultiLevelSkipListWriter).

use sift_common::{Error, Result, verify_data};
use sift_io::{ByteArrayInput, DataInput, IndexInput};

use super::multi_level_writer::level_count;
use crate::format::NO_MORE_DOCS;

/// Number of top levels loaded into memory instead of read through a cursor.
const LEVELS_TO_BUFFER: usize = 1;

/// Decodes the payload of one skip entry and keeps the decoded pointers.
pub trait SkipDataReader {
    /// Reads the entry at `level` and returns its document delta.
    fn read_skip_data(&mut self, level: usize, stream: &mut SkipStream) -> Result<u32>;

    /// The entry at `level` has been passed; remember its pointers.
    fn set_last_skip_data(&mut self, level: usize);

    /// Level `level` was repositioned under the last passed entry of the level
    /// above; inherit the remembered pointers.
    fn seek_child(&mut self, level: usize);
}

/// Cursor over one skip level.
#[derive(Debug, Clone)]
pub enum SkipStream {
    Input(IndexInput),
    /// Level copied into memory; `base` is its offset in the `.doc` stream.
    Buffered { data: ByteArrayInput, base: u64 },
}

impl SkipStream {
    pub fn file_pointer(&self) -> u64 {
        match self {
            SkipStream::Input(input) => input.file_pointer(),
            SkipStream::Buffered { data, base } => base + data.position() as u64,
        }
    }

    pub fn seek(&mut self, pos: u64) -> Result<()> {
        match self {
            SkipStream::Input(input) => input.seek(pos),
            SkipStream::Buffered { data, base } => {
                verify_data!(pos, pos >= *base);
                data.set_position((pos - *base) as usize)
            }
        }
    }
}

impl DataInput for SkipStream {
    fn read_byte(&mut self) -> Result<u8> {
        match self {
            SkipStream::Input(input) => input.read_byte(),
            SkipStream::Buffered { data, .. } => data.read_byte(),
        }
    }

    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        match self {
            SkipStream::Input(input) => input.read_bytes(dst),
            SkipStream::Buffered { data, .. } => data.read_bytes(dst),
        }
    }
}

#[derive(Debug)]
pub struct MultiLevelSkipListReader {
    max_skip_levels: usize,
    number_of_skip_levels: usize,
    skip_multiplier: u32,
    skip_interval: Vec<u32>,
    /// Level 0 always reads through this stream. Other levels get their own
    /// cursor when the list is first used.
    streams: Vec<Option<SkipStream>>,
    skip_pointer: Vec<u64>,
    child_pointer: Vec<u64>,
    num_skipped: Vec<u32>,
    skip_doc: Vec<u32>,
    last_doc: u32,
    last_child_pointer: u64,
    doc_count: u32,
    loaded: bool,
}

impl MultiLevelSkipListReader {
    pub fn new(
        input: IndexInput,
        max_skip_levels: usize,
        skip_interval: u32,
        skip_multiplier: u32,
    ) -> MultiLevelSkipListReader {
        let mut intervals = Vec::with_capacity(max_skip_levels);
        let mut interval = skip_interval;
        for _ in 0..max_skip_levels {
            intervals.push(interval);
            interval = interval.saturating_mul(skip_multiplier);
        }
        let mut streams = vec![None; max_skip_levels];
        streams[0] = Some(SkipStream::Input(input));
        MultiLevelSkipListReader {
            max_skip_levels,
            number_of_skip_levels: 0,
            skip_multiplier,
            skip_interval: intervals,
            streams,
            skip_pointer: vec![0; max_skip_levels],
            child_pointer: vec![0; max_skip_levels],
            num_skipped: vec![0; max_skip_levels],
            skip_doc: vec![0; max_skip_levels],
            last_doc: 0,
            last_child_pointer: 0,
            doc_count: 0,
            loaded: false,
        }
    }

    /// Prepares to skip over a list of `doc_count` documents whose skip data
    /// starts at `skip_pointer`. Nothing is read until [`skip_to`](Self::skip_to).
    pub fn init(&mut self, skip_pointer: u64, doc_count: u32) {
        self.skip_pointer[0] = skip_pointer;
        self.doc_count = doc_count;
        self.skip_doc.fill(0);
        self.num_skipped.fill(0);
        self.child_pointer.fill(0);
        self.last_doc = 0;
        self.last_child_pointer = 0;
        self.loaded = false;
        for stream in self.streams.iter_mut().skip(1) {
            *stream = None;
        }
    }

    /// Document of the next entry on level 0.
    pub fn next_skip_doc(&self) -> u32 {
        self.skip_doc[0]
    }

    /// Document of the last entry passed.
    pub fn last_doc(&self) -> u32 {
        self.last_doc
    }

    /// Moves through the levels to the last entry whose document precedes
    /// `target`, and returns the number of documents before that entry minus
    /// one. The result is `-1` when no entry was passed.
    pub fn skip_to(&mut self, target: u32, data: &mut dyn SkipDataReader) -> Result<i64> {
        if !self.loaded {
            self.load_skip_levels()?;
            self.loaded = true;
        }

        let mut level = 0;
        while level + 1 < self.number_of_skip_levels && target > self.skip_doc[level + 1] {
            level += 1;
        }

        loop {
            if target > self.skip_doc[level] {
                self.load_next_skip(level, data)?;
            } else {
                if level > 0 && self.last_child_pointer > self.stream(level - 1)?.file_pointer() {
                    self.seek_child(level - 1, data)?;
                }
                if level == 0 {
                    break;
                }
                level -= 1;
            }
        }
        Ok(self.num_skipped[0] as i64 - self.skip_interval[0] as i64 - 1)
    }

    fn load_next_skip(&mut self, level: usize, data: &mut dyn SkipDataReader) -> Result<bool> {
        self.last_doc = self.skip_doc[level];
        self.last_child_pointer = self.child_pointer[level];
        data.set_last_skip_data(level);

        self.num_skipped[level] = self.num_skipped[level].saturating_add(self.skip_interval[level]);
        if self.num_skipped[level] > self.doc_count {
            self.skip_doc[level] = NO_MORE_DOCS;
            if self.number_of_skip_levels > level {
                self.number_of_skip_levels = level;
            }
            return Ok(false);
        }

        let stream = self.stream_mut(level)?;
        let delta = data.read_skip_data(level, stream)?;
        let child = if level != 0 {
            Some(stream.read_vlong()?)
        } else {
            None
        };
        self.skip_doc[level] = self.skip_doc[level].saturating_add(delta);
        if let Some(child) = child {
            self.child_pointer[level] = child.saturating_add(self.skip_pointer[level - 1]);
        }
        Ok(true)
    }

    fn seek_child(&mut self, level: usize, data: &mut dyn SkipDataReader) -> Result<()> {
        let target = self.last_child_pointer;
        self.stream_mut(level)?.seek(target)?;
        self.num_skipped[level] =
            self.num_skipped[level + 1].saturating_sub(self.skip_interval[level + 1]);
        self.skip_doc[level] = self.last_doc;
        if level > 0 {
            let child = self.stream_mut(level)?.read_vlong()?;
            self.child_pointer[level] = child.saturating_add(self.skip_pointer[level - 1]);
        }
        data.seek_child(level);
        Ok(())
    }

    fn load_skip_levels(&mut self) -> Result<()> {
        self.number_of_skip_levels =
            level_count(self.doc_count, self.skip_interval[0], self.skip_multiplier)
                .min(self.max_skip_levels);

        let skip_pointer = self.skip_pointer[0];
        let base = match self.streams[0].as_mut() {
            Some(SkipStream::Input(input)) => input,
            _ => {
                return Err(Error::invalid_operation("skip list base stream missing"));
            }
        };
        base.seek(skip_pointer)?;

        let mut to_buffer = LEVELS_TO_BUFFER;
        let mut level_streams = Vec::new();
        for level in (1..self.number_of_skip_levels).rev() {
            let length = base.read_vlong()?;
            let start = base.file_pointer();
            self.skip_pointer[level] = start;
            if to_buffer > 0 {
                verify_data!(length, length <= base.len() - start);
                let mut bytes = vec![0u8; length as usize];
                base.read_bytes(&mut bytes)?;
                level_streams.push((
                    level,
                    SkipStream::Buffered {
                        data: ByteArrayInput::new(bytes),
                        base: start,
                    },
                ));
                to_buffer -= 1;
            } else {
                level_streams.push((level, SkipStream::Input(base.clone())));
                base.seek(start + length)?;
            }
        }
        self.skip_pointer[0] = base.file_pointer();
        for (level, stream) in level_streams {
            self.streams[level] = Some(stream);
        }
        log::trace!(
            "loaded {} skip levels for {} docs at {skip_pointer}",
            self.number_of_skip_levels,
            self.doc_count
        );
        Ok(())
    }

    fn stream(&self, level: usize) -> Result<&SkipStream> {
        self.streams[level]
            .as_ref()
            .ok_or_else(|| Error::invalid_operation("skip level not loaded"))
    }

    fn stream_mut(&mut self, level: usize) -> Result<&mut SkipStream> {
        self.streams[level]
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("skip level not loaded"))
    }
}
