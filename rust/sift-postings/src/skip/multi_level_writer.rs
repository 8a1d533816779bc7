//! Generic multi-level skip list writer.
//!
//! Level 0 gets an entry every `skip_interval` documents, level `n + 1` every
//! `skip_multiplier` entries of level `n`. Entries above level 0 carry a pointer to
//! the matching entry of the level below. Levels are buffered in memory and
//! emitted highest first, each prefixed with its byte length; level 0 comes last
//! without a length.

use sift_common::Result;
use sift_io::DataOutput;

/// Serializes the payload of one skip entry.
pub trait SkipDataWriter {
    fn write_skip_data(&mut self, level: usize, buffer: &mut Vec<u8>) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct MultiLevelSkipListWriter {
    skip_interval: u32,
    skip_multiplier: u32,
    number_of_skip_levels: usize,
    levels: Vec<Vec<u8>>,
}

impl MultiLevelSkipListWriter {
    /// Creates a writer sized for postings lists of at most `max_doc_count`
    /// documents.
    pub fn new(
        skip_interval: u32,
        skip_multiplier: u32,
        max_skip_levels: usize,
        max_doc_count: u32,
    ) -> MultiLevelSkipListWriter {
        let number_of_skip_levels =
            level_count(max_doc_count, skip_interval, skip_multiplier).min(max_skip_levels);
        MultiLevelSkipListWriter {
            skip_interval,
            skip_multiplier,
            number_of_skip_levels,
            levels: vec![Vec::new(); number_of_skip_levels],
        }
    }

    pub fn number_of_skip_levels(&self) -> usize {
        self.number_of_skip_levels
    }

    /// Discards the entries of the previous postings list.
    pub fn reset(&mut self) {
        self.levels.iter_mut().for_each(Vec::clear);
    }

    /// Records a skip point after `doc_count` documents, which must be a
    /// multiple of the skip interval. `data` writes the entry payload for every
    /// level the point reaches.
    pub fn buffer_skip(&mut self, doc_count: u32, data: &mut dyn SkipDataWriter) -> Result<()> {
        debug_assert_eq!(doc_count % self.skip_interval, 0);
        let mut num_levels = 1;
        let mut count = doc_count / self.skip_interval;
        while count % self.skip_multiplier == 0 && num_levels < self.number_of_skip_levels {
            num_levels += 1;
            count /= self.skip_multiplier;
        }

        let mut child_pointer = 0u64;
        for level in 0..num_levels {
            data.write_skip_data(level, &mut self.levels[level])?;
            let new_child_pointer = self.levels[level].len() as u64;
            if level != 0 {
                self.levels[level].write_vlong(child_pointer)?;
            }
            child_pointer = new_child_pointer;
        }
        Ok(())
    }

    /// Appends the buffered levels to `out`.
    pub fn write_skip(&self, out: &mut dyn DataOutput) -> Result<()> {
        for level in self.levels.iter().skip(1).rev() {
            if !level.is_empty() {
                out.write_vlong(level.len() as u64)?;
                out.write_bytes(level)?;
            }
        }
        if let Some(level) = self.levels.first() {
            out.write_bytes(level)?;
        }
        Ok(())
    }
}

/// Number of levels a skip list over `doc_count` documents needs, ignoring the
/// level cap.
pub fn level_count(doc_count: u32, skip_interval: u32, skip_multiplier: u32) -> usize {
    if doc_count <= skip_interval {
        return 1;
    }
    let mut x = doc_count / skip_interval;
    let mut levels = 1;
    while x >= skip_multiplier {
        x /= skip_multiplier;
        levels += 1;
    }
    levels
}
