//! Multi-level skip lists over the documents of a term.

pub mod block_reader;
pub mod block_writer;
pub mod multi_level_reader;
pub mod multi_level_writer;

pub use block_reader::SkipReader;
pub use block_writer::{SkipPoint, SkipWriter};
pub use multi_level_reader::{MultiLevelSkipListReader, SkipDataReader, SkipStream};
pub use multi_level_writer::{MultiLevelSkipListWriter, SkipDataWriter};
