//! Core definitions (error type, result alias and verification macros), relied upon
//! by all sift-* crates.

pub mod error;
pub mod result;

pub use error::{Error, ErrorKind};
pub use result::Result;
