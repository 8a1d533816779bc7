//! Fixed-width integer packing.
//!
//! Given a bit width between 1 and 32, packs runs of integers into bytes using one
//! of two layouts (see [`Format`]) and unpacks them again. The layout and width for a
//! given value range are picked by [`fastest_format_and_bits`], trading space for
//! decoding speed according to an acceptable overhead ratio.

use sift_common::{Error, Result};

pub mod bulk;
pub mod format;

pub use bulk::BulkOperation;
pub use format::Format;

/// Initial on-disk version.
pub const VERSION_START: i32 = 0;

/// Version in which `Format::Packed` stopped padding to whole 64-bit words.
pub const VERSION_BYTE_ALIGNED: i32 = 1;

pub const VERSION_CURRENT: i32 = VERSION_BYTE_ALIGNED;

/// No memory overhead at all, at the cost of the slowest layouts.
pub const COMPACT: f32 = 0.0;

/// Up to 20% memory overhead.
pub const DEFAULT: f32 = 0.2;

/// Up to 50% memory overhead.
pub const FAST: f32 = 0.5;

/// At most 700% memory overhead, always picks the fastest layout.
pub const FASTEST: f32 = 7.0;

/// A layout together with the number of bits each value occupies in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatAndBits {
    pub format: Format,
    pub bits_per_value: u32,
}

/// Number of bits needed to store `max_value`, never less than 1.
pub fn bits_required(max_value: u64) -> u32 {
    (64 - max_value.leading_zeros()).max(1)
}

/// Validates a persisted packing version.
pub fn check_version(version: i32) -> Result<()> {
    if (VERSION_START..=VERSION_CURRENT).contains(&version) {
        Ok(())
    } else {
        Err(Error::format_version(
            "packed ints",
            version,
            VERSION_START,
            VERSION_CURRENT,
        ))
    }
}

/// Picks the layout that decodes fastest while wasting at most
/// `acceptable_overhead_ratio * bits_per_value` bits per value.
///
/// Byte-aligned widths (8, 16, 32, 64, then 24 and 48) are preferred, then the
/// first single-block width within budget, and finally the exact width packed
/// contiguously.
///
/// # Arguments
///
/// * `value_count` - Number of values that will be stored, `None` when unknown.
/// * `bits_per_value` - Minimum width able to represent every value.
/// * `acceptable_overhead_ratio` - Clamped to `COMPACT..=FASTEST`.
pub fn fastest_format_and_bits(
    value_count: Option<usize>,
    bits_per_value: u32,
    acceptable_overhead_ratio: f32,
) -> FormatAndBits {
    const THREE_BLOCKS_MAX_SIZE: usize = i32::MAX as usize / 3;

    let value_count = value_count.unwrap_or(i32::MAX as usize);
    let ratio = acceptable_overhead_ratio.clamp(COMPACT, FASTEST);
    let acceptable_overhead_per_value = ratio * bits_per_value as f32;
    let max_bits_per_value = bits_per_value + acceptable_overhead_per_value as u32;

    let byte_aligned = |width: u32| bits_per_value <= width && max_bits_per_value >= width;
    let packed = |bits_per_value| FormatAndBits {
        format: Format::Packed,
        bits_per_value,
    };

    if byte_aligned(8) {
        packed(8)
    } else if byte_aligned(16) {
        packed(16)
    } else if byte_aligned(32) {
        packed(32)
    } else if byte_aligned(64) {
        packed(64)
    } else if value_count <= THREE_BLOCKS_MAX_SIZE && byte_aligned(24) {
        packed(24)
    } else if value_count <= THREE_BLOCKS_MAX_SIZE && byte_aligned(48) {
        packed(48)
    } else {
        (bits_per_value..=max_bits_per_value)
            .filter(|&bpv| Format::PackedSingleBlock.is_supported(bpv))
            .find(|&bpv| {
                let overhead = Format::PackedSingleBlock.overhead_per_value(bpv);
                overhead
                    <= acceptable_overhead_per_value + bits_per_value as f32 - bpv as f32
            })
            .map(|bpv| FormatAndBits {
                format: Format::PackedSingleBlock,
                bits_per_value: bpv,
            })
            .unwrap_or_else(|| packed(bits_per_value))
    }
}
