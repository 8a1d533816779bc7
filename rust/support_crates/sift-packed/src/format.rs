use sift_common::{Error, Result};

use crate::VERSION_START;

/// Byte layout of packed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Values are laid out contiguously, most significant bit first, with no
    /// padding between them.
    Packed,
    /// Each 64-bit word holds `64 / bits_per_value` values, least significant
    /// bits first, and the remaining high bits are unused. Words are stored
    /// big-endian.
    PackedSingleBlock,
}

const SINGLE_BLOCK_WIDTHS: [u32; 14] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 16, 21, 32];

impl Format {
    /// Persisted identifier of the format.
    pub const fn id(self) -> u32 {
        match self {
            Format::Packed => 0,
            Format::PackedSingleBlock => 1,
        }
    }

    pub fn by_id(id: u32) -> Result<Format> {
        match id {
            0 => Ok(Format::Packed),
            1 => Ok(Format::PackedSingleBlock),
            _ => Err(Error::invalid_format(
                "packed ints format",
                format!("unknown format id {id}"),
            )),
        }
    }

    /// Whether values of `bits_per_value` bits can be stored in this format.
    pub const fn is_supported(self, bits_per_value: u32) -> bool {
        match self {
            Format::Packed => bits_per_value >= 1 && bits_per_value <= 64,
            Format::PackedSingleBlock => {
                let mut i = 0;
                while i < SINGLE_BLOCK_WIDTHS.len() {
                    if SINGLE_BLOCK_WIDTHS[i] == bits_per_value {
                        return true;
                    }
                    i += 1;
                }
                false
            }
        }
    }

    /// Number of wasted bits per value.
    pub fn overhead_per_value(self, bits_per_value: u32) -> f32 {
        match self {
            Format::Packed => 0.0,
            Format::PackedSingleBlock => {
                let values_per_block = 64 / bits_per_value;
                let overhead = 64 % bits_per_value;
                overhead as f32 / values_per_block as f32
            }
        }
    }

    /// Number of bytes needed to store `value_count` values of `bits_per_value` bits
    /// with the given packing `version`.
    pub const fn byte_count(self, version: i32, value_count: usize, bits_per_value: u32) -> usize {
        match self {
            Format::Packed if version == VERSION_START => {
                8 * self.long_count(version, value_count, bits_per_value)
            }
            Format::Packed => (value_count * bits_per_value as usize).div_ceil(8),
            Format::PackedSingleBlock => {
                8 * self.long_count(version, value_count, bits_per_value)
            }
        }
    }

    /// Number of 64-bit words needed to store `value_count` values of
    /// `bits_per_value` bits.
    pub const fn long_count(self, _version: i32, value_count: usize, bits_per_value: u32) -> usize {
        match self {
            Format::Packed => (value_count * bits_per_value as usize).div_ceil(64),
            Format::PackedSingleBlock => {
                let values_per_block = 64 / bits_per_value as usize;
                value_count.div_ceil(values_per_block)
            }
        }
    }
}
