//! Bulk encoding and decoding of fixed-width values to and from bytes.
//!
//! An operation works in "iterations": each iteration consumes `byte_value_count`
//! values and produces `byte_block_count` bytes (or the reverse when decoding).

use sift_common::{Error, Result};

use crate::Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOperation {
    format: Format,
    bits_per_value: u32,
    byte_block_count: usize,
    byte_value_count: usize,
}

impl BulkOperation {
    /// Returns the operation for `format` at `bits_per_value` (1..=32), or `None`
    /// when the combination is not supported.
    pub const fn try_new(format: Format, bits_per_value: u32) -> Option<BulkOperation> {
        if bits_per_value == 0 || bits_per_value > 32 || !format.is_supported(bits_per_value) {
            return None;
        }
        let (byte_block_count, byte_value_count) = match format {
            Format::Packed => {
                let mut long_block_count = bits_per_value as usize;
                while long_block_count & 1 == 0 {
                    long_block_count >>= 1;
                }
                let long_value_count = 64 * long_block_count / bits_per_value as usize;
                let mut byte_block_count = 8 * long_block_count;
                let mut byte_value_count = long_value_count;
                while byte_block_count & 1 == 0 && byte_value_count & 1 == 0 {
                    byte_block_count >>= 1;
                    byte_value_count >>= 1;
                }
                (byte_block_count, byte_value_count)
            }
            Format::PackedSingleBlock => (8, 64 / bits_per_value as usize),
        };
        Some(BulkOperation {
            format,
            bits_per_value,
            byte_block_count,
            byte_value_count,
        })
    }

    pub fn new(format: Format, bits_per_value: u32) -> Result<BulkOperation> {
        Self::try_new(format, bits_per_value).ok_or_else(|| {
            Error::invalid_format(
                "packed ints",
                format!("unsupported width {bits_per_value} for {format:?}"),
            )
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn bits_per_value(&self) -> u32 {
        self.bits_per_value
    }

    /// Bytes produced by one encoding iteration.
    pub const fn byte_block_count(&self) -> usize {
        self.byte_block_count
    }

    /// Values consumed by one encoding iteration.
    pub const fn byte_value_count(&self) -> usize {
        self.byte_value_count
    }

    /// Smallest number of iterations covering `value_count` values.
    pub const fn compute_iterations(&self, value_count: usize) -> usize {
        value_count.div_ceil(self.byte_value_count)
    }

    /// Packs `iterations * byte_value_count()` values into
    /// `iterations * byte_block_count()` bytes. Bits above the width are ignored.
    pub fn encode(&self, values: &[u32], blocks: &mut [u8], iterations: usize) {
        let values = &values[..iterations * self.byte_value_count];
        let blocks = &mut blocks[..iterations * self.byte_block_count];
        match self.format {
            Format::Packed => self.encode_packed(values, blocks),
            Format::PackedSingleBlock => self.encode_single_block(values, blocks),
        }
    }

    /// Unpacks `iterations * byte_block_count()` bytes into
    /// `iterations * byte_value_count()` values.
    pub fn decode(&self, blocks: &[u8], values: &mut [u32], iterations: usize) {
        let blocks = &blocks[..iterations * self.byte_block_count];
        let values = &mut values[..iterations * self.byte_value_count];
        match self.format {
            Format::Packed => self.decode_packed(blocks, values),
            Format::PackedSingleBlock => self.decode_single_block(blocks, values),
        }
    }

    fn mask(&self) -> u64 {
        (1u64 << self.bits_per_value) - 1
    }

    fn encode_packed(&self, values: &[u32], blocks: &mut [u8]) {
        let bits_per_value = self.bits_per_value;
        let mask = self.mask();
        let mut acc = 0u64;
        let mut acc_bits = 0u32;
        let mut out = 0;
        for &value in values {
            acc = (acc << bits_per_value) | (value as u64 & mask);
            acc_bits += bits_per_value;
            while acc_bits >= 8 {
                acc_bits -= 8;
                blocks[out] = (acc >> acc_bits) as u8;
                out += 1;
            }
            acc &= (1u64 << acc_bits) - 1;
        }
        debug_assert_eq!(acc_bits, 0);
        debug_assert_eq!(out, blocks.len());
    }

    fn decode_packed(&self, blocks: &[u8], values: &mut [u32]) {
        let bits_per_value = self.bits_per_value;
        let mask = self.mask();
        let mut acc = 0u64;
        let mut acc_bits = 0u32;
        let mut out = 0;
        for &b in blocks {
            acc = (acc << 8) | b as u64;
            acc_bits += 8;
            while acc_bits >= bits_per_value {
                acc_bits -= bits_per_value;
                values[out] = ((acc >> acc_bits) & mask) as u32;
                out += 1;
            }
            acc &= (1u64 << acc_bits) - 1;
        }
        debug_assert_eq!(out, values.len());
    }

    fn encode_single_block(&self, values: &[u32], blocks: &mut [u8]) {
        let mask = self.mask();
        for (chunk, block) in values
            .chunks_exact(self.byte_value_count)
            .zip(blocks.chunks_exact_mut(8))
        {
            let word = chunk
                .iter()
                .enumerate()
                .fold(0u64, |word, (j, &value)| {
                    word | ((value as u64 & mask) << (j as u32 * self.bits_per_value))
                });
            block.copy_from_slice(&word.to_be_bytes());
        }
    }

    fn decode_single_block(&self, blocks: &[u8], values: &mut [u32]) {
        let mask = self.mask();
        for (block, chunk) in blocks
            .chunks_exact(8)
            .zip(values.chunks_exact_mut(self.byte_value_count))
        {
            let word = u64::from_be_bytes([
                block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
            ]);
            for (j, value) in chunk.iter_mut().enumerate() {
                *value = ((word >> (j as u32 * self.bits_per_value)) & mask) as u32;
            }
        }
    }
}
