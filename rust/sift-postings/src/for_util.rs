//! Frame-of-reference encoding of 128-value blocks.
//!
//! A block is either a single `0` byte followed by a vint, when all values are
//! equal, or a width byte `1..=32` followed by the values packed at that width.
//! The packed layout chosen for each width is recorded once per segment in a
//! 32-entry table at the start of the `.doc` stream.

use sift_common::{Error, Result};
use sift_io::{DataInput, DataOutput, IndexInput};
use sift_packed::{BulkOperation, Format};

use crate::format::BLOCK_SIZE;

/// Width byte marking a block whose values are all equal.
const ALL_VALUES_EQUAL: u8 = 0;

/// Upper bound of the bytes a packed block occupies.
pub const MAX_ENCODED_SIZE: usize = BLOCK_SIZE * 4;

/// Size of the buffers handed to [`ForUtil::read_block`] and
/// [`ForUtil::write_block`]. Bulk decoders work in whole iterations and may
/// touch more than `BLOCK_SIZE` values.
pub const MAX_DATA_SIZE: usize = compute_max_data_size();

const fn compute_max_data_size() -> usize {
    // Decoders are independent of the packed ints version.
    const FORMATS: [Format; 2] = [Format::Packed, Format::PackedSingleBlock];
    let mut max = 0;
    let mut bits = 1;
    while bits <= 32 {
        let mut f = 0;
        while f < FORMATS.len() {
            if let Some(op) = BulkOperation::try_new(FORMATS[f], bits) {
                let n = op.compute_iterations(BLOCK_SIZE) * op.byte_value_count();
                if n > max {
                    max = n;
                }
            }
            f += 1;
        }
        bits += 1;
    }
    max
}

/// How a block of values will be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEncoding {
    AllEqual(u32),
    Packed(u32),
}

impl BlockEncoding {
    /// Picks the encoding for the first `BLOCK_SIZE` values of `data`.
    pub fn of(data: &[u32]) -> BlockEncoding {
        let block = &data[..BLOCK_SIZE];
        let first = block[0];
        if block.iter().all(|&v| v == first) {
            return BlockEncoding::AllEqual(first);
        }
        let or = block.iter().fold(0u32, |acc, &v| acc | v);
        BlockEncoding::Packed(sift_packed::bits_required(or as u64))
    }
}

#[derive(Debug, Clone, Copy)]
struct WidthSlot {
    op: BulkOperation,
    encoded_size: usize,
    iterations: usize,
}

/// Per-segment block codec.
#[derive(Debug, Clone)]
pub struct ForUtil {
    slots: [Option<WidthSlot>; 33],
}

impl ForUtil {
    /// Chooses a packed layout for every width allowed by
    /// `acceptable_overhead_ratio` and writes the layout table to `out`.
    pub fn create(acceptable_overhead_ratio: f32, out: &mut dyn DataOutput) -> Result<ForUtil> {
        let version = sift_packed::VERSION_CURRENT;
        out.write_vint(version as u32)?;
        let mut slots = [None; 33];
        for bits in 1..=32u32 {
            let chosen =
                sift_packed::fastest_format_and_bits(Some(BLOCK_SIZE), bits, acceptable_overhead_ratio);
            let slot = WidthSlot::new(chosen.format, version, chosen.bits_per_value)?;
            out.write_vint((chosen.format.id() << 5) | (chosen.bits_per_value - 1))?;
            slots[bits as usize] = Some(slot);
        }
        Ok(ForUtil { slots })
    }

    /// Reads the layout table written by [`ForUtil::create`].
    pub fn read(input: &mut dyn DataInput) -> Result<ForUtil> {
        let version = input.read_vint()? as i32;
        sift_packed::check_version(version)?;
        let mut slots = [None; 33];
        for slot in slots.iter_mut().skip(1) {
            let code = input.read_vint()?;
            let format = Format::by_id(code >> 5)?;
            let bits = (code & 31) + 1;
            *slot = Some(WidthSlot::new(format, version, bits)?);
        }
        Ok(ForUtil { slots })
    }

    /// Encodes the first `BLOCK_SIZE` values of `data` to `out`.
    ///
    /// `data` must hold at least `MAX_DATA_SIZE` values, `encoded` at least
    /// `MAX_ENCODED_SIZE` bytes.
    pub fn write_block(
        &self,
        data: &[u32],
        encoded: &mut [u8],
        out: &mut dyn DataOutput,
    ) -> Result<BlockEncoding> {
        let encoding = BlockEncoding::of(data);
        match encoding {
            BlockEncoding::AllEqual(value) => {
                out.write_byte(ALL_VALUES_EQUAL)?;
                out.write_vint(value)?;
            }
            BlockEncoding::Packed(bits) => {
                let slot = self.slot(bits)?;
                slot.op.encode(data, encoded, slot.iterations);
                out.write_byte(bits as u8)?;
                out.write_bytes(&encoded[..slot.encoded_size])?;
            }
        }
        Ok(encoding)
    }

    /// Decodes one block into the first `BLOCK_SIZE` entries of `decoded`.
    pub fn read_block(&self, input: &mut IndexInput, encoded: &mut [u8], decoded: &mut [u32]) -> Result<()> {
        let bits = input.read_byte()?;
        if bits == ALL_VALUES_EQUAL {
            let value = input.read_vint()?;
            decoded[..BLOCK_SIZE].fill(value);
            return Ok(());
        }
        let slot = self.slot(bits as u32)?;
        input.read_bytes(&mut encoded[..slot.encoded_size])?;
        slot.op.decode(encoded, decoded, slot.iterations);
        Ok(())
    }

    /// Moves `input` past one block without decoding it.
    pub fn skip_block(&self, input: &mut IndexInput) -> Result<()> {
        let bits = input.read_byte()?;
        if bits == ALL_VALUES_EQUAL {
            input.read_vint()?;
            return Ok(());
        }
        let slot = self.slot(bits as u32)?;
        input.skip_bytes(slot.encoded_size as u64)
    }

    /// Encoded size in bytes of a packed block of the given width.
    pub fn encoded_size(&self, bits: u32) -> Result<usize> {
        Ok(self.slot(bits)?.encoded_size)
    }

    fn slot(&self, bits: u32) -> Result<&WidthSlot> {
        self.slots
            .get(bits as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::invalid_format("packed block", format!("bit width {bits} out of range")))
    }
}

impl WidthSlot {
    fn new(format: Format, version: i32, bits: u32) -> Result<WidthSlot> {
        let op = BulkOperation::new(format, bits)?;
        let encoded_size = format.byte_count(version, BLOCK_SIZE, bits);
        let iterations = op.compute_iterations(BLOCK_SIZE);
        if iterations * op.byte_value_count() > MAX_DATA_SIZE
            || iterations * op.byte_block_count() > MAX_ENCODED_SIZE
            || encoded_size > iterations * op.byte_block_count()
        {
            return Err(Error::invalid_format(
                "packed block",
                format!("layout {format:?} at width {bits} does not fit a block"),
            ));
        }
        Ok(WidthSlot {
            op,
            encoded_size,
            iterations,
        })
    }
}
