//! Stream framing: every postings stream starts with a codec header and ends with
//! a checksum footer.
//!
//! Header layout: `u32` magic, codec name (vint length + UTF-8 bytes), `u32` version.
//! Footer layout: `u32` footer magic, `u32` algorithm id (always 0), `u64` xxh3 checksum
//! of every byte preceding the checksum itself.

use sift_common::{Error, Result};
use xxhash_rust::xxh3::Xxh3;

use crate::{DataInput, DataOutput, IndexInput, IndexOutput};

pub const CODEC_MAGIC: u32 = 0x3fd7_6c17;

pub const FOOTER_MAGIC: u32 = !CODEC_MAGIC;

pub const FOOTER_LENGTH: u64 = 16;

/// Writes the codec header for `codec` at `version`.
pub fn write_header(out: &mut IndexOutput, codec: &str, version: i32) -> Result<()> {
    if codec.len() >= 128 || !codec.is_ascii() {
        return Err(Error::invalid_arg(
            "codec",
            format!("codec name must be short ASCII: {codec}"),
        ));
    }
    out.write_int(CODEC_MAGIC)?;
    out.write_string(codec)?;
    out.write_int(version as u32)
}

/// Length of the header written by [`write_header`] for `codec`.
pub fn header_length(codec: &str) -> u64 {
    9 + codec.len() as u64
}

/// Reads and validates a codec header, returning the stored version.
///
/// Fails with `CorruptIndex` on a magic or codec name mismatch and with
/// `FormatVersion` when the version falls outside `min_version..=max_version`.
pub fn check_header(
    input: &mut dyn DataInput,
    codec: &str,
    min_version: i32,
    max_version: i32,
) -> Result<i32> {
    let magic = input.read_int()?;
    if magic != CODEC_MAGIC {
        return Err(Error::corrupt_index(format!(
            "codec header mismatch: actual header={magic:#x} vs expected header={CODEC_MAGIC:#x}"
        )));
    }
    check_header_no_magic(input, codec, min_version, max_version)
}

/// Like [`check_header`], for callers that already consumed the magic.
pub fn check_header_no_magic(
    input: &mut dyn DataInput,
    codec: &str,
    min_version: i32,
    max_version: i32,
) -> Result<i32> {
    let actual = input.read_string()?;
    if actual != codec {
        return Err(Error::corrupt_index(format!(
            "codec mismatch: actual codec={actual} vs expected codec={codec}"
        )));
    }
    let version = input.read_int()? as i32;
    if version < min_version || version > max_version {
        return Err(Error::format_version(codec, version, min_version, max_version));
    }
    Ok(version)
}

/// Writes the checksum footer. Must be the last write to `out`.
pub fn write_footer(out: &mut IndexOutput) -> Result<()> {
    out.write_int(FOOTER_MAGIC)?;
    out.write_int(0)?;
    let checksum = out.checksum();
    out.write_long(checksum)
}

/// Reads the footer at the current position of `input`, which must be exactly
/// `FOOTER_LENGTH` bytes before the end, and returns the stored checksum.
pub fn read_footer(input: &mut IndexInput) -> Result<u64> {
    let remaining = input.len().saturating_sub(input.file_pointer());
    if remaining != FOOTER_LENGTH {
        return Err(Error::corrupt_index(format!(
            "misplaced codec footer in {}: {remaining} bytes remain",
            input.name()
        )));
    }
    let magic = input.read_int()?;
    if magic != FOOTER_MAGIC {
        return Err(Error::corrupt_index(format!(
            "codec footer mismatch in {}: actual footer={magic:#x} vs expected footer={FOOTER_MAGIC:#x}",
            input.name()
        )));
    }
    let algorithm = input.read_int()?;
    if algorithm != 0 {
        return Err(Error::corrupt_index(format!(
            "unknown checksum algorithm {algorithm} in {}",
            input.name()
        )));
    }
    input.read_long()
}

/// Verifies the footer checksum of the whole stream.
///
/// Reads every byte of `input` from a private clone; the caller's cursor is not moved.
/// Returns the validated checksum.
pub fn checksum_entire_file(input: &IndexInput) -> Result<u64> {
    let len = input.len();
    if len < FOOTER_LENGTH {
        return Err(Error::corrupt_index(format!(
            "{} is too short ({len} bytes) to contain a codec footer",
            input.name()
        )));
    }
    let mut cursor = input.clone();
    cursor.seek(0)?;

    let mut hasher = Xxh3::new();
    let mut buf = vec![0u8; 8 * 1024];
    let mut remaining = len - 8;
    while remaining > 0 {
        let n = (remaining as usize).min(buf.len());
        cursor.read_bytes(&mut buf[..n])?;
        hasher.update(&buf[..n]);
        remaining -= n as u64;
    }
    let actual = hasher.digest();

    cursor.seek(len - FOOTER_LENGTH)?;
    let expected = read_footer(&mut cursor)?;
    if expected != actual {
        return Err(Error::checksum_mismatch(input.name(), expected, actual));
    }
    Ok(actual)
}
