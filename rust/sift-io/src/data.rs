//! Fixed-width and variable-length integer primitives shared by every stream.
//!
//! Fixed-width integers are big-endian. Variable-length integers store seven bits
//! per byte, low-order group first, with the high bit of each byte set when more
//! bytes follow.

use sift_common::{Error, Result};

/// Sequential reader of primitive values.
pub trait DataInput {
    fn read_byte(&mut self) -> Result<u8>;

    /// Fills `dst` completely or fails.
    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()>;

    fn read_int(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_long(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_bytes(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn read_vint(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for shift in (0..35).step_by(7) {
            let b = self.read_byte()?;
            if shift == 28 && b & 0xF0 != 0 {
                return Err(Error::invalid_format("vint", "too many bits"));
            }
            value |= ((b & 0x7F) as u32) << shift;
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::invalid_format("vint", "too many bytes"))
    }

    fn read_vlong(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for shift in (0..70).step_by(7) {
            let b = self.read_byte()?;
            if shift == 63 && b & 0xFE != 0 {
                return Err(Error::invalid_format("vlong", "too many bits"));
            }
            value |= ((b & 0x7F) as u64) << shift;
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::invalid_format("vlong", "too many bytes"))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_vint()? as usize;
        let mut buf = vec![0u8; len];
        self.read_bytes(&mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::invalid_format("string", e.to_string()))
    }
}

/// Sequential writer of primitive values.
pub trait DataOutput {
    fn write_byte(&mut self, b: u8) -> Result<()>;

    fn write_bytes(&mut self, src: &[u8]) -> Result<()>;

    fn write_int(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    fn write_long(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    fn write_vint(&mut self, mut value: u32) -> Result<()> {
        let mut buf = [0u8; 5];
        let mut len = 0;
        while value >= 0x80 {
            buf[len] = (value as u8 & 0x7F) | 0x80;
            value >>= 7;
            len += 1;
        }
        buf[len] = value as u8;
        self.write_bytes(&buf[..=len])
    }

    fn write_vlong(&mut self, mut value: u64) -> Result<()> {
        let mut buf = [0u8; 10];
        let mut len = 0;
        while value >= 0x80 {
            buf[len] = (value as u8 & 0x7F) | 0x80;
            value >>= 7;
            len += 1;
        }
        buf[len] = value as u8;
        self.write_bytes(&buf[..=len])
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_vint(s.len() as u32)?;
        self.write_bytes(s.as_bytes())
    }
}

impl DataOutput for Vec<u8> {
    fn write_byte(&mut self, b: u8) -> Result<()> {
        self.push(b);
        Ok(())
    }

    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.extend_from_slice(src);
        Ok(())
    }
}

/// In-memory cursor over an owned byte buffer.
#[derive(Debug, Clone, Default)]
pub struct ByteArrayInput {
    data: Vec<u8>,
    pos: usize,
}

impl ByteArrayInput {
    pub fn new(data: Vec<u8>) -> ByteArrayInput {
        ByteArrayInput { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn set_position(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::invalid_arg(
                "pos",
                format!("{pos} is beyond the buffer length {}", self.data.len()),
            ));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }
}

impl DataInput for ByteArrayInput {
    fn read_byte(&mut self) -> Result<u8> {
        let b = *self.data.get(self.pos).ok_or_else(|| {
            Error::io(
                "byte array",
                crate::utils::eof_error("byte array", self.pos as u64, self.data.len() as u64),
            )
        })?;
        self.pos += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        let end = self.pos + dst.len();
        if end > self.data.len() {
            return Err(Error::io(
                "byte array",
                crate::utils::eof_error("byte array", end as u64, self.data.len() as u64),
            ));
        }
        dst.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }
}
