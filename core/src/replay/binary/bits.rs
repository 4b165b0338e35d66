//! Bit cursor
//!
//! Sub-byte reads and writes over a byte buffer. Bits are packed
//! least-significant first within each byte, for both directions, so a
//! byte-aligned 32-bit field reads as little-endian.
//!
//! Variable-length integers are LEB128: 8-bit groups holding 7 data bits and a
//! continuation flag in the group's top bit, least significant group first.

use crate::replay::error::BitError;
use byteorder::{ByteOrder, LittleEndian};

/// Widest field `read_bits`/`write_bits` accept
pub const MAX_WIDTH: u32 = 64;

/// Longest varint encoding of a `u64`
const MAX_VARINT_GROUPS: u32 = 10;

const VARINT_DATA_MASK: u64 = 0x7F;
const VARINT_CONTINUE: u64 = 0x80;

fn check_width(n: u32) -> Result<(), BitError> {
    if n == 0 || n > MAX_WIDTH {
        return Err(BitError::InvalidWidth(n));
    }
    Ok(())
}

/// Reading half of the bit cursor
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Absolute bit position
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current position in bits
    pub fn bit_position(&self) -> usize {
        self.position
    }

    /// Current position in whole bytes (rounded down)
    pub fn byte_position(&self) -> usize {
        self.position / 8
    }

    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.position
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.position % 8 == 0
    }

    fn ensure(&self, requested: u32) -> Result<(), BitError> {
        let available = self.remaining_bits();
        if (requested as usize) > available {
            return Err(BitError::OutOfData {
                position: self.position,
                requested,
                available,
            });
        }
        Ok(())
    }

    /// Read `n` bits (1..=64) as an unsigned integer
    pub fn read_bits(&mut self, n: u32) -> Result<u64, BitError> {
        check_width(n)?;
        self.ensure(n)?;

        let mut value = 0u64;
        let mut filled = 0u32;
        while filled < n {
            let byte = self.data[self.position / 8];
            let shift = (self.position % 8) as u32;
            let take = (8 - shift).min(n - filled);
            let chunk = (u64::from(byte) >> shift) & ((1u64 << take) - 1);
            value |= chunk << filled;
            filled += take;
            self.position += take as usize;
        }
        Ok(value)
    }

    pub fn read_bit(&mut self) -> Result<bool, BitError> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Read a 32-bit little-endian field
    pub fn read_u32(&mut self) -> Result<u32, BitError> {
        if self.is_byte_aligned() {
            self.ensure(32)?;
            let start = self.byte_position();
            let value = LittleEndian::read_u32(&self.data[start..start + 4]);
            self.position += 32;
            return Ok(value);
        }
        Ok(self.read_bits(32)? as u32)
    }

    /// Read a LEB128 variable-length integer
    pub fn read_varint(&mut self) -> Result<u64, BitError> {
        let start = self.position;
        let mut value = 0u64;

        for group_index in 0..MAX_VARINT_GROUPS {
            let group = self.read_bits(8)?;
            let data = group & VARINT_DATA_MASK;
            let shift = group_index * 7;

            // The tenth group only has room for the top bit of a u64
            if group_index == MAX_VARINT_GROUPS - 1 && data > 1 {
                return Err(BitError::VarIntOverflow { position: start });
            }
            value |= data << shift;

            if group & VARINT_CONTINUE == 0 {
                if group_index > 0 && data == 0 {
                    return Err(BitError::NonCanonicalVarInt { position: start });
                }
                return Ok(value);
            }
        }

        Err(BitError::VarIntOverflow { position: start })
    }

    /// Read `len` whole bytes (not necessarily byte-aligned)
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, BitError> {
        let requested = u32::try_from(len.saturating_mul(8)).unwrap_or(u32::MAX);
        if len.saturating_mul(8) > self.remaining_bits() {
            return Err(BitError::OutOfData {
                position: self.position,
                requested,
                available: self.remaining_bits(),
            });
        }

        if self.is_byte_aligned() {
            let start = self.byte_position();
            self.position += len * 8;
            return Ok(self.data[start..start + len].to_vec());
        }

        (0..len)
            .map(|_| self.read_bits(8).map(|byte| byte as u8))
            .collect()
    }

    /// Skip to the next byte boundary, returning the skipped bits
    pub fn skip_padding(&mut self) -> Result<u64, BitError> {
        let pad = (8 - self.position % 8) % 8;
        if pad == 0 {
            return Ok(0);
        }
        self.read_bits(pad as u32)
    }
}

/// Writing half of the bit cursor
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Number of bits written
    len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            len: 0,
        }
    }

    pub fn bit_len(&self) -> usize {
        self.len
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.len % 8 == 0
    }

    /// Write the low `n` bits (1..=64) of `value`
    pub fn write_bits(&mut self, value: u64, n: u32) -> Result<(), BitError> {
        check_width(n)?;
        if n < MAX_WIDTH && value >> n != 0 {
            return Err(BitError::ValueTooWide { value, width: n });
        }

        let mut written = 0u32;
        while written < n {
            let shift = (self.len % 8) as u32;
            if shift == 0 {
                self.bytes.push(0);
            }
            let take = (8 - shift).min(n - written);
            let chunk = ((value >> written) & ((1u64 << take) - 1)) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= chunk << shift;
            }
            written += take;
            self.len += take as usize;
        }
        Ok(())
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<(), BitError> {
        self.write_bits(u64::from(bit), 1)
    }

    /// Write a 32-bit little-endian field
    pub fn write_u32(&mut self, value: u32) -> Result<(), BitError> {
        if self.is_byte_aligned() {
            let start = self.bytes.len();
            self.bytes.resize(start + 4, 0);
            LittleEndian::write_u32(&mut self.bytes[start..], value);
            self.len += 32;
            return Ok(());
        }
        self.write_bits(u64::from(value), 32)
    }

    /// Write a LEB128 variable-length integer in its minimal form
    pub fn write_varint(&mut self, mut value: u64) -> Result<(), BitError> {
        loop {
            let data = value & VARINT_DATA_MASK;
            value >>= 7;
            if value == 0 {
                return self.write_bits(data, 8);
            }
            self.write_bits(data | VARINT_CONTINUE, 8)?;
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BitError> {
        if self.is_byte_aligned() {
            self.bytes.extend_from_slice(bytes);
            self.len += bytes.len() * 8;
            return Ok(());
        }
        for &byte in bytes {
            self.write_bits(u64::from(byte), 8)?;
        }
        Ok(())
    }

    /// Zero-fill up to the next byte boundary
    pub fn pad_to_byte(&mut self) {
        // Unused high bits of the last byte are already zero
        self.len = self.bytes.len() * 8;
    }

    /// Finish writing; a partial final byte is zero-padded
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
