use serde::{Deserialize, Serialize};
use std::fmt;

use crate::encoding::{decode_bytes, decode_bytes_limited, encode_bytes};
use crate::error::{StatusError, StatusResult};

// ---------------------------------------------------------------------------
// BitsPerStatus: entry width; always a divisor of 8 so no entry straddles
// a byte boundary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BitsPerStatus {
    One,
    Two,
    Four,
    Eight,
}

impl BitsPerStatus {
    pub fn bits(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// Largest value an entry of this width can hold (`2^B - 1`).
    pub fn max_value(self) -> u8 {
        ((1u16 << self.bits()) - 1) as u8
    }

    fn mask(self) -> u8 {
        self.max_value()
    }

    fn entries_per_byte(self) -> usize {
        8 / self.bits() as usize
    }
}

impl TryFrom<u8> for BitsPerStatus {
    type Error = StatusError;

    fn try_from(bits: u8) -> StatusResult<Self> {
        match bits {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            other => Err(StatusError::UnsupportedBits(other)),
        }
    }
}

impl From<BitsPerStatus> for u8 {
    fn from(bits: BitsPerStatus) -> u8 {
        bits.bits()
    }
}

impl fmt::Display for BitsPerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

// ---------------------------------------------------------------------------
// StatusList
// ---------------------------------------------------------------------------

/// Fixed-capacity packed array of status values.
///
/// Entry `i` occupies bits `[i*B, i*B + B)` of the buffer, counting from the
/// least significant bit of byte 0 upward. Capacity never changes after
/// construction. Mutation needs `&mut self`; see `SharedStatusList` for a
/// lock-guarded handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusList {
    bits: BitsPerStatus,
    len: usize,
    bytes: Vec<u8>,
}

impl StatusList {
    /// Build a list holding `values` in order.
    pub fn new(values: &[u8], bits: BitsPerStatus) -> StatusResult<Self> {
        if values.is_empty() {
            return Err(StatusError::Capacity);
        }
        let mut list = Self::zeroed(values.len(), bits);
        for (index, value) in values.iter().enumerate() {
            list.set(index, *value)?;
        }
        Ok(list)
    }

    /// Build a list of `len` entries all set to `value`.
    pub fn filled(len: usize, bits: BitsPerStatus, value: u8) -> StatusResult<Self> {
        if len == 0 {
            return Err(StatusError::Capacity);
        }
        check_value(value, bits)?;

        let per_byte = bits.entries_per_byte();
        let mut pattern = 0u8;
        for slot in 0..per_byte {
            pattern |= value << (slot * bits.bits() as usize);
        }
        let mut list = Self::zeroed(len, bits);
        list.bytes.iter_mut().for_each(|b| *b = pattern);
        list.clear_tail();
        Ok(list)
    }

    fn zeroed(len: usize, bits: BitsPerStatus) -> Self {
        let byte_len = (len * bits.bits() as usize).div_ceil(8);
        Self {
            bits,
            len,
            bytes: vec![0u8; byte_len],
        }
    }

    /// Zero the unused high bits of the final byte so equal lists encode
    /// identically.
    fn clear_tail(&mut self) {
        let used_bits = (self.len * self.bits.bits() as usize) % 8;
        if used_bits != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= (1u8 << used_bits) - 1;
            }
        }
    }

    pub fn bits(&self) -> BitsPerStatus {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a list cannot be built empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn get(&self, index: usize) -> StatusResult<u8> {
        let (byte, shift) = self.locate(index)?;
        Ok((self.bytes[byte] >> shift) & self.bits.mask())
    }

    /// Overwrite entry `index`, leaving every other entry's bits untouched.
    pub fn set(&mut self, index: usize, value: u8) -> StatusResult<()> {
        let (byte, shift) = self.locate(index)?;
        check_value(value, self.bits)?;

        let mask = self.bits.mask() << shift;
        self.bytes[byte] = (self.bytes[byte] & !mask) | (value << shift);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        let mask = self.bits.mask();
        let width = self.bits.bits() as usize;
        (0..self.len).map(move |i| {
            let offset = i * width;
            (self.bytes[offset / 8] >> (offset % 8)) & mask
        })
    }

    fn locate(&self, index: usize) -> StatusResult<(usize, usize)> {
        if index >= self.len {
            return Err(StatusError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        let offset = index * self.bits.bits() as usize;
        Ok((offset / 8, offset % 8))
    }

    /// Compressed, base64url-encoded transport form.
    pub fn encode(&self) -> StatusResult<String> {
        let encoded = encode_bytes(&self.bytes)?;
        tracing::debug!(
            entries = self.len,
            bits = self.bits.bits(),
            encoded_len = encoded.len(),
            "status list encoded"
        );
        Ok(encoded)
    }

    /// Decode a transported list. The byte buffer carries no length, so the
    /// capacity is every slot the buffer can hold (`bytes * 8 / B`).
    pub fn decode(encoded: &str, bits: BitsPerStatus) -> StatusResult<Self> {
        let bytes = decode_bytes(encoded)?;
        if bytes.is_empty() {
            return Err(StatusError::Decode("empty status list".into()));
        }
        let len = bytes.len() * bits.entries_per_byte();
        Ok(Self { bits, len, bytes })
    }

    /// Decode a transported list whose capacity is known out of band.
    pub fn decode_with_len(encoded: &str, bits: BitsPerStatus, len: usize) -> StatusResult<Self> {
        if len == 0 {
            return Err(StatusError::Capacity);
        }
        let expected = len
            .checked_mul(bits.bits() as usize)
            .ok_or(StatusError::Capacity)?
            .div_ceil(8);
        let bytes = decode_bytes_limited(encoded, expected)?;
        if bytes.len() != expected {
            tracing::warn!(
                expected,
                actual = bytes.len(),
                "status list byte length does not match declared capacity"
            );
            return Err(StatusError::Decode(format!(
                "expected {} bytes for {} entries of {} bits, got {}",
                expected,
                len,
                bits,
                bytes.len()
            )));
        }
        // Padding bits past the last entry carry no status
        let mut list = Self { bits, len, bytes };
        list.clear_tail();
        Ok(list)
    }
}

fn check_value(value: u8, bits: BitsPerStatus) -> StatusResult<()> {
    if value > bits.max_value() {
        return Err(StatusError::ValueOutOfRange {
            value,
            bits: bits.bits(),
        });
    }
    Ok(())
}
