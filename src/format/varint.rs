// Zigzag variable-length integers ("zigzag-varint64").
//
// A signed value is zigzag-mapped to unsigned (`(x << 1) ^ (x >> 63)`),
// then written as 7-bit groups, most-significant group first. Every group
// but the last has bit 7 set. Leading all-zero groups are omitted, so the
// encoding is 1..=10 bytes and small magnitudes (of either sign) stay short.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Maximum encoded length of a 64-bit value (ceil(64/7) = 10).
pub const MAX_VARINT_LEN: usize = 10;

/// Number of leading groups before the final 7-bit group.
const LEADING_GROUPS: usize = MAX_VARINT_LEN - 1;

const CONTINUATION: u8 = 0x80;
const GROUP_MASK: u64 = 0x7F;

// ---------------------------------------------------------------------------
// Zigzag mapping
// ---------------------------------------------------------------------------

/// Map a signed value onto the unsigned range, interleaving signs.
#[inline]
pub fn zigzag(x: i64) -> u64 {
    ((x as u64) << 1) ^ ((x >> 63) as u64)
}

/// Inverse of [`zigzag`].
#[inline]
pub fn unzigzag(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `x` into the front of `buf`. Returns the number of bytes written
/// (1..=10).
///
/// The nine leading groups sit at bit offsets 63, 56, ..., 7 (the first one
/// only holds bit 63); they are emitted from the first non-zero group on.
#[inline]
pub fn encode_i64(x: i64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let u = zigzag(x);
    let mut len = 0;
    for i in 0..LEADING_GROUPS {
        let group = ((u >> ((LEADING_GROUPS - i) * 7)) & GROUP_MASK) as u8;
        if len > 0 || group != 0 {
            buf[len] = group | CONTINUATION;
            len += 1;
        }
    }
    buf[len] = (u & GROUP_MASK) as u8;
    len + 1
}

/// Encode `x` and write it to a `Write` sink.
pub fn write_i64<W: Write>(w: &mut W, x: i64) -> io::Result<()> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_i64(x, &mut buf);
    w.write_all(&buf[..len])
}

/// Encode `x` and append it to `out`.
#[inline]
pub fn push_i64(out: &mut Vec<u8>, x: i64) {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_i64(x, &mut buf);
    out.extend_from_slice(&buf[..len]);
}

// ---------------------------------------------------------------------------
// Decoding from byte slices
// ---------------------------------------------------------------------------

/// Decode a value from the front of `data`.
/// Returns `(value, bytes_consumed)`; `bytes_consumed` is at most 10.
pub fn read_i64(data: &[u8]) -> Result<(i64, usize), VarIntError> {
    let mut u: u64 = 0;
    for (i, &byte) in data.iter().take(MAX_VARINT_LEN).enumerate() {
        u = (u << 7) | (u64::from(byte) & GROUP_MASK);
        if byte & CONTINUATION == 0 {
            return Ok((unzigzag(u), i + 1));
        }
    }
    if data.len() >= MAX_VARINT_LEN {
        Err(VarIntError::Unterminated)
    } else {
        Err(VarIntError::Truncated)
    }
}

// ---------------------------------------------------------------------------
// Decoding from `Read` (streaming)
// ---------------------------------------------------------------------------

/// Read one value from a streaming source.
pub fn stream_read_i64<R: Read>(r: &mut R) -> io::Result<i64> {
    let mut u: u64 = 0;
    let mut buf = [0u8; 1];
    for _ in 0..MAX_VARINT_LEN {
        r.read_exact(&mut buf)?;
        let byte = buf[0];
        u = (u << 7) | (u64::from(byte) & GROUP_MASK);
        if byte & CONTINUATION == 0 {
            return Ok(unzigzag(u));
        }
    }
    Err(VarIntError::Unterminated.into())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Encoded byte-length of `x`.
#[inline]
pub fn sizeof_i64(x: i64) -> usize {
    let bits = 64 - zigzag(x).leading_zeros();
    bits.max(1).div_ceil(7) as usize
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarIntError {
    /// Input ended before a terminating group.
    #[error("varint truncated")]
    Truncated,
    /// Ten groups read without a terminator (malformed varint).
    #[error("malformed varint: no terminator within 10 bytes")]
    Unterminated,
}

impl From<VarIntError> for io::Error {
    fn from(e: VarIntError) -> io::Error {
        match e {
            VarIntError::Truncated => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            VarIntError::Unterminated => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
