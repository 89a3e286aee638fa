// Patch header: 4-byte magic tag followed by four signed varints.
//
//   magic        2F 5F 5C 31  ("/_\1")
//   control_len  varint
//   diff_len     varint
//   extra_len    varint
//   new_size     varint
//
// The compressed payload starts immediately after `new_size`.

use log::debug;

use super::FormatError;
use super::varint::{self, MAX_VARINT_LEN};
use crate::delta::Delta;

pub const PATCH_MAGIC: [u8; 4] = *b"/_\\1";

/// Longest possible encoded header.
pub const MAX_HEADER_LEN: usize = PATCH_MAGIC.len() + 4 * MAX_VARINT_LEN;

const FIELDS: [&str; 4] = ["control_len", "diff_len", "extra_len", "new_size"];

/// Parsed patch header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchHeader {
    pub control_len: u64,
    pub diff_len: u64,
    pub extra_len: u64,
    pub new_size: u64,
}

impl PatchHeader {
    /// Header describing `delta`'s streams.
    pub fn for_delta(delta: &Delta) -> Self {
        Self {
            control_len: delta.control().len() as u64,
            diff_len: delta.diff_stream().len() as u64,
            extra_len: delta.extra().len() as u64,
            new_size: delta.new_size(),
        }
    }

    fn fields(&self) -> [u64; 4] {
        [self.control_len, self.diff_len, self.extra_len, self.new_size]
    }

    /// Total size of the uncompressed payload, if it fits in a `u64`.
    pub fn payload_len(&self) -> Option<u64> {
        self.control_len
            .checked_add(self.diff_len)?
            .checked_add(self.extra_len)
    }

    /// Serialize the header. Fields above `i64::MAX` cannot be represented.
    pub fn encode(&self) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::with_capacity(MAX_HEADER_LEN);
        out.extend_from_slice(&PATCH_MAGIC);
        for (value, field) in self.fields().into_iter().zip(FIELDS) {
            let value = i64::try_from(value)
                .map_err(|_| FormatError::FieldOutOfRange { field, value })?;
            varint::push_i64(&mut out, value);
        }
        Ok(out)
    }

    /// Parse a header from the front of `data`.
    ///
    /// Returns the header and the number of bytes it occupied.
    pub fn decode(data: &[u8]) -> Result<(Self, usize), FormatError> {
        let magic_len = PATCH_MAGIC.len();
        if data.len() < magic_len || data[..magic_len] != PATCH_MAGIC {
            return Err(FormatError::BadMagic {
                found: data[..data.len().min(magic_len)].to_vec(),
            });
        }

        let mut pos = magic_len;
        let mut values = [0u64; 4];
        for (slot, field) in values.iter_mut().zip(FIELDS) {
            let (value, len) = varint::read_i64(&data[pos..])
                .map_err(|source| FormatError::HeaderVarint { field, source })?;
            *slot = u64::try_from(value)
                .map_err(|_| FormatError::NegativeField { field, value })?;
            pos += len;
        }

        let [control_len, diff_len, extra_len, new_size] = values;
        let header = Self {
            control_len,
            diff_len,
            extra_len,
            new_size,
        };
        debug!(
            "patch header: control {control_len}, diff {diff_len}, extra {extra_len}, new size {new_size}"
        );
        Ok((header, pos))
    }
}
