// In-memory delta: control triples plus the diff and extra streams.
//
// - `diff` : builds a Delta from an old and a new buffer
// - `apply`: replays a Delta against the old buffer

pub mod apply;
pub mod diff;

use crate::format::varint::{self, VarIntError};

pub use apply::{PatchError, PatchOptions, patch, patch_with_options};
pub use diff::diff;

/// One control-stream entry.
///
/// Copy `copy_len` bytes (diff residual plus old bytes), insert `insert_len`
/// literal bytes, then move the old cursor by `offset_delta`. Values are
/// kept signed as decoded; a negative length marks a corrupt patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTriple {
    pub copy_len: i64,
    pub insert_len: i64,
    pub offset_delta: i64,
}

impl ControlTriple {
    /// Append the three varints to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        varint::push_i64(out, self.copy_len);
        varint::push_i64(out, self.insert_len);
        varint::push_i64(out, self.offset_delta);
    }
}

/// The complete output of diffing.
///
/// Owns its three streams. The copy lengths sum to `diff.len()`, the insert
/// lengths to `extra.len()`, and together they cover `new_size` bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    control: Vec<u8>,
    diff: Vec<u8>,
    extra: Vec<u8>,
    new_size: u64,
}

impl Delta {
    /// Assemble a delta from raw streams (e.g. read from a patch file).
    pub fn from_parts(control: Vec<u8>, diff: Vec<u8>, extra: Vec<u8>, new_size: u64) -> Self {
        Self {
            control,
            diff,
            extra,
            new_size,
        }
    }

    /// Split into `(control, diff, extra, new_size)`.
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>, Vec<u8>, u64) {
        (self.control, self.diff, self.extra, self.new_size)
    }

    /// Encoded control stream.
    pub fn control(&self) -> &[u8] {
        &self.control
    }

    /// Byte-wise residuals (new minus old) for copied regions.
    pub fn diff_stream(&self) -> &[u8] {
        &self.diff
    }

    /// Literal inserted bytes.
    pub fn extra(&self) -> &[u8] {
        &self.extra
    }

    /// Size of the reconstructed new buffer.
    pub fn new_size(&self) -> u64 {
        self.new_size
    }

    /// Iterate over the decoded control triples.
    pub fn triples(&self) -> ControlTriples<'_> {
        ControlTriples::new(&self.control)
    }

    /// Totals over the control stream.
    pub fn summary(&self) -> Result<DeltaSummary, VarIntError> {
        let mut summary = DeltaSummary::default();
        for triple in self.triples() {
            let t = triple?;
            summary.triples += 1;
            summary.copied = summary.copied.saturating_add(t.copy_len);
            summary.inserted = summary.inserted.saturating_add(t.insert_len);
        }
        Ok(summary)
    }
}

/// Aggregate figures for a delta's control stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeltaSummary {
    /// Number of control triples.
    pub triples: u64,
    /// Sum of copy lengths.
    pub copied: i64,
    /// Sum of insert lengths.
    pub inserted: i64,
}

// ---------------------------------------------------------------------------
// Control stream iterator
// ---------------------------------------------------------------------------

/// Decodes control triples from an encoded control stream.
///
/// Yields `Err` once on a truncated or malformed varint, then stops.
pub struct ControlTriples<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ControlTriples<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn next_value(&mut self) -> Result<i64, VarIntError> {
        let (value, len) = varint::read_i64(&self.data[self.pos..])?;
        self.pos += len;
        Ok(value)
    }

    fn next_triple(&mut self) -> Result<ControlTriple, VarIntError> {
        Ok(ControlTriple {
            copy_len: self.next_value()?,
            insert_len: self.next_value()?,
            offset_delta: self.next_value()?,
        })
    }
}

impl Iterator for ControlTriples<'_> {
    type Item = Result<ControlTriple, VarIntError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let result = self.next_triple();
        if result.is_err() {
            self.pos = self.data.len();
        }
        Some(result)
    }
}
