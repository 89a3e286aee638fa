// Patch application: replay control triples against the old buffer.
//
// Every triple is validated in full (lengths, output room, stream
// availability, cursor arithmetic) before any byte of it is written.
// Old positions are tracked as signed 64-bit values; a copy region that
// falls partly outside the old buffer contributes zero for the missing
// bytes unless `PatchOptions::strict_old_bounds` is set.

use log::{debug, trace};
use thiserror::Error;

use crate::buffer::{self, AllocationFailed};
use crate::format::varint::VarIntError;

use super::{ControlTriple, ControlTriples, Delta};

/// Knobs for [`patch_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchOptions {
    /// Reject copy regions that reach outside the old buffer instead of
    /// treating the missing old bytes as zero.
    pub strict_old_bounds: bool,
}

/// Why a delta could not be applied.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("triple {index}: negative length (copy {copy_len}, insert {insert_len})")]
    NegativeLength {
        index: u64,
        copy_len: i64,
        insert_len: i64,
    },
    #[error("triple {index}: writes past the declared new size {new_size}")]
    OutputOverrun { index: u64, new_size: u64 },
    #[error("triple {index}: bad control varint: {source}")]
    ControlStream {
        index: u64,
        #[source]
        source: VarIntError,
    },
    #[error("control stream ended after {index} triples before the output was complete")]
    ControlUnderrun { index: u64 },
    #[error("triple {index}: diff stream exhausted")]
    DiffUnderrun { index: u64 },
    #[error("triple {index}: extra stream exhausted")]
    ExtraUnderrun { index: u64 },
    #[error("{bytes} unconsumed bytes left in the {stream} stream")]
    TrailingData { stream: &'static str, bytes: usize },
    #[error("triple {index}: old cursor overflows")]
    CursorOverflow { index: u64 },
    #[error("triple {index}: copy at old offset {old_pos} leaves the old buffer")]
    OldOutOfBounds { index: u64, old_pos: i64 },
    #[error(transparent)]
    Alloc(#[from] AllocationFailed),
}

/// Rebuild the new buffer from `old` and `delta`.
pub fn patch(old: &[u8], delta: &Delta) -> Result<Vec<u8>, PatchError> {
    patch_with_options(old, delta, &PatchOptions::default())
}

/// Rebuild the new buffer from `old` and `delta` with explicit options.
pub fn patch_with_options(
    old: &[u8],
    delta: &Delta,
    options: &PatchOptions,
) -> Result<Vec<u8>, PatchError> {
    let new_size = delta.new_size();
    let out_len = usize::try_from(new_size).map_err(|_| AllocationFailed {
        what: "patched output",
        bytes: new_size,
    })?;
    let mut out = buffer::try_filled("patched output", out_len, 0u8)?;

    let diff = delta.diff_stream();
    let extra = delta.extra();
    let mut triples = ControlTriples::new(delta.control());

    let mut new_pos = 0usize;
    let mut old_pos = 0i64;
    let mut diff_pos = 0usize;
    let mut extra_pos = 0usize;
    let mut index = 0u64;

    while new_pos < out_len {
        let triple = match triples.next() {
            Some(Ok(t)) => t,
            Some(Err(source)) => return Err(PatchError::ControlStream { index, source }),
            None => return Err(PatchError::ControlUnderrun { index }),
        };
        let step = Step::check(
            &triple,
            index,
            Cursors {
                new_pos,
                old_pos,
                diff_pos,
                extra_pos,
            },
            out_len,
            diff.len(),
            extra.len(),
        )?;

        let old_range = old_overlap(old_pos, step.copy, old.len());
        if options.strict_old_bounds && old_range.len() != step.copy {
            return Err(PatchError::OldOutOfBounds { index, old_pos });
        }

        // Residuals first, then the old bytes that exist.
        let dst = &mut out[new_pos..new_pos + step.copy];
        dst.copy_from_slice(&diff[diff_pos..diff_pos + step.copy]);
        if old_range.len() != step.copy {
            trace!(
                "triple {index}: copy of {} at old offset {old_pos} overlaps old buffer on {:?}",
                step.copy, old_range
            );
        }
        if !old_range.is_empty() {
            // `old_range` starts at or after `old_pos`, so the offset into
            // `dst` is non-negative and bounded by `step.copy`.
            let at = (old_range.start as i64 - old_pos) as usize;
            for (d, &o) in dst[at..at + old_range.len()].iter_mut().zip(&old[old_range]) {
                *d = d.wrapping_add(o);
            }
        }

        out[step.insert_at..step.insert_at + step.insert]
            .copy_from_slice(&extra[extra_pos..extra_pos + step.insert]);

        new_pos = step.next.new_pos;
        old_pos = step.next.old_pos;
        diff_pos = step.next.diff_pos;
        extra_pos = step.next.extra_pos;
        index += 1;
    }

    if triples.remaining() > 0 {
        return Err(PatchError::TrailingData {
            stream: "control",
            bytes: triples.remaining(),
        });
    }
    if diff_pos < diff.len() {
        return Err(PatchError::TrailingData {
            stream: "diff",
            bytes: diff.len() - diff_pos,
        });
    }
    if extra_pos < extra.len() {
        return Err(PatchError::TrailingData {
            stream: "extra",
            bytes: extra.len() - extra_pos,
        });
    }

    debug!("patch: {index} triples, {} bytes written", out.len());
    Ok(out)
}

// ---------------------------------------------------------------------------
// Per-triple validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Cursors {
    new_pos: usize,
    old_pos: i64,
    diff_pos: usize,
    extra_pos: usize,
}

/// A triple whose every access has been proven in range.
#[derive(Debug, Clone, Copy)]
struct Step {
    copy: usize,
    insert: usize,
    insert_at: usize,
    next: Cursors,
}

impl Step {
    fn check(
        t: &ControlTriple,
        index: u64,
        at: Cursors,
        out_len: usize,
        diff_len: usize,
        extra_len: usize,
    ) -> Result<Self, PatchError> {
        let negative = || PatchError::NegativeLength {
            index,
            copy_len: t.copy_len,
            insert_len: t.insert_len,
        };
        let copy = usize::try_from(t.copy_len).map_err(|_| negative())?;
        let insert = usize::try_from(t.insert_len).map_err(|_| negative())?;

        let overrun = PatchError::OutputOverrun {
            index,
            new_size: out_len as u64,
        };
        let insert_at = match at.new_pos.checked_add(copy) {
            Some(end) if end <= out_len => end,
            _ => return Err(overrun),
        };
        let new_pos = match insert_at.checked_add(insert) {
            Some(end) if end <= out_len => end,
            _ => return Err(overrun),
        };

        let diff_pos = match at.diff_pos.checked_add(copy) {
            Some(end) if end <= diff_len => end,
            _ => return Err(PatchError::DiffUnderrun { index }),
        };
        let extra_pos = match at.extra_pos.checked_add(insert) {
            Some(end) if end <= extra_len => end,
            _ => return Err(PatchError::ExtraUnderrun { index }),
        };

        // `copy` fits in the output, which fits in memory, so it fits in i64.
        let old_pos = at
            .old_pos
            .checked_add(copy as i64)
            .and_then(|p| p.checked_add(t.offset_delta))
            .ok_or(PatchError::CursorOverflow { index })?;

        Ok(Self {
            copy,
            insert,
            insert_at,
            next: Cursors {
                new_pos,
                old_pos,
                diff_pos,
                extra_pos,
            },
        })
    }
}

/// The part of `[old_pos, old_pos + len)` that lies inside `[0, old_len)`.
fn old_overlap(old_pos: i64, len: usize, old_len: usize) -> std::ops::Range<usize> {
    let start = old_pos.max(0);
    let end = old_pos.saturating_add(len as i64).min(old_len as i64);
    if start >= end {
        0..0
    } else {
        start as usize..end as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_of(triples: &[(i64, i64, i64)], diff: &[u8], extra: &[u8], new_size: u64) -> Delta {
        let mut control = Vec::new();
        for &(copy_len, insert_len, offset_delta) in triples {
            ControlTriple {
                copy_len,
                insert_len,
                offset_delta,
            }
            .encode_into(&mut control);
        }
        Delta::from_parts(control, diff.to_vec(), extra.to_vec(), new_size)
    }

    #[test]
    fn copy_then_insert() {
        let old = b"hello world";
        let delta = delta_of(&[(5, 1, 0)], &[0; 5], b"!", 6);
        assert_eq!(patch(old, &delta).unwrap(), b"hello!");
    }

    #[test]
    fn residuals_wrap() {
        let old = [0xF0, 0x10];
        let delta = delta_of(&[(2, 0, 0)], &[0x20, 0xF0], &[], 2);
        assert_eq!(patch(&old, &delta).unwrap(), [0x10, 0x00]);
    }

    #[test]
    fn offset_moves_old_cursor() {
        let old = b"abcdef";
        // copy "ab", skip to "ef" (+2), copy "ef".
        let delta = delta_of(&[(2, 0, 2), (2, 0, 0)], &[0; 4], &[], 4);
        assert_eq!(patch(old, &delta).unwrap(), b"abef");
    }

    #[test]
    fn empty_delta_gives_empty_output() {
        assert!(patch(b"anything", &Delta::default()).unwrap().is_empty());
    }

    #[test]
    fn out_of_bounds_old_adds_zero() {
        let old = b"ab";
        // Start one byte before the old buffer and run one byte past it.
        let delta = delta_of(&[(0, 0, -1), (4, 0, 0)], &[7, 1, 1, 9], &[], 4);
        assert_eq!(patch(old, &delta).unwrap(), [7, b'a' + 1, b'b' + 1, 9]);
    }

    #[test]
    fn strict_mode_rejects_out_of_bounds_old() {
        let old = b"ab";
        let delta = delta_of(&[(3, 0, 0)], &[0; 3], &[], 3);
        let strict = PatchOptions {
            strict_old_bounds: true,
        };
        let err = patch_with_options(old, &delta, &strict).unwrap_err();
        assert!(matches!(err, PatchError::OldOutOfBounds { index: 0, old_pos: 0 }));
        // Lenient mode accepts it.
        assert_eq!(patch(old, &delta).unwrap(), b"ab\0");
    }

    #[test]
    fn negative_length_is_rejected() {
        let delta = delta_of(&[(-1, 0, 0)], &[], &[], 1);
        assert!(matches!(
            patch(b"x", &delta).unwrap_err(),
            PatchError::NegativeLength { index: 0, .. }
        ));
        let delta = delta_of(&[(0, -5, 0)], &[], &[], 1);
        assert!(matches!(
            patch(b"x", &delta).unwrap_err(),
            PatchError::NegativeLength { .. }
        ));
    }

    #[test]
    fn copy_past_new_size_is_rejected() {
        let delta = delta_of(&[(4, 0, 0)], &[0; 4], &[], 3);
        assert!(matches!(
            patch(b"abcd", &delta).unwrap_err(),
            PatchError::OutputOverrun { index: 0, new_size: 3 }
        ));
        let delta = delta_of(&[(1, 3, 0)], &[0], b"xyz", 3);
        assert!(matches!(
            patch(b"abcd", &delta).unwrap_err(),
            PatchError::OutputOverrun { .. }
        ));
    }

    #[test]
    fn huge_lengths_do_not_overflow() {
        let delta = delta_of(&[(i64::MAX, i64::MAX, 0)], &[], &[], 8);
        assert!(matches!(
            patch(b"", &delta).unwrap_err(),
            PatchError::OutputOverrun { .. }
        ));
    }

    #[test]
    fn stream_underruns_are_rejected() {
        let delta = delta_of(&[(3, 0, 0)], &[0; 2], &[], 3);
        assert!(matches!(
            patch(b"abc", &delta).unwrap_err(),
            PatchError::DiffUnderrun { index: 0 }
        ));
        let delta = delta_of(&[(0, 3, 0)], &[], b"ab", 3);
        assert!(matches!(
            patch(b"abc", &delta).unwrap_err(),
            PatchError::ExtraUnderrun { index: 0 }
        ));
        let delta = delta_of(&[(1, 0, 0)], &[0], &[], 2);
        assert!(matches!(
            patch(b"abc", &delta).unwrap_err(),
            PatchError::ControlUnderrun { index: 1 }
        ));
    }

    #[test]
    fn truncated_control_is_rejected() {
        let mut delta = delta_of(&[(1, 0, 300)], &[0], &[], 1);
        let (mut control, diff, extra, n) = delta.into_parts();
        control.pop();
        delta = Delta::from_parts(control, diff, extra, n);
        // The first triple is incomplete.
        assert!(matches!(
            patch(b"a", &delta).unwrap_err(),
            PatchError::ControlStream {
                index: 0,
                source: VarIntError::Truncated
            }
        ));
    }

    #[test]
    fn trailing_stream_bytes_are_rejected() {
        let delta = delta_of(&[(1, 0, 0), (0, 0, 0)], &[0], &[], 1);
        assert!(matches!(
            patch(b"a", &delta).unwrap_err(),
            PatchError::TrailingData { stream: "control", .. }
        ));
        let delta = delta_of(&[(1, 0, 0)], &[0, 0], &[], 1);
        assert!(matches!(
            patch(b"a", &delta).unwrap_err(),
            PatchError::TrailingData { stream: "diff", bytes: 1 }
        ));
        let delta = delta_of(&[(0, 1, 0)], &[], b"xy", 1);
        assert!(matches!(
            patch(b"a", &delta).unwrap_err(),
            PatchError::TrailingData { stream: "extra", bytes: 1 }
        ));
    }

    #[test]
    fn cursor_overflow_is_rejected() {
        let delta = delta_of(&[(0, 0, i64::MAX), (1, 0, 1)], &[0], &[], 1);
        assert!(matches!(
            patch(b"a", &delta).unwrap_err(),
            PatchError::CursorOverflow { index: 1 }
        ));
    }

    #[test]
    fn unrepresentable_new_size_is_an_allocation_failure() {
        let delta = delta_of(&[], &[], &[], u64::MAX);
        assert!(matches!(
            patch(b"", &delta).unwrap_err(),
            PatchError::Alloc(_)
        ));
    }

    #[test]
    fn overlap_clamps_to_old_buffer() {
        assert_eq!(old_overlap(-3, 5, 10), 0..2);
        assert_eq!(old_overlap(8, 5, 10), 8..10);
        assert_eq!(old_overlap(12, 5, 10), 0..0);
        assert_eq!(old_overlap(-10, 5, 10), 0..0);
        assert_eq!(old_overlap(i64::MAX, 5, 10), 0..0);
    }
}
