// Delta synthesis: greedy scan of the new buffer against the old buffer's
// suffix array.
//
// Each step looks for a match that clearly beats simply continuing the
// previous alignment (by more than `MATCH_MARGIN` bytes). When one is found,
// the stretch since the last accepted match is split into a forward
// extension of the previous alignment, a backward extension of the new one,
// and literal bytes in between, and one control triple is emitted.

use log::debug;

use crate::buffer::{self, AllocationFailed};
use crate::format::varint::MAX_VARINT_LEN;
use crate::suffix::SuffixIndex;

use super::{ControlTriple, Delta};

/// A new match must beat the current alignment's agreement by more than
/// this many bytes before the alignment is abandoned.
const MATCH_MARGIN: isize = 8;

/// Compute the delta that turns `old` into `new`.
pub fn diff(old: &[u8], new: &[u8]) -> Result<Delta, AllocationFailed> {
    let index = SuffixIndex::new(old)?;
    let mut out = DeltaWriter::new(new.len())?;

    let old_len = old.len();
    let new_len = new.len();
    // Does `new[at]` agree with the old byte `offset` positions away?
    let agrees = |at: usize, offset: isize| {
        let p = at as isize + offset;
        p >= 0 && (p as usize) < old_len && old[p as usize] == new[at]
    };

    let mut scan = 0usize;
    let mut len = 0usize;
    let mut pos = 0usize;
    let mut lastscan = 0usize;
    let mut lastpos = 0usize;
    let mut lastoffset = 0isize;

    while scan < new_len {
        let mut oldscore = 0isize;
        scan += len;
        let mut scsc = scan;
        while scan < new_len {
            let m = index.longest_match(&new[scan..]);
            len = m.len;
            pos = m.pos;

            while scsc < scan + len {
                if agrees(scsc, lastoffset) {
                    oldscore += 1;
                }
                scsc += 1;
            }
            let score = len as isize;
            if (score == oldscore && len != 0) || score > oldscore + MATCH_MARGIN {
                break;
            }
            if agrees(scan, lastoffset) {
                oldscore -= 1;
            }
            scan += 1;
        }

        if len as isize == oldscore && scan != new_len {
            continue;
        }

        // Forward extension of the previous alignment.
        let mut lenf = 0usize;
        {
            let (mut s, mut best) = (0isize, 0isize);
            let mut i = 0usize;
            while lastscan + i < scan && lastpos + i < old_len {
                if old[lastpos + i] == new[lastscan + i] {
                    s += 1;
                }
                i += 1;
                if s * 2 - i as isize > best * 2 - lenf as isize {
                    best = s;
                    lenf = i;
                }
            }
        }

        // Backward extension of the new match.
        let mut lenb = 0usize;
        if scan < new_len {
            let (mut s, mut best) = (0isize, 0isize);
            let mut i = 1usize;
            while scan >= lastscan + i && pos >= i {
                if old[pos - i] == new[scan - i] {
                    s += 1;
                }
                if s * 2 - i as isize > best * 2 - lenb as isize {
                    best = s;
                    lenb = i;
                }
                i += 1;
            }
        }

        // Resolve an overlap at the split point that keeps the most matches.
        if lastscan + lenf > scan - lenb {
            let overlap = (lastscan + lenf) - (scan - lenb);
            let (mut s, mut best, mut lens) = (0isize, 0isize, 0usize);
            for i in 0..overlap {
                if new[lastscan + lenf - overlap + i] == old[lastpos + lenf - overlap + i] {
                    s += 1;
                }
                if new[scan - lenb + i] == old[pos - lenb + i] {
                    s -= 1;
                }
                if s > best {
                    best = s;
                    lens = i + 1;
                }
            }
            lenf -= overlap - lens;
            lenb -= lens;
        }

        let insert_end = scan - lenb;
        out.push(
            &old[lastpos..lastpos + lenf],
            &new[lastscan..lastscan + lenf],
            &new[lastscan + lenf..insert_end],
            (pos - lenb) as i64 - (lastpos + lenf) as i64,
        )?;

        lastscan = insert_end;
        lastpos = pos - lenb;
        lastoffset = pos as isize - scan as isize;
    }

    let delta = out.finish();
    debug!(
        "diff: old {old_len} bytes, new {new_len} bytes -> control {}, diff {}, extra {}",
        delta.control.len(),
        delta.diff.len(),
        delta.extra.len()
    );
    Ok(delta)
}

/// Accumulates the three output streams.
struct DeltaWriter {
    control: Vec<u8>,
    diff: Vec<u8>,
    extra: Vec<u8>,
    new_size: usize,
}

impl DeltaWriter {
    fn new(new_size: usize) -> Result<Self, AllocationFailed> {
        Ok(Self {
            control: Vec::new(),
            diff: buffer::try_with_capacity("diff stream", new_size)?,
            extra: buffer::try_with_capacity("extra stream", new_size)?,
            new_size,
        })
    }

    /// Emit one triple: residuals of `new_copy` over `old_copy`, then
    /// `insert` verbatim.
    fn push(
        &mut self,
        old_copy: &[u8],
        new_copy: &[u8],
        insert: &[u8],
        offset_delta: i64,
    ) -> Result<(), AllocationFailed> {
        buffer::try_grow(&mut self.control, "control stream", 3 * MAX_VARINT_LEN)?;
        ControlTriple {
            copy_len: new_copy.len() as i64,
            insert_len: insert.len() as i64,
            offset_delta,
        }
        .encode_into(&mut self.control);

        self.diff.extend(
            new_copy
                .iter()
                .zip(old_copy)
                .map(|(&n, &o)| n.wrapping_sub(o)),
        );
        self.extra.extend_from_slice(insert);
        Ok(())
    }

    fn finish(self) -> Delta {
        Delta {
            control: self.control,
            diff: self.diff,
            extra: self.extra,
            new_size: self.new_size as u64,
        }
    }
}
