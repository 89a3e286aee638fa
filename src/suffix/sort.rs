// Suffix sorting by prefix doubling (Larsson-Sadakane).
//
// Suffixes are first bucketed by their leading byte, then each round
// refines every unresolved group by the rank of the suffix `h` bytes
// further on, doubling `h` until every suffix has a distinct rank.
//
// The slot array holds either the position of a suffix that still shares
// its rank with neighbours, or the head of a run of slots whose order is
// final. Ranks always name the last slot of the suffix's current group.

use log::debug;

use crate::buffer::{self, AllocationFailed};

/// Groups shorter than this are ordered by repeated minimum selection.
const SELECTION_SORT_MAX: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SuffixSlot {
    /// Start position of a suffix whose final rank is not known yet.
    Unresolved(usize),
    /// Head of a run of this many slots that are fully sorted.
    ResolvedRun(usize),
}

impl SuffixSlot {
    #[inline(always)]
    fn position(self) -> usize {
        match self {
            Self::Unresolved(pos) => pos,
            Self::ResolvedRun(_) => unreachable!("resolved slot inside an unsorted group"),
        }
    }
}

/// Pending work for [`split`]: a group to partition, or the equal-key
/// middle of a partitioned group whose ranks still need settling.
#[derive(Debug, Clone, Copy)]
enum Task {
    Split { start: usize, len: usize },
    Settle { start: usize, end: usize },
}

/// Sort all suffixes of `old`, including the empty suffix at `old.len()`.
///
/// Returns `(suffixes, ranks)`, both of length `old.len() + 1`:
/// `suffixes[r]` is the start of the suffix with rank `r`, and
/// `ranks[p]` is the rank of the suffix starting at `p`.
pub fn sort_suffixes(old: &[u8]) -> Result<(Vec<usize>, Vec<usize>), AllocationFailed> {
    let n = old.len();
    let mut slots = buffer::try_filled("suffix slots", n + 1, SuffixSlot::ResolvedRun(1))?;
    let mut ranks = buffer::try_filled("suffix ranks", n + 1, 0usize)?;

    // Bucket by leading byte. Slot 0 belongs to the empty suffix, so the
    // buckets start at 1 and `buckets[c]` ends up as the last slot of `c`.
    let mut buckets = [0usize; 256];
    for &b in old {
        buckets[b as usize] += 1;
    }
    let mut start = 0;
    for bucket in buckets.iter_mut() {
        let count = *bucket;
        *bucket = start;
        start += count;
    }
    for (pos, &b) in old.iter().enumerate() {
        buckets[b as usize] += 1;
        slots[buckets[b as usize]] = SuffixSlot::Unresolved(pos);
    }
    for (pos, &b) in old.iter().enumerate() {
        ranks[pos] = buckets[b as usize];
    }
    ranks[n] = 0;

    let mut prev_end = 0;
    for &end in &buckets {
        if end == prev_end + 1 {
            slots[end] = SuffixSlot::ResolvedRun(1);
        }
        prev_end = end;
    }
    slots[0] = SuffixSlot::ResolvedRun(1);

    let mut h = 1;
    let mut rounds = 0u32;
    let mut work = Vec::new();
    while slots[0] != SuffixSlot::ResolvedRun(n + 1) {
        let mut run = 0;
        let mut i = 0;
        while i <= n {
            match slots[i] {
                SuffixSlot::ResolvedRun(len) => {
                    run += len;
                    i += len;
                }
                SuffixSlot::Unresolved(pos) => {
                    if run > 0 {
                        slots[i - run] = SuffixSlot::ResolvedRun(run);
                    }
                    let len = ranks[pos] + 1 - i;
                    split(&mut slots, &mut ranks, &mut work, i, len, h);
                    i += len;
                    run = 0;
                }
            }
        }
        if run > 0 {
            slots[i - run] = SuffixSlot::ResolvedRun(run);
        }
        h += h;
        rounds += 1;
    }
    drop(slots);

    let mut suffixes = buffer::try_filled("suffix array", n + 1, 0usize)?;
    for (pos, &rank) in ranks.iter().enumerate() {
        suffixes[rank] = pos;
    }
    debug!("suffix sort: {} suffixes in {rounds} doubling rounds", n + 1);
    Ok((suffixes, ranks))
}

/// Refine the group `slots[start..start + len]` by the rank `h` bytes on.
///
/// Sub-groups are finished strictly left to right: the lower partition,
/// then the equal middle, then the upper partition. Ranks written for a
/// finished sub-group are visible to every key comparison after it.
fn split(
    slots: &mut [SuffixSlot],
    ranks: &mut [usize],
    work: &mut Vec<Task>,
    start: usize,
    len: usize,
    h: usize,
) {
    work.clear();
    work.push(Task::Split { start, len });
    while let Some(task) = work.pop() {
        match task {
            Task::Split { start, len } if len < SELECTION_SORT_MAX => {
                selection_split(slots, ranks, start, len, h);
            }
            Task::Split { start, len } => {
                let (lt, gt) = partition(slots, ranks, start, len, h);
                // Popped in reverse: lower, settle, upper.
                if start + len > gt {
                    work.push(Task::Split {
                        start: gt,
                        len: start + len - gt,
                    });
                }
                work.push(Task::Settle { start: lt, end: gt });
                if lt > start {
                    work.push(Task::Split {
                        start,
                        len: lt - start,
                    });
                }
            }
            Task::Settle { start, end } => settle(slots, ranks, start, end),
        }
    }
}

#[inline(always)]
fn key(slots: &[SuffixSlot], ranks: &[usize], k: usize, h: usize) -> usize {
    ranks[slots[k].position() + h]
}

/// Give every slot in `start..end` the rank `end - 1`; a lone slot is final.
fn settle(slots: &mut [SuffixSlot], ranks: &mut [usize], start: usize, end: usize) {
    for slot in &slots[start..end] {
        ranks[slot.position()] = end - 1;
    }
    if end - start == 1 {
        slots[start] = SuffixSlot::ResolvedRun(1);
    }
}

/// Short groups: repeatedly move the minimum-key slots to the front.
fn selection_split(
    slots: &mut [SuffixSlot],
    ranks: &mut [usize],
    start: usize,
    len: usize,
    h: usize,
) {
    let end = start + len;
    let mut k = start;
    while k < end {
        let mut equal = 1;
        let mut min = key(slots, ranks, k, h);
        for i in k + 1..end {
            let v = key(slots, ranks, i, h);
            if v < min {
                min = v;
                equal = 0;
            }
            if v == min {
                slots.swap(k + equal, i);
                equal += 1;
            }
        }
        settle(slots, ranks, k, k + equal);
        k += equal;
    }
}

/// Three-way partition around the key of the middle slot.
/// Returns `(lt, gt)`: keys below the pivot occupy `start..lt`, keys equal
/// to it `lt..gt`, keys above it `gt..start + len`.
fn partition(
    slots: &mut [SuffixSlot],
    ranks: &[usize],
    start: usize,
    len: usize,
    h: usize,
) -> (usize, usize) {
    let pivot = key(slots, ranks, start + len / 2, h);

    let mut less = 0;
    let mut equal = 0;
    for i in start..start + len {
        let v = key(slots, ranks, i, h);
        if v < pivot {
            less += 1;
        }
        if v == pivot {
            equal += 1;
        }
    }
    let lt = start + less;
    let gt = lt + equal;

    let mut j = 0;
    let mut k = 0;
    let mut i = start;
    while i < lt {
        let v = key(slots, ranks, i, h);
        if v < pivot {
            i += 1;
        } else if v == pivot {
            slots.swap(i, lt + j);
            j += 1;
        } else {
            slots.swap(i, gt + k);
            k += 1;
        }
    }
    while lt + j < gt {
        if key(slots, ranks, lt + j, h) == pivot {
            j += 1;
        } else {
            slots.swap(lt + j, gt + k);
            k += 1;
        }
    }
    (lt, gt)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
