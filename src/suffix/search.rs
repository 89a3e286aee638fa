// Longest-match lookup against a sorted suffix array.

use crate::buffer::AllocationFailed;

use super::sort;

/// A longest common prefix between a target suffix and some old suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Match {
    /// Length of the common prefix.
    pub len: usize,
    /// Start of the matching suffix in the old buffer.
    pub pos: usize,
}

/// Length of the common prefix of `a` and `b`.
#[inline]
pub fn matchlen(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// The old buffer together with its suffix array.
pub struct SuffixIndex<'a> {
    old: &'a [u8],
    suffixes: Vec<usize>,
}

impl<'a> SuffixIndex<'a> {
    /// Sort the suffixes of `old`. The rank array is dropped once sorting
    /// completes.
    pub fn new(old: &'a [u8]) -> Result<Self, AllocationFailed> {
        let (suffixes, _ranks) = sort::sort_suffixes(old)?;
        Ok(Self { old, suffixes })
    }

    /// The indexed buffer.
    pub fn old(&self) -> &'a [u8] {
        self.old
    }

    /// The suffix array (`old.len() + 1` entries, empty suffix first).
    pub fn suffixes(&self) -> &[usize] {
        &self.suffixes
    }

    /// Find the old suffix sharing the longest prefix with `target`.
    ///
    /// Binary search narrows the suffix array to two lexicographic
    /// neighbours of `target`; the longer of their matches wins, and a tie
    /// goes to the upper neighbour.
    pub fn longest_match(&self, target: &[u8]) -> Match {
        let old = self.old;
        let mut st = 0;
        let mut en = old.len();
        while en - st >= 2 {
            let mid = st + (en - st) / 2;
            let suffix = &old[self.suffixes[mid]..];
            let n = suffix.len().min(target.len());
            if suffix[..n] < target[..n] {
                st = mid;
            } else {
                en = mid;
            }
        }

        let lo = self.suffixes[st];
        let hi = self.suffixes[en];
        let x = matchlen(&old[lo..], target);
        let y = matchlen(&old[hi..], target);
        if x > y {
            Match { len: x, pos: lo }
        } else {
            Match { len: y, pos: hi }
        }
    }
}
