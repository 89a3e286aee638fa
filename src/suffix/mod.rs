// Suffix sorting and longest-match search over the old buffer.
//
// - `sort`  : prefix-doubling suffix sort (suffix array + rank array)
// - `search`: binary search of the suffix array for the longest match

pub mod search;
pub mod sort;

pub use search::{Match, SuffixIndex, matchlen};
pub use sort::sort_suffixes;
