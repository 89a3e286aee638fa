// Fallible allocation for the O(n) working arrays.
//
// Suffix sorting, diffing and patching each size their buffers from the
// inputs (or from an untrusted patch header), so allocation failure is
// reported as an error instead of aborting the process.

use thiserror::Error;

/// A working buffer could not be allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to allocate {bytes} bytes for {what}")]
pub struct AllocationFailed {
    /// What the buffer was for (e.g. "suffix ranks").
    pub what: &'static str,
    /// Requested size in bytes (saturating).
    pub bytes: u64,
}

impl AllocationFailed {
    pub(crate) fn of<T>(what: &'static str, len: usize) -> Self {
        Self {
            what,
            bytes: (len as u64).saturating_mul(std::mem::size_of::<T>() as u64),
        }
    }
}

/// Allocate an empty `Vec` able to hold `len` elements without reallocating.
pub(crate) fn try_with_capacity<T>(
    what: &'static str,
    len: usize,
) -> Result<Vec<T>, AllocationFailed> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| AllocationFailed::of::<T>(what, len))?;
    Ok(v)
}

/// Allocate a `Vec` of `len` copies of `value`.
pub(crate) fn try_filled<T: Clone>(
    what: &'static str,
    len: usize,
    value: T,
) -> Result<Vec<T>, AllocationFailed> {
    let mut v = try_with_capacity(what, len)?;
    v.resize(len, value);
    Ok(v)
}

/// Make room for `additional` more elements in `v`.
pub(crate) fn try_grow<T>(
    v: &mut Vec<T>,
    what: &'static str,
    additional: usize,
) -> Result<(), AllocationFailed> {
    v.try_reserve(additional)
        .map_err(|_| AllocationFailed::of::<T>(what, v.len().saturating_add(additional)))
}
