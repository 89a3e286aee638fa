// Patch file format.
//
// - `varint`   : zigzag + big-endian base-128 signed integers
// - `header`   : magic tag and the four stream/size varints
// - `container`: header followed by one compressed block of
//                 control ++ diff ++ extra

pub mod container;
pub mod header;
pub mod varint;

use std::io;

use thiserror::Error;

use crate::buffer::AllocationFailed;

pub use container::{deserialize, deserialize_with, serialize, serialize_with};
pub use header::{PATCH_MAGIC, PatchHeader};
pub use varint::VarIntError;

/// A patch file could not be written or parsed.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("not a patch: bad magic {found:02x?}")]
    BadMagic { found: Vec<u8> },
    #[error("header field {field}: {source}")]
    HeaderVarint {
        field: &'static str,
        #[source]
        source: VarIntError,
    },
    #[error("header field {field} is negative ({value})")]
    NegativeField { field: &'static str, value: i64 },
    #[error("header field {field} is out of range ({value})")]
    FieldOutOfRange { field: &'static str, value: u64 },
    #[error("payload of {bytes} bytes cannot be held in memory")]
    PayloadTooLarge { bytes: u64 },
    #[error("payload decompressed to {actual} bytes, header declares {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("payload compression failed: {0}")]
    Compress(#[source] io::Error),
    #[error("payload decompression failed: {0}")]
    Decompress(#[source] io::Error),
    #[error(transparent)]
    Alloc(#[from] AllocationFailed),
}
