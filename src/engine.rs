// Delta engine: one-call encode/decode over whole buffers.
//
// Encoding runs the suffix sort and diff loop, then serializes the delta
// into a compressed patch. Decoding parses the patch and replays it
// against the old buffer.

use std::io;

use thiserror::Error;

use crate::buffer::AllocationFailed;
use crate::compress::{Bzip2Backend, DEFAULT_LEVEL};
use crate::delta::{self, PatchError, PatchOptions};
use crate::format::{self, FormatError};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for encoding.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// bzip2 block size level (1-9).
    pub level: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

/// Configuration for decoding.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub patch: PatchOptions,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Every way an encode or decode can fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    AllocationFailed(#[from] AllocationFailed),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed patch: {0}")]
    MalformedPatch(#[source] FormatError),
    #[error("corrupt patch: {0}")]
    CorruptPatch(#[source] PatchError),
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        match e {
            FormatError::Compress(e) => Self::Io(e),
            FormatError::Alloc(e) => Self::AllocationFailed(e),
            other => Self::MalformedPatch(other),
        }
    }
}

impl From<PatchError> for Error {
    fn from(e: PatchError) -> Self {
        match e {
            PatchError::Alloc(e) => Self::AllocationFailed(e),
            other => Self::CorruptPatch(other),
        }
    }
}

// ---------------------------------------------------------------------------
// High-level encode
// ---------------------------------------------------------------------------

/// Diff `old` against `new` and append the patch to `output`.
pub fn encode(old: &[u8], new: &[u8], output: &mut Vec<u8>) -> Result<(), Error> {
    encode_with_options(old, new, output, &EncodeOptions::default())
}

/// Encode with custom options.
pub fn encode_with_options(
    old: &[u8],
    new: &[u8],
    output: &mut Vec<u8>,
    opts: &EncodeOptions,
) -> Result<(), Error> {
    let delta = delta::diff(old, new)?;
    let patch = format::serialize_with(&delta, &Bzip2Backend::new(opts.level))?;
    output.extend_from_slice(&patch);
    Ok(())
}

// ---------------------------------------------------------------------------
// High-level decode
// ---------------------------------------------------------------------------

/// Apply `patch` to `old`, reconstructing the new buffer.
pub fn decode(old: &[u8], patch: &[u8]) -> Result<Vec<u8>, Error> {
    decode_with_options(old, patch, &DecodeOptions::default())
}

/// Decode with custom options.
pub fn decode_with_options(
    old: &[u8],
    patch: &[u8],
    opts: &DecodeOptions,
) -> Result<Vec<u8>, Error> {
    let delta = format::deserialize(patch)?;
    Ok(delta::patch_with_options(old, &delta, &opts.patch)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
