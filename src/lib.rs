//! bsdelta: suffix-array binary delta encoding in Rust.
//!
//! Given an old and a new buffer, [`diff`] produces a [`Delta`]: a control
//! stream of `(copy, insert, seek)` triples plus a diff stream of byte-wise
//! residuals and an extra stream of literal bytes. [`patch`] replays a delta
//! against the old buffer. [`serialize`] and [`deserialize`] convert a delta
//! to and from the bzip2-compressed patch file format.
//!
//! The crate provides:
//! - The delta core (`suffix`, `delta`)
//! - The patch file format (`format`) and payload compression (`compress`)
//! - One-call buffer APIs (`engine`) and file helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! let old = b"hello old world";
//! let new = b"hello new world";
//!
//! let delta = bsdelta::diff(old, new).unwrap();
//! let bytes = bsdelta::serialize(&delta).unwrap();
//!
//! let parsed = bsdelta::deserialize(&bytes).unwrap();
//! assert_eq!(bsdelta::patch(old, &parsed).unwrap(), new);
//! ```

pub mod buffer;
pub mod compress;
pub mod delta;
pub mod engine;
pub mod format;
pub mod io;
pub mod suffix;

#[cfg(feature = "cli")]
pub mod cli;

pub use buffer::AllocationFailed;
pub use delta::{ControlTriple, Delta, PatchError, PatchOptions, diff, patch, patch_with_options};
pub use engine::{DecodeOptions, EncodeOptions, Error, decode, encode};
pub use format::{FormatError, deserialize, serialize};
