// Block compression for the patch payload.
//
// The container compresses the concatenated control, diff and extra streams
// as a single block. Backends are pluggable through `BlockCompressor`:
//
// - `Bzip2Backend` : bzip2 stream (the standard patch format)
// - `NoCompression`: passthrough, for tests and debugging

mod backends;

use std::io;

pub use backends::{Bzip2Backend, DEFAULT_LEVEL, NoCompression};

/// A pluggable compressor for the patch payload.
///
/// # Implementing a custom backend
///
/// ```no_run
/// use bsdelta::compress::BlockCompressor;
///
/// struct Stored;
///
/// impl BlockCompressor for Stored {
///     fn name(&self) -> &'static str { "stored" }
///     fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
///         Ok(data.to_vec())
///     }
///     fn decompress(&self, data: &[u8], limit: usize) -> std::io::Result<Vec<u8>> {
///         Ok(data[..data.len().min(limit)].to_vec())
///     }
/// }
/// ```
pub trait BlockCompressor: Send + Sync {
    /// Short name for logs and `info` output.
    fn name(&self) -> &'static str;

    /// Compress one block.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompress a block produced by [`compress`](Self::compress), stopping
    /// after at most `limit` output bytes.
    fn decompress(&self, data: &[u8], limit: usize) -> io::Result<Vec<u8>>;
}
