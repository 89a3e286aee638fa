// Built-in block compressors.

use std::io::{self, Read, Write};

use bzip2::Compression;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;

use super::BlockCompressor;

/// bzip2 block size level used when none is given (900 KiB blocks).
pub const DEFAULT_LEVEL: u32 = 9;

// ---------------------------------------------------------------------------
// bzip2 backend
// ---------------------------------------------------------------------------

/// bzip2 compressor; payloads are readable by any bzip2 decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bzip2Backend {
    level: u32,
}

impl Bzip2Backend {
    /// Create a backend with the given block size level, clamped to 1-9.
    pub fn new(level: u32) -> Self {
        Self {
            level: level.clamp(1, 9),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for Bzip2Backend {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

impl BlockCompressor for Bzip2Backend {
    fn name(&self) -> &'static str {
        "bzip2"
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = BzEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8], limit: usize) -> io::Result<Vec<u8>> {
        let mut output = Vec::new();
        output.try_reserve(limit.min(data.len().saturating_mul(8)))?;
        BzDecoder::new(data)
            .take(limit as u64)
            .read_to_end(&mut output)?;
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// No-compression backend
// ---------------------------------------------------------------------------

/// Passthrough: the payload is stored as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression;

impl BlockCompressor for NoCompression {
    fn name(&self) -> &'static str {
        "none"
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8], limit: usize) -> io::Result<Vec<u8>> {
        Ok(data[..data.len().min(limit)].to_vec())
    }
}
