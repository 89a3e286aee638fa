// File-level helpers for diffing and patching.
//
// Provides `diff_file()` and `patch_file()`, which read both inputs fully
// into memory, run the engine, and write the result through a `BufWriter`.
// With the `file-io` feature, SHA-256 digests of the new file and of the
// reconstructed output are reported so callers can verify a roundtrip.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::compress::Bzip2Backend;
use crate::delta::{self, Delta};
use crate::engine::{DecodeOptions, EncodeOptions, Error};
use crate::format;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `diff_file()`.
#[derive(Debug, Clone)]
pub struct DiffStats {
    /// Old file size in bytes.
    pub old_size: u64,
    /// New file size in bytes.
    pub new_size: u64,
    /// Patch file size in bytes.
    pub patch_size: u64,
    /// Number of control triples emitted.
    pub triples: u64,
    /// Bytes carried by the diff stream.
    pub diff_len: u64,
    /// Bytes carried by the extra stream.
    pub extra_len: u64,
    /// SHA-256 of the new file (if `file-io` feature is enabled).
    pub new_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `patch_file()`.
#[derive(Debug, Clone)]
pub struct PatchStats {
    /// Old file size in bytes.
    pub old_size: u64,
    /// Patch file size in bytes.
    pub patch_size: u64,
    /// Reconstructed output size in bytes.
    pub output_size: u64,
    /// Number of control triples applied.
    pub triples: u64,
    /// SHA-256 of the reconstructed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Opening, reading or writing `path` failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Diffing, parsing or applying failed.
    #[error(transparent)]
    Delta(#[from] Error),
}

impl IoError {
    fn at(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// diff_file
// ---------------------------------------------------------------------------

/// Diff `old_path` against `new_path`, writing a patch to `patch_path`.
pub fn diff_file(
    old_path: &Path,
    new_path: &Path,
    patch_path: &Path,
    opts: &EncodeOptions,
) -> Result<DiffStats, IoError> {
    let old = std::fs::read(old_path).map_err(IoError::at(old_path))?;
    let new = std::fs::read(new_path).map_err(IoError::at(new_path))?;

    let delta = delta::diff(&old, &new).map_err(Error::from)?;
    let patch = format::serialize_with(&delta, &Bzip2Backend::new(opts.level))
        .map_err(Error::from)?;
    write_file(patch_path, &patch)?;

    Ok(DiffStats {
        old_size: old.len() as u64,
        new_size: new.len() as u64,
        patch_size: patch.len() as u64,
        triples: triple_count(&delta),
        diff_len: delta.diff_stream().len() as u64,
        extra_len: delta.extra().len() as u64,
        new_sha256: sha256(&new),
    })
}

// ---------------------------------------------------------------------------
// patch_file
// ---------------------------------------------------------------------------

/// Apply the patch at `patch_path` to `old_path`, writing `output_path`.
///
/// Nothing is written unless the whole patch applies cleanly.
pub fn patch_file(
    old_path: &Path,
    patch_path: &Path,
    output_path: &Path,
    opts: &DecodeOptions,
) -> Result<PatchStats, IoError> {
    let old = std::fs::read(old_path).map_err(IoError::at(old_path))?;
    let patch = std::fs::read(patch_path).map_err(IoError::at(patch_path))?;

    let delta = format::deserialize(&patch).map_err(Error::from)?;
    let output = delta::patch_with_options(&old, &delta, &opts.patch).map_err(Error::from)?;
    write_file(output_path, &output)?;

    Ok(PatchStats {
        old_size: old.len() as u64,
        patch_size: patch.len() as u64,
        output_size: output.len() as u64,
        triples: triple_count(&delta),
        output_sha256: sha256(&output),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_file(path: &Path, data: &[u8]) -> Result<(), IoError> {
    let file = File::create(path).map_err(IoError::at(path))?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, file);
    writer.write_all(data).map_err(IoError::at(path))?;
    writer.flush().map_err(IoError::at(path))
}

/// Triples in an already-applied or freshly built delta; a stream that
/// fails to decode has been rejected before this is reached.
fn triple_count(delta: &Delta) -> u64 {
    delta.triples().take_while(Result::is_ok).count() as u64
}

#[cfg(feature = "file-io")]
fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    Some(sha2::Sha256::digest(data).into())
}

#[cfg(not(feature = "file-io"))]
fn sha256(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::PatchOptions;
    use tempfile::TempDir;

    fn write_temp_file(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn diff_patch_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let old_data = b"The quick brown fox jumps over the lazy dog. 1234567890";
        let new_data = b"The quick brown cat sits on the lazy mat. 1234567890!!!";

        let old_path = write_temp_file(&dir, "old.bin", old_data);
        let new_path = write_temp_file(&dir, "new.bin", new_data);
        let patch_path = dir.path().join("delta.patch");
        let output_path = dir.path().join("output.bin");

        let diff_stats =
            diff_file(&old_path, &new_path, &patch_path, &EncodeOptions::default()).unwrap();
        assert_eq!(diff_stats.old_size, old_data.len() as u64);
        assert_eq!(diff_stats.new_size, new_data.len() as u64);
        assert!(diff_stats.patch_size > 0);
        assert!(diff_stats.triples >= 1);
        assert_eq!(
            diff_stats.diff_len + diff_stats.extra_len,
            new_data.len() as u64
        );

        let patch_stats = patch_file(
            &old_path,
            &patch_path,
            &output_path,
            &DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(patch_stats.output_size, new_data.len() as u64);
        assert_eq!(patch_stats.triples, diff_stats.triples);
        assert_eq!(std::fs::read(&output_path).unwrap(), new_data);
    }

    #[test]
    fn empty_old_file() {
        let dir = TempDir::new().unwrap();
        let new_data = b"standalone data without any old file";
        let old_path = write_temp_file(&dir, "old.bin", b"");
        let new_path = write_temp_file(&dir, "new.bin", new_data);
        let patch_path = dir.path().join("delta.patch");
        let output_path = dir.path().join("output.bin");

        let stats =
            diff_file(&old_path, &new_path, &patch_path, &EncodeOptions::default()).unwrap();
        assert_eq!(stats.extra_len, new_data.len() as u64);
        patch_file(
            &old_path,
            &patch_path,
            &output_path,
            &DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(std::fs::read(&output_path).unwrap(), new_data);
    }

    #[cfg(feature = "file-io")]
    #[test]
    fn sha256_digests_match() {
        let dir = TempDir::new().unwrap();
        let old_path = write_temp_file(&dir, "old.bin", b"old data for digest test");
        let new_path = write_temp_file(&dir, "new.bin", b"new data for digest test");
        let patch_path = dir.path().join("delta.patch");
        let output_path = dir.path().join("output.bin");

        let diff_stats =
            diff_file(&old_path, &new_path, &patch_path, &EncodeOptions::default()).unwrap();
        let patch_stats = patch_file(
            &old_path,
            &patch_path,
            &output_path,
            &DecodeOptions::default(),
        )
        .unwrap();
        assert!(diff_stats.new_sha256.is_some());
        assert_eq!(patch_stats.output_sha256, diff_stats.new_sha256);
    }

    #[test]
    fn missing_input_names_the_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.bin");
        let new_path = write_temp_file(&dir, "new.bin", b"x");
        let err = diff_file(
            &missing,
            &new_path,
            &dir.path().join("p"),
            &EncodeOptions::default(),
        )
        .unwrap_err();
        match err {
            IoError::Io { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn corrupt_patch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let old_path = write_temp_file(&dir, "old.bin", b"abc");
        let patch_path = write_temp_file(&dir, "bad.patch", b"/_\\1garbage");
        let output_path = dir.path().join("output.bin");
        let err = patch_file(
            &old_path,
            &patch_path,
            &output_path,
            &DecodeOptions {
                patch: PatchOptions::default(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, IoError::Delta(Error::MalformedPatch(_))));
        assert!(!output_path.exists());
    }

    #[test]
    fn large_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let old_data: Vec<u8> = (0..=255u8).cycle().take(1 << 20).collect();
        let mut new_data = old_data.clone();
        for i in (0..new_data.len()).step_by(4096) {
            new_data[i] = new_data[i].wrapping_add(1);
        }

        let old_path = write_temp_file(&dir, "large_old.bin", &old_data);
        let new_path = write_temp_file(&dir, "large_new.bin", &new_data);
        let patch_path = dir.path().join("large.patch");
        let output_path = dir.path().join("large_out.bin");

        let stats =
            diff_file(&old_path, &new_path, &patch_path, &EncodeOptions::default()).unwrap();
        assert!(
            stats.patch_size < stats.new_size / 16,
            "patch should be much smaller than the new file"
        );
        patch_file(
            &old_path,
            &patch_path,
            &output_path,
            &DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(std::fs::read(&output_path).unwrap(), new_data);
    }
}
