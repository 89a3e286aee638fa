// Whole-patch serialization: header, then the three streams compressed
// together as one block.

use log::debug;

use super::FormatError;
use super::header::PatchHeader;
use crate::buffer;
use crate::compress::{BlockCompressor, Bzip2Backend};
use crate::delta::Delta;

/// Serialize `delta` as a bzip2 patch at the default (maximum) level.
pub fn serialize(delta: &Delta) -> Result<Vec<u8>, FormatError> {
    serialize_with(delta, &Bzip2Backend::default())
}

/// Serialize `delta`, compressing the payload with `compressor`.
pub fn serialize_with(
    delta: &Delta,
    compressor: &dyn BlockCompressor,
) -> Result<Vec<u8>, FormatError> {
    let header = PatchHeader::for_delta(delta);
    let mut out = header.encode()?;

    let payload_len = delta.control().len() + delta.diff_stream().len() + delta.extra().len();
    let mut payload = buffer::try_with_capacity("patch payload", payload_len)?;
    payload.extend_from_slice(delta.control());
    payload.extend_from_slice(delta.diff_stream());
    payload.extend_from_slice(delta.extra());

    let packed = compressor
        .compress(&payload)
        .map_err(FormatError::Compress)?;
    debug!(
        "serialize: {} payload bytes -> {} {} bytes",
        payload.len(),
        packed.len(),
        compressor.name()
    );
    out.extend_from_slice(&packed);
    Ok(out)
}

/// Parse a bzip2 patch.
pub fn deserialize(bytes: &[u8]) -> Result<Delta, FormatError> {
    deserialize_with(bytes, &Bzip2Backend::default())
}

/// Parse a patch whose payload was compressed with `compressor`.
///
/// The payload must decompress to exactly the sum of the three declared
/// stream lengths.
pub fn deserialize_with(
    bytes: &[u8],
    compressor: &dyn BlockCompressor,
) -> Result<Delta, FormatError> {
    let (header, header_len) = PatchHeader::decode(bytes)?;
    let total = header.payload_len().ok_or(FormatError::PayloadTooLarge { bytes: u64::MAX })?;
    let expected =
        usize::try_from(total).map_err(|_| FormatError::PayloadTooLarge { bytes: total })?;
    let limit = expected
        .checked_add(1)
        .ok_or(FormatError::PayloadTooLarge { bytes: total })?;

    let mut payload = compressor
        .decompress(&bytes[header_len..], limit)
        .map_err(FormatError::Decompress)?;
    if payload.len() != expected {
        return Err(FormatError::SizeMismatch {
            expected: total,
            actual: payload.len() as u64,
        });
    }

    // Lengths are bounded by `expected`, which fits in usize.
    let control_len = header.control_len as usize;
    let diff_len = header.diff_len as usize;
    let extra = payload.split_off(control_len + diff_len);
    let diff = payload.split_off(control_len);
    let control = payload;
    Ok(Delta::from_parts(control, diff, extra, header.new_size))
}
