//! Payload compressor
//!
//! Raw deflate (no zlib or gzip framing) around the event payload. The level
//! is fixed per call so the same payload always compresses to the same bytes.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::bufread::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::replay::error::CompressionError;

/// Compression level used when none is configured
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Decompressed payloads larger than this are rejected by default
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Compress `payload` at `level` (0-9)
pub fn deflate(payload: &[u8], level: u32) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level.min(9)));
    encoder.write_all(payload)?;
    Ok(encoder.finish()?)
}

/// Decompress `compressed`, refusing output larger than `max_len` bytes.
///
/// The deflate stream must end exactly at the end of `compressed`.
pub fn inflate(compressed: &[u8], max_len: usize) -> Result<Vec<u8>, CompressionError> {
    let limit = u64::try_from(max_len).unwrap_or(u64::MAX).saturating_add(1);
    let mut decoder = DeflateDecoder::new(compressed);

    let mut payload = Vec::new();
    decoder
        .by_ref()
        .take(limit)
        .read_to_end(&mut payload)
        .map_err(|e| CompressionError::CorruptPayload(e.to_string()))?;

    if payload.len() > max_len {
        return Err(CompressionError::CorruptPayload(format!(
            "decompressed payload exceeds {max_len} bytes"
        )));
    }

    let consumed = decoder.total_in();
    if consumed != compressed.len() as u64 {
        return Err(CompressionError::CorruptPayload(format!(
            "deflate stream ends after {consumed} of {} bytes",
            compressed.len()
        )));
    }
    Ok(payload)
}
