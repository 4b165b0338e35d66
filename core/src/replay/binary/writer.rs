//! Binary replay format writer
//!
//! Encodes the header, compresses the event stream and appends the recomputed
//! length and checksum. Nothing is written to a sink until encoding succeeds.

use std::io::Write;

use crate::replay::binary::bits::BitWriter;
use crate::replay::binary::events::encode_events;
use crate::replay::binary::header::{Header, encode_header};
use crate::replay::binary::{CodecConfig, compression, payload_checksum};
use crate::replay::error::{ErrorKind, SaveError, Stage};
use crate::replay::types::{Replay, StreamEnd};

/// Encode a replay with the default configuration
pub fn save(replay: &Replay) -> Result<Vec<u8>, SaveError> {
    save_with(replay, &CodecConfig::default())
}

/// Encode a replay.
///
/// The stored length and checksum are ignored and recomputed. The stream
/// ending recorded in the trailer is kept, so a file loaded without a
/// terminator saves without one.
pub fn save_with(replay: &Replay, config: &CodecConfig) -> Result<Vec<u8>, SaveError> {
    let header = Header::from_replay(replay);
    let layout = header
        .layout()
        .map_err(|e| SaveError::new(Stage::Header, e))?;

    let mut out = BitWriter::new();
    encode_header(&mut out, &header).map_err(|e| SaveError::new(Stage::Header, e))?;

    // Roughly four bytes per record before compression
    let mut stream = BitWriter::with_capacity(replay.events.len() * 4 + 2);
    let stream_end = replay
        .trailer
        .map_or(StreamEnd::Terminator, |trailer| trailer.stream_end);
    encode_events(
        &mut stream,
        &replay.events,
        layout,
        header.players.len(),
        stream_end,
    )
    .map_err(|e| SaveError::new(Stage::Events, e))?;
    let payload = stream.into_bytes();
    let checksum = payload_checksum(&payload);

    let compressed = compression::deflate(&payload, config.compression_level)
        .map_err(|e| SaveError::new(Stage::Payload, e))?;
    let compressed_length = u32::try_from(compressed.len()).map_err(|_| {
        SaveError::new(
            Stage::PayloadLength,
            ErrorKind::PayloadTooLarge {
                field: "compressed payload",
                size: compressed.len(),
            },
        )
    })?;
    tracing::trace!(
        payload_bytes = payload.len(),
        compressed_bytes = compressed.len(),
        "compressed event stream"
    );

    out.write_u32(compressed_length)
        .map_err(|e| SaveError::new(Stage::PayloadLength, e))?;
    out.write_bytes(&compressed)
        .map_err(|e| SaveError::new(Stage::Payload, e))?;
    out.write_u32(checksum)
        .map_err(|e| SaveError::new(Stage::Trailer, e))?;

    let bytes = out.into_bytes();
    tracing::debug!(
        bytes = bytes.len(),
        events = replay.events.len(),
        "saved replay"
    );
    Ok(bytes)
}

/// Writer for binary replay format
pub struct BinaryWriter<W: Write> {
    writer: W,
    config: CodecConfig,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new binary writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            config: CodecConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Write a complete replay to the output
    pub fn write_replay(&mut self, replay: &Replay) -> Result<(), SaveError> {
        let bytes = save_with(replay, &self.config)?;
        self.writer
            .write_all(&bytes)
            .and_then(|()| self.writer.flush())
            .map_err(|e| SaveError::new(Stage::Io, e))
    }

    /// Consume the writer and return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}
