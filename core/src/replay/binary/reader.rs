//! Binary replay format reader
//!
//! Decodes a complete replay file: header, compressed event stream and
//! checksum trailer.

use std::io::Read;

use crate::replay::binary::bits::BitReader;
use crate::replay::binary::events::decode_events;
use crate::replay::binary::header::decode_header;
use crate::replay::binary::{CodecConfig, compression, payload_checksum};
use crate::replay::error::{ErrorKind, LoadError, Stage};
use crate::replay::types::{Replay, Trailer};

/// Decode a replay with the default configuration
pub fn load(bytes: &[u8]) -> Result<Replay, LoadError> {
    load_with(bytes, &CodecConfig::default())
}

/// Decode a replay
pub fn load_with(bytes: &[u8], config: &CodecConfig) -> Result<Replay, LoadError> {
    let mut cursor = BitReader::new(bytes);

    let header = decode_header(&mut cursor)
        .map_err(|e| LoadError::new(Stage::Header, cursor.byte_position(), e))?;
    let layout = header
        .layout()
        .map_err(|e| LoadError::new(Stage::Header, 0, e))?;
    tracing::trace!(
        version = header.format_version,
        players = header.players.len(),
        "decoded replay header"
    );

    let compressed_length = cursor
        .read_u32()
        .map_err(|e| LoadError::new(Stage::PayloadLength, cursor.byte_position(), e))?;

    let payload_offset = cursor.byte_position();
    let compressed = cursor
        .read_bytes(compressed_length as usize)
        .map_err(|e| LoadError::new(Stage::Payload, payload_offset, e))?;

    let trailer_offset = cursor.byte_position();
    let stored_checksum = cursor
        .read_u32()
        .map_err(|e| LoadError::new(Stage::Trailer, trailer_offset, e))?;

    let leftover = cursor.remaining_bits();
    if leftover != 0 {
        return Err(LoadError::new(
            Stage::Trailer,
            cursor.byte_position(),
            ErrorKind::TrailingData(leftover),
        ));
    }

    let payload = compression::inflate(&compressed, config.max_payload_bytes)
        .map_err(|e| LoadError::new(Stage::Payload, payload_offset, e))?;

    let computed = payload_checksum(&payload);
    if computed != stored_checksum {
        return Err(LoadError::new(
            Stage::Trailer,
            trailer_offset,
            ErrorKind::ChecksumMismatch {
                stored: stored_checksum,
                computed,
            },
        ));
    }

    let mut stream = BitReader::new(&payload);
    let (events, stream_end) = decode_events(&mut stream, layout, header.players.len())
        .map_err(|e| LoadError::new(Stage::Events, stream.byte_position(), e))?;

    tracing::debug!(
        bytes = bytes.len(),
        payload_bytes = payload.len(),
        events = events.len(),
        "loaded replay"
    );

    Ok(Replay {
        format_version: header.format_version,
        random_seed: header.random_seed,
        playlist_id: header.playlist_id,
        playlist_name: header.playlist_name,
        players: header.players,
        events,
        trailer: Some(Trailer {
            compressed_length,
            checksum: stored_checksum,
            stream_end,
        }),
    })
}

/// Reader for binary replay format
pub struct BinaryReader<R: Read> {
    reader: R,
    config: CodecConfig,
}

impl<R: Read> BinaryReader<R> {
    /// Create a new binary reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            config: CodecConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Read a complete replay from the input
    pub fn read_replay(&mut self) -> Result<Replay, LoadError> {
        let mut bytes = Vec::new();
        self.reader
            .read_to_end(&mut bytes)
            .map_err(|e| LoadError::new(Stage::Io, bytes.len(), e))?;
        load_with(&bytes, &self.config)
    }
}
