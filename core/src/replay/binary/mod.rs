//! Binary replay format
//!
//! # File Structure
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │ Header                                         │
//! │ ├─ format_version: varint                      │
//! │ ├─ random_seed: u32                            │
//! │ ├─ playlist_id: u32                            │
//! │ ├─ playlist_name: varint len + UTF-8           │
//! │ └─ players: varint count, then per player      │
//! │      id, name, character_id, team_id           │
//! ├────────────────────────────────────────────────┤
//! │ compressed_length: u32                         │
//! ├────────────────────────────────────────────────┤
//! │ Event stream (raw deflate)                     │
//! ├────────────────────────────────────────────────┤
//! │ checksum: u32 (xxHash32 of the event stream)   │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! All fields go through the bit cursor, packed least-significant bit first;
//! `u32` fields are little-endian. See [`events`] for the stream layout.

pub mod bits;
pub mod compression;
pub mod events;
pub mod header;
mod reader;
mod writer;

pub use bits::{BitReader, BitWriter};
pub use events::STREAM_TERMINATOR;
pub use header::Header;
pub use reader::{BinaryReader, load, load_with};
pub use writer::{BinaryWriter, save, save_with};

use crate::replay::error::ErrorKind;

/// Format version written by [`crate::replay::Replay::default`]
pub const CURRENT_VERSION: u32 = 2;

/// Versions this build can read and write
pub const SUPPORTED_VERSIONS: [u32; 2] = [1, 2];

/// Largest roster a replay can carry; index 127 is the stream terminator
pub const MAX_PLAYERS: usize = STREAM_TERMINATOR as usize;

/// Seed for the payload checksum
const CHECKSUM_SEED: u32 = 0;

/// Checksum stored in the trailer
pub fn payload_checksum(payload: &[u8]) -> u32 {
    xxhash_rust::xxh32::xxh32(payload, CHECKSUM_SEED)
}

/// Version-dependent shape of the event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLayout {
    /// Width of a controller-state delta in bits
    pub controller_bits: u32,
}

impl StreamLayout {
    pub fn for_version(version: u32) -> Result<Self, ErrorKind> {
        match version {
            1 => Ok(Self { controller_bits: 14 }),
            2 => Ok(Self { controller_bits: 16 }),
            other => Err(ErrorKind::UnsupportedVersion(u64::from(other))),
        }
    }

    /// Largest controller state this layout can hold
    pub fn max_state(&self) -> u16 {
        (u32::MAX >> (32 - self.controller_bits)) as u16
    }
}

/// Codec settings
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Deflate level (0-9) used by `save`
    pub compression_level: u32,
    /// Upper bound on the decompressed event stream accepted by `load`
    pub max_payload_bytes: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression_level: compression::DEFAULT_COMPRESSION_LEVEL,
            max_payload_bytes: compression::DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}
