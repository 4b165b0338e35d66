//! Error types for the replay codec
//!
//! The bit cursor and the compressor raise narrow errors ([`BitError`],
//! [`CompressionError`]). The header and event codecs lift those into
//! [`ErrorKind`], and the assembler attaches the stage and byte offset to
//! produce a [`LoadError`] or [`SaveError`].

use std::fmt;

use crate::replay::types::Frame;

/// Bit cursor failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitError {
    /// A read would cross the end of the buffer
    #[error("out of data: needed {requested} bits at bit {position}, {available} available")]
    OutOfData {
        position: usize,
        requested: u32,
        available: usize,
    },

    /// Bit width outside 1..=64
    #[error("invalid bit width {0} (must be 1-64)")]
    InvalidWidth(u32),

    /// Variable-length integer does not fit in 64 bits
    #[error("variable-length integer at bit {position} exceeds 64 bits")]
    VarIntOverflow { position: usize },

    /// Variable-length integer padded with a trailing zero group
    #[error("non-canonical variable-length integer at bit {position}")]
    NonCanonicalVarInt { position: usize },

    /// Value has bits set above the requested width
    #[error("value {value:#x} does not fit in {width} bits")]
    ValueTooWide { value: u64, width: u32 },
}

/// Payload compressor failures
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("deflate failed: {0}")]
    Deflate(#[from] std::io::Error),
}

/// What went wrong, independent of where
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Bit-level failure other than running out of data
    #[error(transparent)]
    Bits(BitError),

    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u64),

    /// Input ended in the middle of a field or record
    #[error("stream truncated")]
    TruncatedStream,

    #[error("player index {index} out of range for {player_count} players")]
    InvalidPlayerIndex { index: u64, player_count: usize },

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("string is not valid UTF-8")]
    InvalidString,

    #[error("{field} value {value} out of range")]
    ValueOutOfRange { field: &'static str, value: u64 },

    #[error("frame number overflows after event {event}")]
    FrameOverflow { event: usize },

    #[error("{0} unexpected trailing bits")]
    TrailingData(usize),

    #[error("event {event} at frame {frame} precedes frame {previous}")]
    UnsortedEvents {
        event: usize,
        frame: Frame,
        previous: Frame,
    },

    #[error("controller state {state:#06x} of event {event} does not fit in {width} bits")]
    ControllerStateOverflow { event: usize, state: u16, width: u32 },

    #[error("{0} players exceeds the roster limit")]
    TooManyPlayers(usize),

    #[error("{field} of {size} bytes exceeds the format limit")]
    PayloadTooLarge { field: &'static str, size: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BitError> for ErrorKind {
    fn from(e: BitError) -> Self {
        match e {
            BitError::OutOfData { .. } => ErrorKind::TruncatedStream,
            other => ErrorKind::Bits(other),
        }
    }
}

impl From<CompressionError> for ErrorKind {
    fn from(e: CompressionError) -> Self {
        match e {
            CompressionError::CorruptPayload(reason) => ErrorKind::CorruptPayload(reason),
            CompressionError::Deflate(io) => ErrorKind::Io(io),
        }
    }
}

/// Section of the file being processed when an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading from the source or writing to the sink
    Io,
    Header,
    PayloadLength,
    Payload,
    Trailer,
    Events,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Io => "I/O",
            Stage::Header => "header",
            Stage::PayloadLength => "payload length",
            Stage::Payload => "payload",
            Stage::Trailer => "trailer",
            Stage::Events => "event stream",
        };
        f.write_str(name)
    }
}

/// Failure to decode a replay.
///
/// `offset` is a byte offset into the file, except for [`Stage::Events`]
/// where it points into the decompressed event payload.
#[derive(Debug, thiserror::Error)]
#[error("failed to load replay: {stage} at byte {offset}: {kind}")]
pub struct LoadError {
    pub stage: Stage,
    pub offset: usize,
    #[source]
    pub kind: ErrorKind,
}

impl LoadError {
    pub fn new(stage: Stage, offset: usize, kind: impl Into<ErrorKind>) -> Self {
        Self {
            stage,
            offset,
            kind: kind.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

/// Failure to encode a replay
#[derive(Debug, thiserror::Error)]
#[error("failed to save replay: {stage}: {kind}")]
pub struct SaveError {
    pub stage: Stage,
    #[source]
    pub kind: ErrorKind,
}

impl SaveError {
    pub fn new(stage: Stage, kind: impl Into<ErrorKind>) -> Self {
        Self {
            stage,
            kind: kind.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_data_becomes_truncation() {
        let kind = ErrorKind::from(BitError::OutOfData {
            position: 8,
            requested: 32,
            available: 4,
        });
        assert!(matches!(kind, ErrorKind::TruncatedStream));

        let kind = ErrorKind::from(BitError::InvalidWidth(65));
        assert!(matches!(kind, ErrorKind::Bits(BitError::InvalidWidth(65))));
    }

    #[test]
    fn test_load_error_message() {
        let err = LoadError::new(
            Stage::Trailer,
            120,
            ErrorKind::ChecksumMismatch {
                stored: 1,
                computed: 2,
            },
        );
        assert_eq!(
            err.to_string(),
            "failed to load replay: trailer at byte 120: checksum mismatch: stored 0x00000001, computed 0x00000002"
        );
    }
}
