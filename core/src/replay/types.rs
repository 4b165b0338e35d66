//! Core types for the replay codec
//!
//! These are the fixed-shape records produced by `load` and consumed by
//! `save`. They carry no behaviour beyond small lookup helpers; all format
//! knowledge lives in [`crate::replay::binary`].

use serde::{Deserialize, Serialize};

use crate::replay::binary::StreamLayout;
use crate::replay::error::ErrorKind;

/// Frame index type (one simulation tick)
pub type Frame = u32;

/// Complete replay data (in-memory representation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Format version; selects the controller-state width of the event stream
    pub format_version: u32,
    /// Random seed the match was played with
    pub random_seed: u32,
    /// Playlist (queue) identifier
    pub playlist_id: u32,
    /// Human-readable playlist name
    pub playlist_name: String,
    /// Player roster, referenced by index from `events`
    pub players: Vec<Player>,
    /// Input events sorted by non-decreasing frame
    pub events: Vec<InputEvent>,
    /// Length/checksum metadata as read from the file.
    ///
    /// Filled in by `load`. `save` recomputes the length and checksum and only
    /// honours [`Trailer::stream_end`]; without a trailer the stream is
    /// terminated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer: Option<Trailer>,
}

impl Default for Replay {
    fn default() -> Self {
        Self {
            format_version: crate::replay::binary::CURRENT_VERSION,
            random_seed: 0,
            playlist_id: 0,
            playlist_name: String::new(),
            players: Vec::new(),
            events: Vec::new(),
            trailer: None,
        }
    }
}

impl Replay {
    /// Number of frames covered by the event stream (last frame + 1)
    pub fn frame_count(&self) -> u64 {
        self.events
            .last()
            .map_or(0, |event| u64::from(event.frame) + 1)
    }

    /// Look up a player by roster index
    pub fn player(&self, index: u8) -> Option<&Player> {
        self.players.get(usize::from(index))
    }

    /// Iterate over the events of a single player, in stream order
    pub fn events_for_player(&self, index: u8) -> impl Iterator<Item = &InputEvent> + '_ {
        self.events
            .iter()
            .filter(move |event| event.player_index == index)
    }

    /// Event stream layout for this replay's format version
    pub fn stream_layout(&self) -> Result<StreamLayout, ErrorKind> {
        StreamLayout::for_version(self.format_version)
    }
}

/// One roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player identifier, unique within a replay
    pub id: u32,
    pub display_name: String,
    pub character_id: u32,
    pub team_id: u32,
}

/// Controller state of one player at one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub frame: Frame,
    /// Index into [`Replay::players`]
    pub player_index: u8,
    pub controller_state: ControllerState,
}

impl InputEvent {
    pub fn new(frame: Frame, player_index: u8, controller_state: ControllerState) -> Self {
        Self {
            frame,
            player_index,
            controller_state,
        }
    }
}

/// Compressed length and payload checksum stored around the compressed block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trailer {
    /// Size of the deflate block in bytes
    pub compressed_length: u32,
    /// xxHash32 (seed 0) of the decompressed event payload
    pub checksum: u32,
    /// How the event stream ended
    #[serde(default)]
    pub stream_end: StreamEnd,
}

/// How an event stream ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEnd {
    /// Terminator record, then zero padding
    #[default]
    Terminator,
    /// The payload ran out at a record boundary
    Exhausted,
}

bitflags::bitflags! {
    /// Held buttons and directions.
    ///
    /// Version 1 streams store bits 0-13; version 2 widens the field to all
    /// 16 bits. Bits without a name are retained as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ControllerState: u16 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const JUMP = 1 << 4;
        const PRIORITIZE_NEUTRAL = 1 << 5;
        const PICKUP_THROW = 1 << 6;
        const DODGE_DASH = 1 << 7;
        const HEAVY_ATTACK = 1 << 8;
        const LIGHT_ATTACK = 1 << 9;
        const TAUNT_UP = 1 << 10;
        const TAUNT_DOWN = 1 << 11;
        const TAUNT_LEFT = 1 << 12;
        const TAUNT_RIGHT = 1 << 13;
        /// Version 2 only
        const PAUSE = 1 << 14;
        /// Version 2 only
        const GADGET = 1 << 15;
    }
}

impl ControllerState {
    /// Names of the set flags, in bit order
    pub fn flag_names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }

    /// Build a state from flag names; `None` if any name is unknown
    pub fn from_flag_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        names
            .into_iter()
            .try_fold(Self::empty(), |state, name| {
                Self::from_name(name).map(|flag| state | flag)
            })
    }
}

// Serialized as raw bits so every state round-trips, including unnamed bits.
impl Serialize for ControllerState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ControllerState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bits(u16),
            Names(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bits(bits) => Ok(ControllerState::from_bits_retain(bits)),
            Repr::Names(names) => {
                ControllerState::from_flag_names(names.iter().map(String::as_str)).ok_or_else(
                    || serde::de::Error::custom(format!("unknown controller flag in {names:?}")),
                )
            }
        }
    }
}
