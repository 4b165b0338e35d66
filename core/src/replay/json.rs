//! JSON view of a replay
//!
//! Formatting choices are passed in explicitly through [`JsonOptions`];
//! there is no process-wide serializer configuration.

use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

use crate::replay::types::{InputEvent, Replay};

/// How controller states appear in JSON output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerStateFormat {
    /// Raw bitfield as an integer
    #[default]
    Bits,
    /// List of flag names, e.g. `["UP", "JUMP"]`
    Names,
}

/// JSON output options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonOptions {
    pub pretty: bool,
    pub controller_state: ControllerStateFormat,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            controller_state: ControllerStateFormat::Bits,
        }
    }
}

/// Render a replay as JSON
pub fn to_json(replay: &Replay, options: &JsonOptions) -> Result<String, serde_json::Error> {
    match options.controller_state {
        ControllerStateFormat::Bits => render(replay, options.pretty),
        ControllerStateFormat::Names => render(&NamedReplay(replay), options.pretty),
    }
}

/// Parse a replay from JSON; controller states may be bits or flag names
pub fn from_json(json: &str) -> Result<Replay, serde_json::Error> {
    serde_json::from_str(json)
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// [`Replay`] with each controller state written as its flag names.
///
/// Field names and order follow the derived `Serialize` impl.
struct NamedReplay<'a>(&'a Replay);

struct NamedEvent<'a>(&'a InputEvent);

impl Serialize for NamedReplay<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let replay = self.0;
        let fields = if replay.trailer.is_some() { 7 } else { 6 };
        let mut state = serializer.serialize_struct("Replay", fields)?;
        state.serialize_field("format_version", &replay.format_version)?;
        state.serialize_field("random_seed", &replay.random_seed)?;
        state.serialize_field("playlist_id", &replay.playlist_id)?;
        state.serialize_field("playlist_name", &replay.playlist_name)?;
        state.serialize_field("players", &replay.players)?;
        let events: Vec<NamedEvent<'_>> = replay.events.iter().map(NamedEvent).collect();
        state.serialize_field("events", &events)?;
        match &replay.trailer {
            Some(trailer) => state.serialize_field("trailer", trailer)?,
            None => state.skip_field("trailer")?,
        }
        state.end()
    }
}

impl Serialize for NamedEvent<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let event = self.0;
        let mut state = serializer.serialize_struct("InputEvent", 3)?;
        state.serialize_field("frame", &event.frame)?;
        state.serialize_field("player_index", &event.player_index)?;
        state.serialize_field("controller_state", &event.controller_state.flag_names())?;
        state.end()
    }
}
