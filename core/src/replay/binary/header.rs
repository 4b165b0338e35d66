//! Header codec
//!
//! Fixed-order fields ahead of the compressed block: format version, seed,
//! playlist, and the player roster.

use crate::replay::binary::bits::{BitReader, BitWriter};
use crate::replay::binary::{MAX_PLAYERS, StreamLayout};
use crate::replay::error::ErrorKind;
use crate::replay::types::{Player, Replay};

/// Decoded header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub format_version: u32,
    pub random_seed: u32,
    pub playlist_id: u32,
    pub playlist_name: String,
    pub players: Vec<Player>,
}

impl Header {
    /// Copy the header fields out of a replay
    pub fn from_replay(replay: &Replay) -> Self {
        Self {
            format_version: replay.format_version,
            random_seed: replay.random_seed,
            playlist_id: replay.playlist_id,
            playlist_name: replay.playlist_name.clone(),
            players: replay.players.clone(),
        }
    }

    /// Layout of the event stream that follows this header
    pub fn layout(&self) -> Result<StreamLayout, ErrorKind> {
        StreamLayout::for_version(self.format_version)
    }
}

/// Read the header from the start of a replay file
pub fn decode_header(reader: &mut BitReader<'_>) -> Result<Header, ErrorKind> {
    let version = reader.read_varint()?;
    let format_version =
        u32::try_from(version).map_err(|_| ErrorKind::UnsupportedVersion(version))?;
    // Reject unknown versions before touching version-specific fields
    StreamLayout::for_version(format_version)?;

    let random_seed = reader.read_u32()?;
    let playlist_id = reader.read_u32()?;
    let playlist_name = read_string(reader)?;

    let count = reader.read_varint()?;
    if count > MAX_PLAYERS as u64 {
        return Err(ErrorKind::TooManyPlayers(
            usize::try_from(count).unwrap_or(usize::MAX),
        ));
    }

    let mut players = Vec::with_capacity(count as usize);
    for _ in 0..count {
        players.push(read_player(reader)?);
    }

    Ok(Header {
        format_version,
        random_seed,
        playlist_id,
        playlist_name,
        players,
    })
}

/// Write the header in the same layout `decode_header` reads
pub fn encode_header(writer: &mut BitWriter, header: &Header) -> Result<(), ErrorKind> {
    header.layout()?;
    if header.players.len() > MAX_PLAYERS {
        return Err(ErrorKind::TooManyPlayers(header.players.len()));
    }

    writer.write_varint(u64::from(header.format_version))?;
    writer.write_u32(header.random_seed)?;
    writer.write_u32(header.playlist_id)?;
    write_string(writer, &header.playlist_name)?;

    writer.write_varint(header.players.len() as u64)?;
    for player in &header.players {
        write_player(writer, player)?;
    }
    Ok(())
}

fn read_player(reader: &mut BitReader<'_>) -> Result<Player, ErrorKind> {
    let id = read_varint_u32(reader, "player id")?;
    let display_name = read_string(reader)?;
    let character_id = read_varint_u32(reader, "character id")?;
    let team_id = read_varint_u32(reader, "team id")?;
    Ok(Player {
        id,
        display_name,
        character_id,
        team_id,
    })
}

fn write_player(writer: &mut BitWriter, player: &Player) -> Result<(), ErrorKind> {
    writer.write_varint(u64::from(player.id))?;
    write_string(writer, &player.display_name)?;
    writer.write_varint(u64::from(player.character_id))?;
    writer.write_varint(u64::from(player.team_id))?;
    Ok(())
}

fn read_varint_u32(reader: &mut BitReader<'_>, field: &'static str) -> Result<u32, ErrorKind> {
    let value = reader.read_varint()?;
    u32::try_from(value).map_err(|_| ErrorKind::ValueOutOfRange { field, value })
}

/// Varint byte length followed by UTF-8 bytes
fn read_string(reader: &mut BitReader<'_>) -> Result<String, ErrorKind> {
    let len = reader.read_varint()?;
    let len = usize::try_from(len).map_err(|_| ErrorKind::ValueOutOfRange {
        field: "string length",
        value: len,
    })?;
    let bytes = reader.read_bytes(len)?;
    String::from_utf8(bytes).map_err(|_| ErrorKind::InvalidString)
}

fn write_string(writer: &mut BitWriter, value: &str) -> Result<(), ErrorKind> {
    writer.write_varint(value.len() as u64)?;
    writer.write_bytes(value.as_bytes())?;
    Ok(())
}
