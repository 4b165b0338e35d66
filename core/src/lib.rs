//! Brawl Replay Core - replay file codec
//!
//! This crate decodes the compact binary replay files recorded by the game
//! into a structured [`Replay`] and encodes them back, byte for byte.
//!
//! # Architecture
//!
//! - [`replay::binary::bits`] - Bit cursor (LSB-first bit reads/writes, varints)
//! - [`replay::binary::compression`] - Raw deflate around the event stream
//! - [`replay::binary::header`] - Version, seed, playlist and roster
//! - [`replay::binary::events`] - Delta-encoded per-player input events
//! - [`replay::load`] / [`replay::save`] - Assemble the pieces into a file

pub mod replay;

// Re-export the codec entry points and model
pub use replay::{
    CodecConfig, ControllerState, InputEvent, JsonOptions, LoadError, Player, Replay, SaveError,
    StreamEnd, Trailer, load, save,
};
