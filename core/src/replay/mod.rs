//! Replay codec
//!
//! Converts replay files to a structured [`Replay`] and back:
//!
//! ```text
//! load:  bytes ─▶ header ─▶ inflate ─▶ checksum ─▶ event stream ─▶ Replay
//! save:  Replay ─▶ header ─▶ event stream ─▶ checksum ─▶ deflate ─▶ bytes
//! ```
//!
//! `save(load(bytes))` reproduces `bytes` for any file written by this codec
//! with the same compression level, and `load(save(replay))` returns
//! `replay` with its trailer filled in.
//!
//! # Usage
//!
//! ```ignore
//! use brawl_replay_core::replay::{self, JsonOptions};
//!
//! let replay = replay::load(&std::fs::read("match.replay")?)?;
//! println!("{}", replay::to_json(&replay, &JsonOptions::default())?);
//!
//! let bytes = replay::save(&replay)?;
//! ```
//!
//! Both directions are pure functions over owned data and can run on
//! separate threads for separate files.

pub mod binary;
pub mod error;
pub mod json;
pub mod types;

// Re-export core types
pub use types::{ControllerState, Frame, InputEvent, Player, Replay, StreamEnd, Trailer};

// Re-export binary format
pub use binary::{
    BinaryReader, BinaryWriter, CodecConfig, StreamLayout, load, load_with, save, save_with,
};

pub use error::{BitError, CompressionError, ErrorKind, LoadError, SaveError, Stage};
pub use json::{ControllerStateFormat, JsonOptions, from_json, to_json};
