//! Event stream codec
//!
//! The decompressed payload is a bit-packed list of records:
//!
//! ```text
//! [frame_delta: varint][player_index: varint][state_delta: layout.controller_bits]
//! ```
//!
//! `frame_delta` is relative to the previous record's frame (the first record
//! is relative to frame 0). `state_delta` is XORed onto the last state seen for
//! the same player, which starts at zero. The stream ends with a terminator
//! record (`frame_delta` 0, `player_index` [`STREAM_TERMINATOR`], no state)
//! followed by zero padding to a byte boundary. A stream may also simply run
//! out at a record boundary; [`StreamEnd`] records which of the two ended it
//! so the encoder can reproduce it.
//!
//! Records are never reordered: same-frame events keep their stored order.

use crate::replay::binary::StreamLayout;
use crate::replay::binary::bits::{BitReader, BitWriter};
use crate::replay::error::ErrorKind;
use crate::replay::types::{ControllerState, Frame, InputEvent, StreamEnd};

/// Player index reserved for the end-of-stream record
pub const STREAM_TERMINATOR: u8 = 127;

/// Running per-player state shared by both directions
struct DeltaState {
    frame: Frame,
    last_state: Vec<u16>,
}

impl DeltaState {
    fn new(player_count: usize) -> Self {
        Self {
            frame: 0,
            last_state: vec![0; player_count],
        }
    }
}

/// Decode events until the terminator or the end of the payload
pub fn decode_events(
    reader: &mut BitReader<'_>,
    layout: StreamLayout,
    player_count: usize,
) -> Result<(Vec<InputEvent>, StreamEnd), ErrorKind> {
    let mut state = DeltaState::new(player_count);
    let mut events = Vec::new();

    loop {
        // Fewer than 8 bits cannot hold a record: only padding is left
        if reader.remaining_bits() < 8 {
            return finish(reader, events, StreamEnd::Exhausted);
        }

        let frame_delta = reader.read_varint()?;
        let index = reader.read_varint()?;

        if index == u64::from(STREAM_TERMINATOR) {
            if frame_delta != 0 {
                return Err(ErrorKind::ValueOutOfRange {
                    field: "terminator frame delta",
                    value: frame_delta,
                });
            }
            return finish(reader, events, StreamEnd::Terminator);
        }

        let player_index = match usize::try_from(index) {
            Ok(i) if i < player_count => i,
            _ => {
                return Err(ErrorKind::InvalidPlayerIndex {
                    index,
                    player_count,
                });
            }
        };

        let event_number = events.len();
        state.frame = u32::try_from(frame_delta)
            .ok()
            .and_then(|delta| state.frame.checked_add(delta))
            .ok_or(ErrorKind::FrameOverflow {
                event: event_number,
            })?;

        let delta = reader.read_bits(layout.controller_bits)? as u16;
        let current = state.last_state[player_index] ^ delta;
        state.last_state[player_index] = current;

        events.push(InputEvent {
            frame: state.frame,
            // player_count <= MAX_PLAYERS, so the index fits
            player_index: player_index as u8,
            controller_state: ControllerState::from_bits_retain(current),
        });
    }
}

/// Consume the zero padding after the last record
fn finish(
    reader: &mut BitReader<'_>,
    events: Vec<InputEvent>,
    end: StreamEnd,
) -> Result<(Vec<InputEvent>, StreamEnd), ErrorKind> {
    let padding = reader.skip_padding()?;
    let leftover = reader.remaining_bits();
    if padding != 0 || leftover != 0 {
        return Err(ErrorKind::TrailingData(
            leftover + padding.count_ones() as usize,
        ));
    }
    Ok((events, end))
}

/// Encode events, then the terminator if `end` asks for one, then padding
pub fn encode_events(
    writer: &mut BitWriter,
    events: &[InputEvent],
    layout: StreamLayout,
    player_count: usize,
    end: StreamEnd,
) -> Result<(), ErrorKind> {
    let mut state = DeltaState::new(player_count);
    let max_state = layout.max_state();

    for (event_number, event) in events.iter().enumerate() {
        let player_index = usize::from(event.player_index);
        if player_index >= player_count {
            return Err(ErrorKind::InvalidPlayerIndex {
                index: u64::from(event.player_index),
                player_count,
            });
        }
        if event.frame < state.frame {
            return Err(ErrorKind::UnsortedEvents {
                event: event_number,
                frame: event.frame,
                previous: state.frame,
            });
        }
        let bits = event.controller_state.bits();
        if bits > max_state {
            return Err(ErrorKind::ControllerStateOverflow {
                event: event_number,
                state: bits,
                width: layout.controller_bits,
            });
        }

        writer.write_varint(u64::from(event.frame - state.frame))?;
        writer.write_varint(player_index as u64)?;
        writer.write_bits(
            u64::from(state.last_state[player_index] ^ bits),
            layout.controller_bits,
        )?;

        state.frame = event.frame;
        state.last_state[player_index] = bits;
    }

    if end == StreamEnd::Terminator {
        writer.write_varint(0)?;
        writer.write_varint(u64::from(STREAM_TERMINATOR))?;
    }
    writer.pad_to_byte();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1: StreamLayout = StreamLayout { controller_bits: 14 };
    const V2: StreamLayout = StreamLayout { controller_bits: 16 };

    fn event(frame: Frame, player_index: u8, bits: u16) -> InputEvent {
        InputEvent::new(frame, player_index, ControllerState::from_bits_retain(bits))
    }

    fn encode(events: &[InputEvent], layout: StreamLayout, players: usize) -> Vec<u8> {
        let mut writer = BitWriter::new();
        encode_events(&mut writer, events, layout, players, StreamEnd::Terminator).unwrap();
        writer.into_bytes()
    }

    /// Decode a stream that must end at the terminator
    fn decode(
        payload: &[u8],
        layout: StreamLayout,
        players: usize,
    ) -> Result<Vec<InputEvent>, ErrorKind> {
        let (events, end) = decode_events(&mut BitReader::new(payload), layout, players)?;
        assert_eq!(end, StreamEnd::Terminator);
        Ok(events)
    }

    fn decode_exhausted(payload: &[u8], layout: StreamLayout, players: usize) -> Vec<InputEvent> {
        let (events, end) = decode_events(&mut BitReader::new(payload), layout, players).unwrap();
        assert_eq!(end, StreamEnd::Exhausted);
        events
    }

    fn example_events() -> Vec<InputEvent> {
        vec![event(0, 0, 0b0001), event(0, 1, 0b0000), event(5, 0, 0b0011)]
    }

    #[test]
    fn test_v1_payload_bytes() {
        let payload = encode(&example_events(), V1, 2);
        assert_eq!(
            payload,
            vec![
                0x00, 0x00, 0x01, 0x00, 0x40, 0x00, 0x00, 0x50, 0x00, 0x20, 0x00, 0x00, 0xFC,
                0x01
            ]
        );
        assert_eq!(decode(&payload, V1, 2).unwrap(), example_events());
    }

    #[test]
    fn test_v2_payload_bytes() {
        // 16-bit states keep every field byte-aligned
        let payload = encode(&example_events(), V2, 2);
        assert_eq!(
            payload,
            vec![
                0x00, 0x00, 0x01, 0x00, // frame +0, player 0, state ^ 0x0001
                0x00, 0x01, 0x00, 0x00, // frame +0, player 1, state ^ 0x0000
                0x05, 0x00, 0x02, 0x00, // frame +5, player 0, state ^ 0x0002
                0x00, 0x7F, // terminator
            ]
        );
        assert_eq!(decode(&payload, V2, 2).unwrap(), example_events());
    }

    #[test]
    fn test_empty_stream() {
        let payload = encode(&[], V1, 0);
        assert_eq!(payload, vec![0x00, 0x7F]);
        assert!(decode(&payload, V1, 0).unwrap().is_empty());

        // An empty payload is exhausted before any record
        assert!(decode_exhausted(&[], V1, 0).is_empty());
    }

    #[test]
    fn test_same_frame_order_preserved() {
        let events = vec![
            event(10, 2, 0x10),
            event(10, 0, 0x01),
            event(10, 1, 0x02),
            event(10, 0, 0x03),
        ];
        let payload = encode(&events, V2, 3);
        assert_eq!(decode(&payload, V2, 3).unwrap(), events);
    }

    #[test]
    fn test_per_player_deltas() {
        // Player 1 changing state must not disturb player 0's running state
        let events = vec![
            event(0, 0, 0x3FFF),
            event(1, 1, 0x0001),
            event(2, 0, 0x3FFF),
            event(3, 1, 0x0000),
        ];
        let payload = encode(&events, V1, 2);
        assert_eq!(decode(&payload, V1, 2).unwrap(), events);
    }

    #[test]
    fn test_large_frame_gaps() {
        let events = vec![event(1_000_000, 0, 1), event(u32::MAX, 0, 2)];
        let payload = encode(&events, V2, 1);
        assert_eq!(decode(&payload, V2, 1).unwrap(), events);
    }

    #[test]
    fn test_missing_terminator_is_accepted() {
        let mut writer = BitWriter::new();
        writer.write_varint(3).unwrap();
        writer.write_varint(0).unwrap();
        writer.write_bits(0x5, 14).unwrap();
        writer.pad_to_byte();
        let payload = writer.into_bytes();

        assert_eq!(decode_exhausted(&payload, V1, 1), vec![event(3, 0, 0x5)]);

        // Encoding without the terminator gives back the same bytes
        let mut writer = BitWriter::new();
        encode_events(&mut writer, &[event(3, 0, 0x5)], V1, 1, StreamEnd::Exhausted).unwrap();
        assert_eq!(writer.into_bytes(), payload);
    }

    #[test]
    fn test_highest_player_index() {
        // Index 126 sits right below the terminator's 127
        let events = vec![event(0, 126, 0x0001), event(1, 0, 0x0002), event(1, 126, 0x0003)];
        let payload = encode(&events, V2, 127);
        assert_eq!(&payload[..4], &[0x00, 0x7E, 0x01, 0x00]);
        assert_eq!(&payload[payload.len() - 2..], &[0x00, 0x7F]);
        assert_eq!(decode(&payload, V2, 127).unwrap(), events);
    }

    #[test]
    fn test_truncated_record() {
        let payload = encode(&example_events(), V2, 2);
        // Drop the terminator and half of the last state delta
        let err = decode(&payload[..11], V2, 2).unwrap_err();
        assert!(matches!(err, ErrorKind::TruncatedStream));
    }

    #[test]
    fn test_invalid_player_index() {
        let mut writer = BitWriter::new();
        writer.write_varint(0).unwrap();
        writer.write_varint(2).unwrap();
        writer.write_bits(0, 16).unwrap();
        let payload = writer.into_bytes();

        let err = decode(&payload, V2, 2).unwrap_err();
        assert!(matches!(
            err,
            ErrorKind::InvalidPlayerIndex {
                index: 2,
                player_count: 2
            }
        ));

        let mut writer = BitWriter::new();
        let err = encode_events(&mut writer, &[event(0, 2, 0)], V2, 2, StreamEnd::Terminator)
            .unwrap_err();
        assert!(matches!(err, ErrorKind::InvalidPlayerIndex { index: 2, .. }));
    }

    #[test]
    fn test_terminator_with_frame_delta() {
        let payload = [0x01, 0x7F];
        let err = decode(&payload, V1, 1).unwrap_err();
        assert!(matches!(err, ErrorKind::ValueOutOfRange { value: 1, .. }));
    }

    #[test]
    fn test_trailing_data() {
        let mut payload = encode(&example_events(), V2, 2);
        payload.push(0x00);
        let err = decode(&payload, V2, 2).unwrap_err();
        assert!(matches!(err, ErrorKind::TrailingData(8)));

        // Non-zero padding bits after the terminator
        let mut payload = encode(&example_events(), V1, 2);
        let last = payload.len() - 1;
        payload[last] |= 0x80;
        let err = decode(&payload, V1, 2).unwrap_err();
        assert!(matches!(err, ErrorKind::TrailingData(1)));
    }

    #[test]
    fn test_frame_overflow() {
        let mut writer = BitWriter::new();
        for _ in 0..2 {
            writer.write_varint(u64::from(u32::MAX)).unwrap();
            writer.write_varint(0).unwrap();
            writer.write_bits(0, 16).unwrap();
        }
        let payload = writer.into_bytes();

        let err = decode(&payload, V2, 1).unwrap_err();
        assert!(matches!(err, ErrorKind::FrameOverflow { event: 1 }));
    }

    #[test]
    fn test_unsorted_events() {
        let events = [event(5, 0, 0), event(4, 0, 0)];
        let err = encode_events(&mut BitWriter::new(), &events, V1, 1, StreamEnd::Terminator)
            .unwrap_err();
        assert!(matches!(
            err,
            ErrorKind::UnsortedEvents {
                event: 1,
                frame: 4,
                previous: 5
            }
        ));
    }

    #[test]
    fn test_state_wider_than_layout() {
        let events = [event(0, 0, 1 << 14)];
        let err = encode_events(&mut BitWriter::new(), &events, V1, 1, StreamEnd::Terminator)
            .unwrap_err();
        assert!(matches!(
            err,
            ErrorKind::ControllerStateOverflow { width: 14, .. }
        ));

        // The same state fits a version 2 stream
        assert!(
            encode_events(&mut BitWriter::new(), &events, V2, 1, StreamEnd::Terminator).is_ok()
        );
    }
}
