//! Versioned binary layout of [`GameState`].
//!
//! A snapshot is a little-endian `u32` schema version followed by the bincode
//! encoding of the state. Field order in the state types is the layout order.
//! Snapshots below [`MIN_STATE_VERSION`] are rejected; there is no upgrade path.

use crate::state::{CharacterId, GameState, StateError};

/// Version written by this engine.
pub const STATE_VERSION: u32 = 1_020_000;

/// Oldest snapshot layout that can still be read.
pub const MIN_STATE_VERSION: u32 = 1_001_100;

const HEADER_LEN: usize = 4;

pub fn encode_state(state: &GameState) -> Result<Vec<u8>, StateError> {
    let body = bincode::serialize(state).map_err(|e| StateError::Encode(e.to_string()))?;
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&STATE_VERSION.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decodes a snapshot and checks that no character holds a refund record.
pub fn decode_state(bytes: &[u8]) -> Result<GameState, StateError> {
    let (version, body) = split_header(bytes)?;
    if version < MIN_STATE_VERSION {
        return Err(StateError::UnsupportedVersion {
            found: version,
            minimum: MIN_STATE_VERSION,
        });
    }
    let state: GameState =
        bincode::deserialize(body).map_err(|e| StateError::Decode(e.to_string()))?;
    check_loot(&state)?;
    Ok(state)
}

/// Schema version of a snapshot without decoding the body.
pub fn peek_version(bytes: &[u8]) -> Result<u32, StateError> {
    split_header(bytes).map(|(version, _)| version)
}

fn split_header(bytes: &[u8]) -> Result<(u32, &[u8]), StateError> {
    let Some((head, body)) = bytes.split_first_chunk::<HEADER_LEN>() else {
        return Err(StateError::Truncated { len: bytes.len() });
    };
    Ok((u32::from_le_bytes(*head), body))
}

fn check_loot(state: &GameState) -> Result<(), StateError> {
    for (name, player) in &state.players {
        for (&index, ch) in &player.characters {
            if ch.loot.is_refund() {
                return Err(StateError::RefundInState {
                    character: CharacterId::new(name.clone(), index),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Coord, PlayerState};
    use crate::testing::character_at;

    fn sample() -> GameState {
        let mut state = GameState::new();
        state.height = 12;
        state.game_fund = 7;
        state.add_loot(Coord::new(30, 40), 500);
        state.hearts.insert(Coord::new(31, 41));
        let mut player = PlayerState {
            color: 2,
            message: "hi".into(),
            ..PlayerState::default()
        };
        let mut ch = character_at(Coord::new(10, 10));
        ch.waypoints.push(Coord::new(12, 10));
        player.characters.insert(0, ch);
        state.players.insert("ann".into(), player);
        state
    }

    #[test]
    fn decoding_reproduces_the_state() {
        let state = sample();
        let bytes = encode_state(&state).unwrap();
        assert_eq!(peek_version(&bytes).unwrap(), STATE_VERSION);
        assert_eq!(decode_state(&bytes).unwrap(), state);
    }

    #[test]
    fn old_layouts_are_rejected() {
        let mut bytes = encode_state(&sample()).unwrap();
        bytes[..4].copy_from_slice(&1_001_099u32.to_le_bytes());
        assert_eq!(
            decode_state(&bytes),
            Err(StateError::UnsupportedVersion {
                found: 1_001_099,
                minimum: MIN_STATE_VERSION,
            })
        );
    }

    #[test]
    fn short_buffers_are_truncated() {
        assert_eq!(
            decode_state(&[1, 2]),
            Err(StateError::Truncated { len: 2 })
        );
    }

    #[test]
    fn refund_records_are_not_valid_state() {
        let mut state = sample();
        let ch = state.players.get_mut("ann").unwrap().characters.get_mut(&0).unwrap();
        ch.loot.loot.amount = 100;
        ch.loot.collected_first_block = -1;
        let bytes = encode_state(&state).unwrap();
        assert!(matches!(
            decode_state(&bytes),
            Err(StateError::RefundInState { .. })
        ));
    }
}
