//! Short state fingerprints for logs.

use hunt_core::{GameState, StateError, encode_state};
use sha2::{Digest, Sha256};

/// First 8 bytes of the SHA-256 of the encoded snapshot, as hex.
pub fn state_digest(state: &GameState) -> Result<String, StateError> {
    let bytes = encode_state(state)?;
    let hash = Sha256::digest(&bytes);
    Ok(hex::encode(&hash[..8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_short() {
        let state = GameState::new();
        let a = state_digest(&state).unwrap();
        assert_eq!(a, state_digest(&state).unwrap());
        assert_eq!(a.len(), 16);

        let mut other = state.clone();
        other.game_fund = 1;
        assert_ne!(a, state_digest(&other).unwrap());
    }
}
