//! Block files fed to the replay driver.

use std::fs;
use std::path::Path;

use hunt_core::{BlockHash, Move, StepData};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

/// One player transaction: the raw move text and the coins locked by it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInput {
    pub player: String,
    pub json: String,
    #[serde(default)]
    pub coins: i64,
}

/// A block as the replay driver reads it.
///
/// ```json
/// {"hash": "00ab…", "treasure": 900000000,
///  "moves": [{"player": "ann", "json": "{\"color\": 0}", "coins": 100000000}]}
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInput {
    /// Block hash in display (byte-reversed) hex.
    pub hash: String,
    #[serde(default)]
    pub treasure: i64,
    #[serde(default)]
    pub moves: Vec<MoveInput>,
}

impl BlockInput {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| RuntimeError::Input(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| RuntimeError::Input(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
            .map_err(|e| RuntimeError::Input(format!("{}: {}", path.display(), e)))
    }

    /// Parses every move; malformed ones are dropped with a warning, as a
    /// node would never have accepted their transactions.
    pub fn to_step_data(&self) -> Result<StepData> {
        let new_hash = BlockHash::from_hex(&self.hash)
            .map_err(|e| RuntimeError::Input(format!("block hash {:?}: {}", self.hash, e)))?;
        if self.treasure < 0 {
            return Err(RuntimeError::Input(format!("negative treasure {}", self.treasure)));
        }

        let mut moves = Vec::with_capacity(self.moves.len());
        for input in &self.moves {
            match Move::parse(&input.player, &input.json) {
                Ok(mv) => moves.push(mv.with_coin_amount(input.coins)),
                Err(err) => {
                    tracing::warn!(player = %input.player, %err, "dropping malformed move");
                }
            }
        }

        Ok(StepData {
            treasure: self.treasure,
            new_hash,
            moves,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "00000000000000000000000000000000000000000000000000000000000000ff";

    #[test]
    fn malformed_moves_are_skipped() {
        let block = BlockInput::from_json(&format!(
            r#"{{"hash": "{HASH}", "treasure": 900,
                "moves": [
                    {{"player": "ann", "json": "{{\"color\": 1}}", "coins": 5}},
                    {{"player": "bob", "json": "{{\"colour\": 1}}"}}
                ]}}"#
        ))
        .unwrap();
        let data = block.to_step_data().unwrap();
        assert_eq!(data.treasure, 900);
        assert_eq!(data.new_hash.to_hex(), HASH);
        assert_eq!(data.moves.len(), 1);
        assert_eq!(data.moves[0].player, "ann");
        assert_eq!(data.moves[0].coin_amount, 5);
    }

    #[test]
    fn bad_hash_is_an_input_error() {
        let block = BlockInput {
            hash: "xyz".into(),
            ..BlockInput::default()
        };
        assert!(matches!(block.to_step_data(), Err(RuntimeError::Input(_))));
    }
}
