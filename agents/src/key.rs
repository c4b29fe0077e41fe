use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of leading FEN fields that identify a position: placement,
/// side to move, castling rights and en passant target.
const KEY_FIELDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("serialized state has {found} fields, need at least 4: {state:?}")]
    TooFewFields { found: usize, state: String },
}

/// Canonical identity of a position, independent of the move counters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionKey(String);

impl PositionKey {
    /// Derives the key from a full FEN by dropping the half-move clock and move number.
    pub fn from_serialized(state: &str) -> Result<Self, KeyError> {
        let fields: Vec<&str> = state.split_whitespace().collect();
        if fields.len() < KEY_FIELDS {
            return Err(KeyError::TooFewFields {
                found: fields.len(),
                state: state.to_string(),
            });
        }
        Ok(PositionKey(fields[..KEY_FIELDS].join(" ")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainchess_core::{Game, Move, RulesEngine};

    #[test]
    fn test_counters_are_dropped() {
        let a = PositionKey::from_serialized(
            "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1",
        )
        .unwrap();
        let b = PositionKey::from_serialized(
            "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 5 3",
        )
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(
            a.as_str(),
            "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq -"
        );
    }

    #[test]
    fn test_rights_and_side_are_kept() {
        let white = PositionKey::from_serialized("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let black = PositionKey::from_serialized("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_ne!(white, black);

        let castle = PositionKey::from_serialized("r3k3/8/8/8/8/8/8/4K3 b q - 0 1").unwrap();
        let no_castle = PositionKey::from_serialized("r3k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_ne!(castle, no_castle);
    }

    #[test]
    fn test_same_layout_reached_by_different_paths() {
        let mut direct = Game::new();
        direct.apply_move(Move::parse("g1f3").unwrap()).unwrap();

        let mut roundabout = Game::new();
        for uci in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3"] {
            roundabout.apply_move(Move::parse(uci).unwrap()).unwrap();
        }

        assert_ne!(direct.serialize_state(), roundabout.serialize_state());
        let key = |g: &Game| PositionKey::from_serialized(&g.serialize_state()).unwrap();
        assert_eq!(key(&direct), key(&roundabout));
        assert_eq!(key(&direct), key(&direct));
    }

    #[test]
    fn test_too_few_fields() {
        assert!(matches!(
            PositionKey::from_serialized("8/8/8/8/8/8/8/8 w"),
            Err(KeyError::TooFewFields { found: 2, .. })
        ));
        assert!(PositionKey::from_serialized("").is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = PositionKey::from_serialized("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(
            serde_json::to_string(&key).unwrap(),
            "\"4k3/8/8/8/8/8/8/4K3 w - -\""
        );
    }
}
