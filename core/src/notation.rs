//! Standard algebraic notation (SAN) for moves, e.g. `Nbd7`, `exd6`, `e8=Q+`, `O-O`.

use crate::game_state::GameState;
use crate::move_gen::generate_legal_moves;
use crate::types::{Move, PieceType};

/// Renders `mv` in SAN as played from `state`. The move is assumed legal.
pub fn to_san(state: &GameState, mv: Move) -> String {
    let Some(piece) = state.board.piece_at(mv.from) else {
        return mv.to_string();
    };

    let mut san = if mv.is_castle(piece) {
        if mv.to.file() > mv.from.file() {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else {
        let is_capture = state.board.is_enemy(mv.to, piece.color)
            || (piece.piece_type == PieceType::Pawn && Some(mv.to) == state.en_passant);
        let mut san = String::new();

        if piece.piece_type == PieceType::Pawn {
            if is_capture {
                san.push(mv.from.file().to_char());
            }
        } else {
            san.push(piece.piece_type.to_char().to_ascii_uppercase());
            san.push_str(&disambiguation(state, mv));
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&mv.to.to_string());

        if let Some(promotion) = mv.promotion {
            san.push('=');
            san.push(promotion.to_char().to_ascii_uppercase());
        }
        san
    };

    if let Some(next) = state.apply_move(mv) {
        if next.is_in_check() {
            san.push(if generate_legal_moves(&next).is_empty() {
                '#'
            } else {
                '+'
            });
        }
    }

    san
}

/// Shortest origin hint separating `mv` from same-type pieces reaching the same square.
fn disambiguation(state: &GameState, mv: Move) -> String {
    let piece = state.board.piece_at(mv.from);
    let rivals: Vec<Move> = generate_legal_moves(state)
        .into_iter()
        .filter(|other| {
            other.to == mv.to && other.from != mv.from && state.board.piece_at(other.from) == piece
        })
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|o| o.from.file() != mv.from.file()) {
        mv.from.file().to_char().to_string()
    } else if rivals.iter().all(|o| o.from.rank() != mv.from.rank()) {
        mv.from.rank().to_char().to_string()
    } else {
        mv.from.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::positions;

    fn san(fen: &str, uci: &str) -> String {
        let state = GameState::from_fen(fen).unwrap();
        to_san(&state, Move::parse(uci).unwrap())
    }

    #[test]
    fn test_simple_moves() {
        assert_eq!(san(positions::STARTING, "e2e4"), "e4");
        assert_eq!(san(positions::STARTING, "g1f3"), "Nf3");
    }

    #[test]
    fn test_captures_and_checks() {
        assert_eq!(san(positions::SCHOLARS_MATE_THREAT, "h5f7"), "Qxf7#");
        assert_eq!(san(positions::SCHOLARS_MATE_THREAT, "c4f7"), "Bxf7+");
        assert_eq!(san("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", "e5d6"), "exd6");
    }

    #[test]
    fn test_castling_and_promotion() {
        assert_eq!(san("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1g1"), "O-O");
        assert_eq!(san("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1", "e8c8"), "O-O-O");
        assert_eq!(san("7k/P7/8/8/8/8/8/K7 w - - 0 1", "a7a8q"), "a8=Q+");
    }

    #[test]
    fn test_disambiguation() {
        assert_eq!(san("4k3/8/8/8/8/8/8/R4RK1 w - - 0 1", "a1d1"), "Rad1");
        assert_eq!(san("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1", "a1a3"), "R1a3");
    }
}
