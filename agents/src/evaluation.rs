use brainchess_core::{BoardSnapshot, Color};

/// Material balance of a position: positive favours White, negative favours Black.
///
/// Each piece contributes its fixed material value (pawn 10, knight 30,
/// bishop 30, rook 50, queen 90, king 900). Nothing else is considered.
pub fn evaluate(board: &BoardSnapshot) -> i32 {
    board
        .pieces()
        .map(|piece| piece.color.sign() * piece.piece_type.material_value())
        .sum()
}

/// Material balance from `side`'s point of view.
pub fn evaluate_for(board: &BoardSnapshot, side: Color) -> i32 {
    side.sign() * evaluate(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainchess_core::{positions, Game, GameState, RulesEngine};

    fn snapshot(fen: &str) -> BoardSnapshot {
        Game::from_fen(fen).unwrap().board_snapshot()
    }

    #[test]
    fn test_starting_position_is_balanced() {
        assert_eq!(evaluate(&Game::new().board_snapshot()), 0);
    }

    #[test]
    fn test_kings_only_is_zero() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "k7/8/8/8/8/8/8/7K b - - 0 1",
            "8/8/3k4/8/8/4K3/8/8 w - - 0 1",
        ] {
            assert_eq!(evaluate(&snapshot(fen)), 0);
        }
    }

    #[test]
    fn test_empty_board_is_zero() {
        let empty = BoardSnapshot::from_board(&GameState::empty().board);
        assert_eq!(evaluate(&empty), 0);
    }

    #[test]
    fn test_material_advantage() {
        // White queen against black rook
        let board = snapshot("4k3/8/8/8/8/8/3r4/3QK3 w - - 0 1");
        assert_eq!(evaluate(&board), 40);
        assert_eq!(evaluate_for(&board, Color::White), 40);
        assert_eq!(evaluate_for(&board, Color::Black), -40);
    }

    #[test]
    fn test_lone_king_counts() {
        // A missing king is just missing material
        let board = snapshot("8/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(evaluate(&board), 900);
    }

    #[test]
    fn test_mirror_symmetry() {
        for fen in [
            positions::STARTING,
            positions::KIWIPETE,
            positions::SCHOLARS_MATE_THREAT,
            "4k3/8/8/8/8/8/3r4/3QK3 w - - 0 1",
            "7k/P7/8/8/8/8/8/K7 w - - 0 1",
        ] {
            let board = snapshot(fen);
            assert_eq!(evaluate(&board.mirrored()), -evaluate(&board), "{fen}");
        }
    }
}
