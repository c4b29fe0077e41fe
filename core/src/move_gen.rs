use crate::game_state::{GameState, DIAGONALS, KING_DELTAS, KNIGHT_DELTAS, STRAIGHTS};
use crate::types::{Color, File, Move, Piece, PieceType, Square};

/// Generates all legal moves for the current position.
pub fn generate_legal_moves(state: &GameState) -> Vec<Move> {
    let mover = state.turn;
    generate_pseudo_legal_moves(state)
        .into_iter()
        .filter(|&mv| {
            state
                .apply_move(mv)
                .is_some_and(|next| !next.is_side_in_check(mover))
        })
        .collect()
}

/// Generates moves that obey piece movement but may leave the king in check.
fn generate_pseudo_legal_moves(state: &GameState) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    let color = state.turn;

    for (from, piece) in state.board.pieces().filter(|(_, p)| p.color == color) {
        match piece.piece_type {
            PieceType::Pawn => generate_pawn_moves(state, from, color, &mut moves),
            PieceType::Knight => generate_step_moves(state, from, color, &KNIGHT_DELTAS, &mut moves),
            PieceType::Bishop => generate_sliding_moves(state, from, color, &DIAGONALS, &mut moves),
            PieceType::Rook => generate_sliding_moves(state, from, color, &STRAIGHTS, &mut moves),
            PieceType::Queen => {
                generate_sliding_moves(state, from, color, &DIAGONALS, &mut moves);
                generate_sliding_moves(state, from, color, &STRAIGHTS, &mut moves);
            }
            PieceType::King => generate_step_moves(state, from, color, &KING_DELTAS, &mut moves),
        }
    }
    generate_castling_moves(state, color, &mut moves);

    moves
}

/// Pushes a pawn move, expanding it into the four promotions on the last rank.
fn push_pawn_move(from: Square, to: Square, color: Color, moves: &mut Vec<Move>) {
    if to.rank() == color.promotion_rank() {
        for piece_type in PieceType::PROMOTIONS {
            moves.push(Move::new_promotion(from, to, piece_type));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}

fn generate_pawn_moves(state: &GameState, from: Square, color: Color, moves: &mut Vec<Move>) {
    let board = &state.board;
    let direction = color.pawn_direction();

    if let Some(single) = from.offset(0, direction).filter(|&sq| board.is_empty(sq)) {
        push_pawn_move(from, single, color, moves);

        if from.rank() == color.pawn_rank() {
            if let Some(double) = single.offset(0, direction).filter(|&sq| board.is_empty(sq)) {
                moves.push(Move::new(from, double));
            }
        }
    }

    for side in [-1, 1] {
        let Some(target) = from.offset(side, direction) else {
            continue;
        };
        if board.is_enemy(target, color) {
            push_pawn_move(from, target, color, moves);
        } else if Some(target) == state.en_passant {
            moves.push(Move::new(from, target));
        }
    }
}

/// Knight and king moves: single jumps to empty or enemy squares.
fn generate_step_moves(
    state: &GameState,
    from: Square,
    color: Color,
    deltas: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in deltas {
        if let Some(to) = from.offset(df, dr) {
            if !state.board.is_color(to, color) {
                moves.push(Move::new(from, to));
            }
        }
    }
}

/// Rays stop at the first piece, which is included when it is an enemy.
fn generate_sliding_moves(
    state: &GameState,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in directions {
        let mut current = from;
        while let Some(to) = current.offset(df, dr) {
            if state.board.is_empty(to) {
                moves.push(Move::new(from, to));
            } else {
                if state.board.is_enemy(to, color) {
                    moves.push(Move::new(from, to));
                }
                break;
            }
            current = to;
        }
    }
}

/// Castling needs the right, a clear path, and no attacked square on the king's way.
fn generate_castling_moves(state: &GameState, color: Color, moves: &mut Vec<Move>) {
    let rights = state.castling.get(color);
    if !rights.any() {
        return;
    }

    let rank = color.back_rank();
    let at = |file: u8| File::new(file).map(|f| Square::new(f, rank));
    let (Some(king_square), Some(rook_kingside), Some(rook_queenside)) = (at(4), at(7), at(0))
    else {
        return;
    };
    let king = Piece::new(PieceType::King, color);
    let rook = Piece::new(PieceType::Rook, color);
    if state.board.piece_at(king_square) != Some(king) {
        return;
    }
    if state.is_attacked_by(king_square, color.opponent()) {
        return;
    }

    let clear = |files: &[u8]| {
        files
            .iter()
            .all(|&f| at(f).is_some_and(|sq| state.board.is_empty(sq)))
    };
    let safe = |files: &[u8]| {
        files.iter().all(|&f| {
            at(f).is_some_and(|sq| !state.is_attacked_by(sq, color.opponent()))
        })
    };

    if rights.kingside
        && state.board.piece_at(rook_kingside) == Some(rook)
        && clear(&[5, 6])
        && safe(&[5, 6])
    {
        if let Some(to) = at(6) {
            moves.push(Move::new(king_square, to));
        }
    }

    if rights.queenside
        && state.board.piece_at(rook_queenside) == Some(rook)
        && clear(&[1, 2, 3])
        && safe(&[2, 3])
    {
        if let Some(to) = at(2) {
            moves.push(Move::new(king_square, to));
        }
    }
}

/// Checks if the current position is checkmate.
pub fn is_checkmate(state: &GameState) -> bool {
    state.is_in_check() && generate_legal_moves(state).is_empty()
}

/// Checks if the current position is stalemate.
pub fn is_stalemate(state: &GameState) -> bool {
    !state.is_in_check() && generate_legal_moves(state).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::positions;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn perft(state: &GameState, depth: u8) -> u64 {
        if depth == 0 {
            return 1;
        }
        generate_legal_moves(state)
            .into_iter()
            .filter_map(|mv| state.apply_move(mv))
            .map(|next| perft(&next, depth - 1))
            .sum()
    }

    #[test]
    fn test_starting_position_moves() {
        assert_eq!(generate_legal_moves(&GameState::new()).len(), 20);
    }

    #[test]
    fn test_perft_starting_position() {
        let state = GameState::new();
        assert_eq!(perft(&state, 2), 400);
        assert_eq!(perft(&state, 3), 8_902);
    }

    #[test]
    fn test_perft_kiwipete() {
        let state = GameState::from_fen(positions::KIWIPETE).unwrap();
        assert_eq!(perft(&state, 1), 48);
        assert_eq!(perft(&state, 2), 2_039);
    }

    #[test]
    fn test_pawn_promotion() {
        let state = GameState::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let pawn_moves: Vec<_> = generate_legal_moves(&state)
            .into_iter()
            .filter(|m| m.from == sq("a7"))
            .collect();

        assert_eq!(pawn_moves.len(), 4);
        assert!(pawn_moves.iter().all(|m| m.promotion.is_some()));
    }

    #[test]
    fn test_en_passant_generated() {
        let state = GameState::from_fen(positions::AFTER_E4_E5).unwrap();
        assert!(!generate_legal_moves(&state).contains(&Move::new(sq("e4"), sq("e5"))));

        let state = GameState::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert!(generate_legal_moves(&state).contains(&Move::new(sq("e5"), sq("d6"))));
    }

    #[test]
    fn test_castling_blocked_by_attack() {
        let state = GameState::from_fen("4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1").unwrap();
        let moves = generate_legal_moves(&state);

        assert!(!moves.contains(&Move::new(sq("e1"), sq("g1"))));
        assert!(moves.contains(&Move::new(sq("e1"), sq("c1"))));
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        let mated = GameState::from_fen("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(is_checkmate(&mated));
        assert!(!is_stalemate(&mated));

        let stalemated = GameState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(is_stalemate(&stalemated));
        assert!(!is_checkmate(&stalemated));
    }
}
