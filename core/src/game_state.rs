//! Complete position: board, side to move, castling rights, en passant
//! target and the two move counters, mirroring the six FEN fields.

use crate::board::Board;
use crate::types::*;

pub(crate) const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub(crate) const KING_DELTAS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub(crate) const DIAGONALS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
pub(crate) const STRAIGHTS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameState {
    pub board: Board,
    pub turn: Color,
    pub castling: CastlingRights,
    /// Square a pawn skipped over on the previous ply, if any
    pub en_passant: Option<Square>,
    /// Plies since the last pawn move or capture (fifty-move rule)
    pub halfmove_clock: u16,
    /// Starts at 1, incremented after Black moves
    pub fullmove_number: u16,
}

impl GameState {
    /// Creates a new game in the starting position.
    pub fn new() -> Self {
        Self {
            board: Board::starting_position(),
            turn: Color::White,
            castling: CastlingRights::all(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Creates an empty game state for testing.
    pub fn empty() -> Self {
        Self {
            board: Board::empty(),
            turn: Color::White,
            castling: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.turn
    }

    /// Returns true if the game is drawn by the 50-move rule.
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Returns true if neither side can possibly deliver mate.
    pub fn is_insufficient_material(&self) -> bool {
        let white = self.count_material(Color::White);
        let black = self.count_material(Color::Black);

        match (white.is_bare_king(), black.is_bare_king()) {
            (true, true) => true,
            (true, false) => black.is_king_and_minor() || black.is_king_and_two_knights(),
            (false, true) => white.is_king_and_minor() || white.is_king_and_two_knights(),
            (false, false) => false,
        }
    }

    fn count_material(&self, color: Color) -> MaterialCount {
        let mut count = MaterialCount::default();
        for (_, piece) in self.board.pieces().filter(|(_, p)| p.color == color) {
            match piece.piece_type {
                PieceType::Pawn => count.pawns += 1,
                PieceType::Knight => count.knights += 1,
                PieceType::Bishop => count.bishops += 1,
                PieceType::Rook => count.rooks += 1,
                PieceType::Queen => count.queens += 1,
                PieceType::King => {}
            }
        }
        count
    }

    /// Applies a move, returning the resulting state.
    /// Legality is not checked; `None` means the origin square is empty.
    pub fn apply_move(&self, mv: Move) -> Option<Self> {
        let piece = self.board.piece_at(mv.from)?;
        let mut next = self.clone();
        next.en_passant = None;

        if mv.is_castle(piece) {
            next.apply_castle(mv);
            next.halfmove_clock += 1;
        } else {
            let mut captured = next.board.move_piece(mv.from, mv.to);

            if piece.piece_type == PieceType::Pawn && Some(mv.to) == self.en_passant {
                let victim = Square::new(mv.to.file(), mv.from.rank());
                captured = captured.or(next.board.piece_at(victim));
                next.board.set_piece(victim, None);
            }

            if let Some(promotion) = mv.promotion {
                next.board
                    .set_piece(mv.to, Some(Piece::new(promotion, piece.color)));
            }

            if piece.piece_type == PieceType::Pawn && mv.from.distance(mv.to) == 2 {
                next.en_passant = mv.from.offset(0, piece.color.pawn_direction());
            }

            if piece.piece_type == PieceType::Pawn || captured.is_some() {
                next.halfmove_clock = 0;
            } else {
                next.halfmove_clock += 1;
            }
        }

        next.castling = self.castling.update_after_move(mv.from, mv.to);
        if self.turn == Color::Black {
            next.fullmove_number += 1;
        }
        next.turn = self.turn.opponent();

        Some(next)
    }

    /// Moves the king two squares and hops the rook over it.
    fn apply_castle(&mut self, mv: Move) {
        let rank = mv.from.rank();
        let kingside = mv.to.file() > mv.from.file();
        let (rook_file, rook_target) = if kingside { (7, 5) } else { (0, 3) };

        self.board.move_piece(mv.from, mv.to);
        if let (Some(from), Some(to)) = (File::new(rook_file), File::new(rook_target)) {
            self.board
                .move_piece(Square::new(from, rank), Square::new(to, rank));
        }
    }

    /// Returns true if `square` is attacked by any piece of `attacker`.
    pub fn is_attacked_by(&self, square: Square, attacker: Color) -> bool {
        let holds = |target: Option<Square>, piece_type: PieceType| {
            target.is_some_and(|sq| {
                self.board.piece_at(sq) == Some(Piece::new(piece_type, attacker))
            })
        };

        // A pawn attacks diagonally forward, so look one rank "behind" the target.
        let behind = -attacker.pawn_direction();
        if holds(square.offset(-1, behind), PieceType::Pawn)
            || holds(square.offset(1, behind), PieceType::Pawn)
        {
            return true;
        }

        if KNIGHT_DELTAS
            .iter()
            .any(|&(df, dr)| holds(square.offset(df, dr), PieceType::Knight))
        {
            return true;
        }

        if KING_DELTAS
            .iter()
            .any(|&(df, dr)| holds(square.offset(df, dr), PieceType::King))
        {
            return true;
        }

        let slides = |dirs: &[(i8, i8)], kinds: [PieceType; 2]| {
            dirs.iter().any(|&(df, dr)| {
                match self.first_piece_along(square, df, dr) {
                    Some(p) => p.color == attacker && kinds.contains(&p.piece_type),
                    None => false,
                }
            })
        };

        slides(&DIAGONALS, [PieceType::Bishop, PieceType::Queen])
            || slides(&STRAIGHTS, [PieceType::Rook, PieceType::Queen])
    }

    /// First piece met walking from `square` in the given direction.
    fn first_piece_along(&self, square: Square, df: i8, dr: i8) -> Option<Piece> {
        let mut current = square;
        while let Some(next) = current.offset(df, dr) {
            if let Some(piece) = self.board.piece_at(next) {
                return Some(piece);
            }
            current = next;
        }
        None
    }

    /// Returns true if the side to move is in check.
    pub fn is_in_check(&self) -> bool {
        self.is_side_in_check(self.turn)
    }

    /// Returns true if the given side's king is attacked. A missing king is never in check.
    pub fn is_side_in_check(&self, color: Color) -> bool {
        self.board
            .king_square(color)
            .is_some_and(|king| self.is_attacked_by(king, color.opponent()))
    }
}

#[derive(Default, Debug)]
struct MaterialCount {
    pawns: u8,
    knights: u8,
    bishops: u8,
    rooks: u8,
    queens: u8,
}

impl MaterialCount {
    fn is_bare_king(&self) -> bool {
        self.pawns + self.knights + self.bishops + self.rooks + self.queens == 0
    }

    fn is_king_and_minor(&self) -> bool {
        self.pawns == 0 && self.rooks == 0 && self.queens == 0 && self.knights + self.bishops == 1
    }

    fn is_king_and_two_knights(&self) -> bool {
        self.pawns == 0
            && self.bishops == 0
            && self.rooks == 0
            && self.queens == 0
            && self.knights == 2
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_starting_position() {
        let state = GameState::new();
        assert_eq!(state.turn, Color::White);
        assert_eq!(state.castling, CastlingRights::all());
        assert!(state.en_passant.is_none());
        assert_eq!(state.halfmove_clock, 0);
        assert_eq!(state.fullmove_number, 1);
    }

    #[test]
    fn test_apply_pawn_move() {
        let state = GameState::new();
        let next = state.apply_move(Move::new(sq("e2"), sq("e4"))).unwrap();

        assert_eq!(next.turn, Color::Black);
        assert_eq!(next.en_passant, Some(sq("e3")));
        assert_eq!(next.halfmove_clock, 0);
        assert_eq!(next.fullmove_number, 1);
    }

    #[test]
    fn test_apply_from_empty_square() {
        assert!(GameState::new()
            .apply_move(Move::new(sq("e4"), sq("e5")))
            .is_none());
    }

    #[test]
    fn test_en_passant_capture_removes_pawn() {
        let state =
            GameState::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let next = state.apply_move(Move::new(sq("e5"), sq("d6"))).unwrap();

        assert!(next.board.is_empty(sq("d5")));
        assert_eq!(
            next.board.piece_at(sq("d6")),
            Some(Piece::new(PieceType::Pawn, Color::White))
        );
        assert_eq!(next.halfmove_clock, 0);
    }

    #[test]
    fn test_castle_moves_rook() {
        let state = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 3 10").unwrap();
        let next = state.apply_move(Move::new(sq("e8"), sq("c8"))).unwrap();

        assert_eq!(
            next.board.piece_at(sq("d8")),
            Some(Piece::new(PieceType::Rook, Color::Black))
        );
        assert!(next.board.is_empty(sq("a8")));
        assert!(!next.castling.black.any());
        assert!(next.castling.white.any());
        assert_eq!(next.fullmove_number, 11);
        assert_eq!(next.halfmove_clock, 4);
    }

    #[test]
    fn test_is_attacked() {
        let mut state = GameState::empty();
        state
            .board
            .set_piece(sq("e4"), Some(Piece::new(PieceType::Rook, Color::White)));

        assert!(state.is_attacked_by(sq("e1"), Color::White));
        assert!(state.is_attacked_by(sq("e8"), Color::White));
        assert!(state.is_attacked_by(sq("a4"), Color::White));
        assert!(state.is_attacked_by(sq("h4"), Color::White));
        assert!(!state.is_attacked_by(sq("d5"), Color::White));
    }

    #[test]
    fn test_pawn_attacks_point_forward() {
        let mut state = GameState::empty();
        state
            .board
            .set_piece(sq("d4"), Some(Piece::new(PieceType::Pawn, Color::Black)));

        assert!(state.is_attacked_by(sq("c3"), Color::Black));
        assert!(state.is_attacked_by(sq("e3"), Color::Black));
        assert!(!state.is_attacked_by(sq("e5"), Color::Black));
    }

    #[test]
    fn test_insufficient_material() {
        let bare = GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(bare.is_insufficient_material());

        let minor = GameState::from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert!(minor.is_insufficient_material());

        let rook = GameState::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        assert!(!rook.is_insufficient_material());
    }
}
