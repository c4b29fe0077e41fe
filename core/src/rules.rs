//! The rules-engine surface the rest of the workspace plays through:
//! legal moves, apply/undo, board snapshots, game-over detection and
//! state serialization.

use crate::board::Board;
use crate::fen::FenError;
use crate::game_state::GameState;
use crate::move_gen::generate_legal_moves;
use crate::notation::to_san;
use crate::types::{CastlingRights, Color, File, Move, Piece, PieceType, Rank, Square};
use std::fmt;

/// A legal move together with its SAN text.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CandidateMove {
    pub mv: Move,
    pub san: String,
}

impl CandidateMove {
    pub fn from(&self) -> Square {
        self.mv.from
    }

    pub fn to(&self) -> Square {
        self.mv.to
    }

    pub fn promotion(&self) -> Option<PieceType> {
        self.mv.promotion
    }
}

impl fmt::Display for CandidateMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.san)
    }
}

/// 8×8 grid of pieces; row 0 is rank 8 and column 0 is the a-file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoardSnapshot {
    rows: [[Option<Piece>; 8]; 8],
}

impl BoardSnapshot {
    pub fn from_board(board: &Board) -> Self {
        let mut rows = [[None; 8]; 8];
        for (square, piece) in board.pieces() {
            let row = 7 - square.rank().index() as usize;
            rows[row][square.file().index() as usize] = Some(piece);
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.rows
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.rows[7 - square.rank().index() as usize][square.file().index() as usize]
    }

    /// Iterates over every occupied cell.
    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.rows.iter().flatten().flatten().copied()
    }

    /// Colour-flipped, rank-mirrored copy: the same position seen from the other side.
    pub fn mirrored(&self) -> Self {
        let mut rows = [[None; 8]; 8];
        for (row, cells) in self.rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                rows[7 - row][col] = cell.map(Piece::flipped);
            }
        }
        Self { rows }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DrawReason {
    Stalemate,
    FiftyMoveRule,
    InsufficientMaterial,
    ThreefoldRepetition,
}

/// How a finished game ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum GameResult {
    Win(Color),
    Draw(DrawReason),
}

impl GameResult {
    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::Win(color) => Some(color),
            GameResult::Draw(_) => None,
        }
    }
}

/// Operations a game front-end or move selector needs from a chess rules engine.
pub trait RulesEngine {
    /// All legal moves for the side to move.
    fn legal_moves(&self) -> Vec<CandidateMove>;

    /// Legal moves starting on `from`.
    fn legal_moves_from(&self, from: Square) -> Vec<CandidateMove> {
        self.legal_moves()
            .into_iter()
            .filter(|c| c.from() == from)
            .collect()
    }

    /// Plays `mv` if it is legal. Returns `None` and leaves the position untouched otherwise.
    fn apply_move(&mut self, mv: Move) -> Option<CandidateMove>;

    /// Takes back the last applied move.
    fn undo_last_move(&mut self) -> Option<Move>;

    fn board_snapshot(&self) -> BoardSnapshot;

    fn side_to_move(&self) -> Color;

    fn piece_at(&self, square: Square) -> Option<Piece>;

    fn is_in_check(&self) -> bool;

    fn is_checkmate(&self) -> bool;

    fn is_draw(&self) -> bool;

    fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }

    /// Full state as six-field FEN.
    fn serialize_state(&self) -> String;
}

/// A game in progress: the current position plus every earlier one, for undo and repetition.
#[derive(Clone, Debug, Default)]
pub struct Game {
    state: GameState,
    history: Vec<(GameState, Move)>,
}

impl Game {
    pub fn new() -> Self {
        Self::from_state(GameState::new())
    }

    pub fn from_state(state: GameState) -> Self {
        Self {
            state,
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        GameState::from_fen(fen).map(Self::from_state)
    }

    /// Back to the starting position with an empty history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Moves played so far, oldest first.
    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.history.iter().map(|(_, mv)| *mv)
    }

    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    fn has_legal_move(&self) -> bool {
        !generate_legal_moves(&self.state).is_empty()
    }

    /// Number of times the current position (ignoring counters) has occurred.
    fn repetitions(&self) -> usize {
        let same = |other: &GameState| {
            other.board == self.state.board
                && other.turn == self.state.turn
                && other.castling == self.state.castling
                && other.en_passant == self.state.en_passant
        };
        1 + self.history.iter().filter(|(s, _)| same(s)).count()
    }

    pub fn draw_reason(&self) -> Option<DrawReason> {
        if !self.state.is_in_check() && !self.has_legal_move() {
            Some(DrawReason::Stalemate)
        } else if self.state.is_fifty_move_draw() {
            Some(DrawReason::FiftyMoveRule)
        } else if self.state.is_insufficient_material() {
            Some(DrawReason::InsufficientMaterial)
        } else if self.repetitions() >= 3 {
            Some(DrawReason::ThreefoldRepetition)
        } else {
            None
        }
    }

    /// The result if the game is over.
    pub fn result(&self) -> Option<GameResult> {
        if self.is_checkmate() {
            Some(GameResult::Win(self.state.turn.opponent()))
        } else {
            self.draw_reason().map(GameResult::Draw)
        }
    }

    pub fn castling(&self) -> CastlingRights {
        self.state.castling
    }
}

impl RulesEngine for Game {
    fn legal_moves(&self) -> Vec<CandidateMove> {
        generate_legal_moves(&self.state)
            .into_iter()
            .map(|mv| CandidateMove {
                mv,
                san: to_san(&self.state, mv),
            })
            .collect()
    }

    fn apply_move(&mut self, mv: Move) -> Option<CandidateMove> {
        if !generate_legal_moves(&self.state).contains(&mv) {
            return None;
        }
        let next = self.state.apply_move(mv)?;
        let san = to_san(&self.state, mv);
        let previous = std::mem::replace(&mut self.state, next);
        self.history.push((previous, mv));
        Some(CandidateMove { mv, san })
    }

    fn undo_last_move(&mut self) -> Option<Move> {
        let (previous, mv) = self.history.pop()?;
        self.state = previous;
        Some(mv)
    }

    fn board_snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::from_board(&self.state.board)
    }

    fn side_to_move(&self) -> Color {
        self.state.turn
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.state.board.piece_at(square)
    }

    fn is_in_check(&self) -> bool {
        self.state.is_in_check()
    }

    fn is_checkmate(&self) -> bool {
        self.state.is_in_check() && !self.has_legal_move()
    }

    fn is_draw(&self) -> bool {
        self.draw_reason().is_some()
    }

    fn serialize_state(&self) -> String {
        self.state.to_fen()
    }
}

/// Index helpers for callers addressing the snapshot by row and column.
pub fn square_at(row: usize, col: usize) -> Option<Square> {
    let rank = Rank::new(7u8.checked_sub(u8::try_from(row).ok()?)?)?;
    let file = File::new(u8::try_from(col).ok()?)?;
    Some(Square::new(file, rank))
}
