//! FEN (Forsyth-Edwards Notation) parsing and serialization.

use crate::board::Board;
use crate::game_state::GameState;
use crate::types::{CastlingRights, Color, File, Piece, Rank, Square};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FenError {
    #[error("invalid FEN format: {0}")]
    InvalidFormat(String),
    #[error("invalid piece character: '{0}'")]
    InvalidPiece(char),
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("invalid castling rights: {0}")]
    InvalidCastling(String),
    #[error("invalid en passant square: {0}")]
    InvalidEnPassant(String),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

impl GameState {
    /// Parses a six-field FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        let [placement, side, castling, en_passant, halfmove, fullmove] = parts[..] else {
            return Err(FenError::InvalidFormat(format!(
                "expected 6 fields, got {}",
                parts.len()
            )));
        };

        let turn = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(FenError::InvalidColor(side.to_string())),
        };

        Ok(GameState {
            board: parse_board(placement)?,
            turn,
            castling: parse_castling(castling)?,
            en_passant: parse_en_passant(en_passant)?,
            halfmove_clock: parse_number(halfmove)?,
            fullmove_number: parse_number(fullmove)?,
        })
    }

    /// Serializes all six FEN fields.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            board_to_fen(&self.board),
            if self.turn == Color::White { "w" } else { "b" },
            castling_to_fen(self.castling),
            self.en_passant
                .map_or_else(|| "-".to_string(), |sq| sq.to_string()),
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

fn parse_number(field: &str) -> Result<u16, FenError> {
    field
        .parse()
        .map_err(|_| FenError::InvalidNumber(field.to_string()))
}

/// Parses the placement field, rank 8 first.
fn parse_board(placement: &str) -> Result<Board, FenError> {
    let mut board = Board::empty();
    let ranks: Vec<&str> = placement.split('/').collect();

    if ranks.len() != 8 {
        return Err(FenError::InvalidFormat(format!(
            "expected 8 ranks, got {}",
            ranks.len()
        )));
    }

    for (row, rank_str) in ranks.iter().enumerate() {
        let Some(rank) = Rank::new(7 - row as u8) else {
            continue;
        };
        let mut file_idx = 0u8;

        for ch in rank_str.chars() {
            if let Some(skip) = ch.to_digit(10) {
                file_idx = u8::try_from(skip)
                    .ok()
                    .filter(|&n| n > 0)
                    .and_then(|n| file_idx.checked_add(n))
                    .filter(|&n| n <= 8)
                    .ok_or_else(|| {
                        FenError::InvalidFormat(format!(
                            "bad empty-square count '{}' in rank {}",
                            ch,
                            8 - row
                        ))
                    })?;
                continue;
            }
            let file = File::new(file_idx).ok_or_else(|| {
                FenError::InvalidFormat(format!("too many squares in rank {}", 8 - row))
            })?;
            let piece = Piece::from_fen_char(ch).ok_or(FenError::InvalidPiece(ch))?;
            board.set_piece(Square::new(file, rank), Some(piece));
            file_idx += 1;
        }

        if file_idx != 8 {
            return Err(FenError::InvalidFormat(format!(
                "rank {} has {} squares, expected 8",
                8 - row,
                file_idx
            )));
        }
    }

    Ok(board)
}

fn board_to_fen(board: &Board) -> String {
    let mut fen = String::new();

    for rank_idx in (0..8u8).rev() {
        let mut empty_count = 0;

        for file_idx in 0..8u8 {
            let (Some(file), Some(rank)) = (File::new(file_idx), Rank::new(rank_idx)) else {
                continue;
            };
            match board.piece_at(Square::new(file, rank)) {
                Some(piece) => {
                    if empty_count > 0 {
                        fen.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    fen.push(piece.to_fen_char());
                }
                None => empty_count += 1,
            }
        }

        if empty_count > 0 {
            fen.push_str(&empty_count.to_string());
        }
        if rank_idx > 0 {
            fen.push('/');
        }
    }

    fen
}

fn parse_castling(castling_str: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::none();
    if castling_str == "-" {
        return Ok(rights);
    }

    for ch in castling_str.chars() {
        match ch {
            'K' => rights.white.kingside = true,
            'Q' => rights.white.queenside = true,
            'k' => rights.black.kingside = true,
            'q' => rights.black.queenside = true,
            _ => return Err(FenError::InvalidCastling(castling_str.to_string())),
        }
    }

    Ok(rights)
}

fn castling_to_fen(castling: CastlingRights) -> String {
    let s: String = [
        (castling.white.kingside, 'K'),
        (castling.white.queenside, 'Q'),
        (castling.black.kingside, 'k'),
        (castling.black.queenside, 'q'),
    ]
    .iter()
    .filter(|(set, _)| *set)
    .map(|&(_, ch)| ch)
    .collect();

    if s.is_empty() {
        "-".to_string()
    } else {
        s
    }
}

fn parse_en_passant(ep_str: &str) -> Result<Option<Square>, FenError> {
    if ep_str == "-" {
        return Ok(None);
    }
    Square::parse(ep_str)
        .map(Some)
        .ok_or_else(|| FenError::InvalidEnPassant(ep_str.to_string()))
}

/// Well-known positions.
pub mod positions {
    pub const STARTING: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Kiwipete: castling, pins, en passant and promotions in one position.
    pub const KIWIPETE: &str =
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    pub const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";

    /// White to move and mate with Qh5xf7.
    pub const SCHOLARS_MATE_THREAT: &str =
        "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
}
