//! Chess rules: board representation, FEN, legal move generation, SAN,
//! and the `RulesEngine` trait implemented by [`Game`].

pub mod board;
pub mod fen;
pub mod game_state;
pub mod move_gen;
pub mod notation;
pub mod rules;
pub mod types;

pub use board::*;
pub use fen::{positions, FenError};
pub use game_state::*;
pub use move_gen::*;
pub use notation::to_san;
pub use rules::*;
pub use types::*;
