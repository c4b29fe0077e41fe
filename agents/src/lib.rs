//! The learning move-selection engine: material evaluation, the persistent
//! experience store, one-ply move selection and end-of-game credit assignment.

pub mod brain;
pub mod evaluation;
pub mod key;
pub mod learning;
pub mod random;
pub mod selector;
pub mod selfplay;
pub mod storage;

use brainchess_core::{CandidateMove, RulesEngine};

/// Something that can pick a move for the side to move.
pub trait Agent {
    /// Returns a legal move, or `None` if there is none. The engine must be
    /// left in the position it was handed in.
    fn best_move(&mut self, engine: &mut dyn RulesEngine) -> Option<CandidateMove>;

    fn name(&self) -> &str;
}

pub use brain::{Brain, STORAGE_KEY};
pub use evaluation::{evaluate, evaluate_for};
pub use key::{KeyError, PositionKey};
pub use learning::{CreditAssigner, GameTrace, LearnOutcome, Rewards};
pub use random::RandomAgent;
pub use selector::{Choice, MoveSelector, ScoredMove, Selection, NOISE_CEILING};
pub use selfplay::{play_game, PlayedGame};
pub use storage::{BlobStore, FileStore, MemoryStore, StoreError};
