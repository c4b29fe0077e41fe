//! End-of-game credit assignment.

use crate::brain::Brain;
use crate::key::PositionKey;
use crate::storage::BlobStore;
use brainchess_core::{Color, GameResult, RulesEngine};
use tracing::{error, info, warn};

/// Positions visited during one game, one per ply, oldest first.
/// Both sides' plies are recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameTrace {
    keys: Vec<PositionKey>,
}

impl GameTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: PositionKey) {
        self.keys.push(key);
    }

    /// Records the engine's current position. A position whose key
    /// cannot be derived is skipped with a warning.
    pub fn record_state<E: RulesEngine + ?Sized>(&mut self, engine: &E) {
        match PositionKey::from_serialized(&engine.serialize_state()) {
            Ok(key) => self.record(key),
            Err(e) => warn!(error = %e, "position left out of game trace"),
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PositionKey> {
        self.keys.iter()
    }
}

/// Flat adjustments applied to every position of a decided game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rewards {
    /// Added when the AI side wins.
    pub win: f64,
    /// Added when the AI side loses; negative.
    pub loss: f64,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            win: 20.0,
            loss: -100.0,
        }
    }
}

/// What a call to [`CreditAssigner::learn`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LearnOutcome {
    /// Drawn game: nothing updated, nothing written.
    Skipped,
    Applied {
        reward: f64,
        positions: usize,
        persisted: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreditAssigner {
    ai_side: Color,
    rewards: Rewards,
}

impl CreditAssigner {
    pub fn new(ai_side: Color, rewards: Rewards) -> Self {
        Self { ai_side, rewards }
    }

    pub fn ai_side(&self) -> Color {
        self.ai_side
    }

    pub fn rewards(&self) -> Rewards {
        self.rewards
    }

    /// The reward a result earns, or `None` for a draw.
    pub fn reward_for(&self, result: GameResult) -> Option<f64> {
        match result.winner()? {
            winner if winner == self.ai_side => Some(self.rewards.win),
            _ => Some(self.rewards.loss),
        }
    }

    /// Applies the result's reward to every position in `trace`, repeats
    /// included, then persists the brain once.
    ///
    /// A failed persist is logged; the in-memory brain keeps the update.
    pub fn learn<S: BlobStore + ?Sized>(
        &self,
        brain: &mut Brain,
        store: &mut S,
        result: GameResult,
        trace: &GameTrace,
    ) -> LearnOutcome {
        let Some(reward) = self.reward_for(result) else {
            info!(?result, plies = trace.len(), "drawn game, brain unchanged");
            return LearnOutcome::Skipped;
        };

        for key in trace.iter() {
            brain.apply_delta(key.clone(), reward);
        }

        let persisted = match brain.persist(store) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to save brain, keeping it in memory");
                false
            }
        };

        info!(
            ?result,
            reward,
            positions = trace.len(),
            brain_size = brain.len(),
            persisted,
            "learned from game"
        );

        LearnOutcome::Applied {
            reward,
            positions: trace.len(),
            persisted,
        }
    }
}

impl Default for CreditAssigner {
    fn default() -> Self {
        Self::new(Color::Black, Rewards::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use brainchess_core::{DrawReason, Game, Move};

    /// Plays the moves and returns the trace of every position reached.
    fn trace_of(moves: &[&str]) -> GameTrace {
        let mut game = Game::new();
        let mut trace = GameTrace::new();
        for uci in moves {
            game.apply_move(Move::parse(uci).unwrap()).unwrap();
            trace.record_state(&game);
        }
        trace
    }

    const FOOLS_MATE: [&str; 4] = ["f2f3", "e7e5", "g2g4", "d8h4"];
    const KNIGHT_SHUFFLE: [&str; 8] = [
        "g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8",
    ];

    #[test]
    fn test_trace_records_each_ply() {
        let trace = trace_of(&FOOLS_MATE);
        assert_eq!(trace.len(), 4);
        assert!(trace.iter().all(|k| k.as_str().split(' ').count() == 4));
    }

    #[test]
    fn test_loss_penalises_every_position() {
        let trace = trace_of(&["e2e4", "e7e5"]);
        let mut brain = Brain::new();
        let seed = trace.iter().next().unwrap().clone();
        brain.apply_delta(seed.clone(), 5.0);
        let mut store = MemoryStore::new();

        let assigner = CreditAssigner::default();
        let outcome = assigner.learn(
            &mut brain,
            &mut store,
            GameResult::Win(Color::White),
            &trace,
        );

        assert_eq!(
            outcome,
            LearnOutcome::Applied {
                reward: -100.0,
                positions: 2,
                persisted: true
            }
        );
        assert_eq!(brain.get(&seed), -95.0);
        for key in trace.iter().skip(1) {
            assert_eq!(brain.get(key), -100.0);
        }
    }

    #[test]
    fn test_win_rewards_and_persists_once() {
        let trace = trace_of(&FOOLS_MATE);
        let mut brain = Brain::new();
        let mut store = MemoryStore::new();

        CreditAssigner::default().learn(
            &mut brain,
            &mut store,
            GameResult::Win(Color::Black),
            &trace,
        );

        assert_eq!(store.writes(), 1);
        for key in trace.iter() {
            assert_eq!(brain.get(key), 20.0);
        }
        assert_eq!(Brain::load(&store), brain);
    }

    #[test]
    fn test_repeated_positions_count_per_occurrence() {
        let trace = trace_of(&KNIGHT_SHUFFLE);
        let mut brain = Brain::new();
        let mut store = MemoryStore::new();

        CreditAssigner::default().learn(
            &mut brain,
            &mut store,
            GameResult::Win(Color::White),
            &trace,
        );

        // Four distinct positions, each reached twice.
        assert_eq!(brain.len(), 4);
        assert!(brain.iter().all(|(_, score)| score == -200.0));
    }

    #[test]
    fn test_draw_leaves_brain_untouched() {
        let trace = trace_of(&KNIGHT_SHUFFLE);
        let mut brain = Brain::new();
        let mut store = MemoryStore::new();

        let outcome = CreditAssigner::default().learn(
            &mut brain,
            &mut store,
            GameResult::Draw(DrawReason::ThreefoldRepetition),
            &trace,
        );

        assert_eq!(outcome, LearnOutcome::Skipped);
        assert!(brain.is_empty());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_failed_persist_keeps_update() {
        let trace = trace_of(&FOOLS_MATE);
        let mut brain = Brain::new();
        let mut store = MemoryStore::read_only();

        let outcome = CreditAssigner::default().learn(
            &mut brain,
            &mut store,
            GameResult::Win(Color::White),
            &trace,
        );

        assert!(matches!(
            outcome,
            LearnOutcome::Applied {
                persisted: false,
                ..
            }
        ));
        assert_eq!(brain.len(), 4);
        assert!(brain.is_dirty());
    }

    #[test]
    fn test_reward_depends_on_ai_side() {
        let white_ai = CreditAssigner::new(Color::White, Rewards { win: 1.0, loss: -3.0 });
        assert_eq!(white_ai.reward_for(GameResult::Win(Color::White)), Some(1.0));
        assert_eq!(white_ai.reward_for(GameResult::Win(Color::Black)), Some(-3.0));
        assert_eq!(
            white_ai.reward_for(GameResult::Draw(DrawReason::Stalemate)),
            None
        );
    }
}
