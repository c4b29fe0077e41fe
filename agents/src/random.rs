use crate::Agent;
use brainchess_core::{CandidateMove, RulesEngine};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Plays a uniformly random legal move. Used as a sparring partner when training.
pub struct RandomAgent<R = StdRng> {
    name: String,
    rng: R,
}

impl RandomAgent<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomAgent<R> {
    pub fn with_rng(rng: R) -> Self {
        RandomAgent {
            name: "Random".to_string(),
            rng,
        }
    }
}

impl Default for RandomAgent<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Agent for RandomAgent<R> {
    fn best_move(&mut self, engine: &mut dyn RulesEngine) -> Option<CandidateMove> {
        engine.legal_moves().choose(&mut self.rng).cloned()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
