//! One-ply move selection combining material, learned memory and a
//! small random tie-breaker.

use crate::brain::Brain;
use crate::evaluation::evaluate_for;
use crate::key::PositionKey;
use crate::Agent;
use brainchess_core::{CandidateMove, Color, RulesEngine};
use rand::Rng;
use tracing::{debug, warn};

/// Exclusive upper bound of the tie-breaking noise. Smaller than any
/// material difference (the cheapest piece is worth 10).
pub const NOISE_CEILING: f64 = 0.1;

/// How the selected move was arrived at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Choice {
    /// Only one legal move; nothing was scored.
    Forced,
    /// Highest-scoring candidate.
    Scored(f64),
    /// No candidate could be scored; the first legal move was taken.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub candidate: CandidateMove,
    pub choice: Choice,
}

/// A candidate with its score breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMove {
    pub candidate: CandidateMove,
    pub material: i32,
    pub memory: f64,
    pub noise: f64,
}

impl ScoredMove {
    pub fn total(&self) -> f64 {
        f64::from(self.material) + self.memory + self.noise
    }
}

/// Chooses moves for either side using a borrowed [`Brain`].
///
/// Brain scores are from `ai_side`'s point of view; when asked to move for
/// the other side the memory term is negated.
pub struct MoveSelector<'a, R> {
    brain: &'a Brain,
    ai_side: Color,
    rng: R,
}

impl<'a, R: Rng> MoveSelector<'a, R> {
    pub fn new(brain: &'a Brain, ai_side: Color, rng: R) -> Self {
        Self {
            brain,
            ai_side,
            rng,
        }
    }

    pub fn ai_side(&self) -> Color {
        self.ai_side
    }

    /// Picks a move for the side to move. The engine is back in its
    /// original position when this returns; the caller plays the move.
    pub fn select_move<E: RulesEngine + ?Sized>(&mut self, engine: &mut E) -> Option<Selection> {
        let candidates = engine.legal_moves();
        if candidates.len() <= 1 {
            return candidates.into_iter().next().map(|candidate| Selection {
                candidate,
                choice: Choice::Forced,
            });
        }

        let mut best: Option<(usize, f64)> = None;
        let mut best_score = f64::NEG_INFINITY;
        for (idx, candidate) in candidates.iter().enumerate() {
            let score = self
                .score(engine, candidate)
                .map_or(f64::NEG_INFINITY, |s| s.total());
            if score > best_score {
                best_score = score;
                best = Some((idx, score));
            }
        }

        let (idx, choice) = match best {
            Some((idx, score)) => (idx, Choice::Scored(score)),
            None => {
                warn!(
                    candidates = candidates.len(),
                    "no candidate move could be scored, playing the first legal move"
                );
                (0, Choice::Fallback)
            }
        };

        let candidate = candidates.into_iter().nth(idx)?;
        debug!(mv = %candidate, ?choice, "selected move");
        Some(Selection { candidate, choice })
    }

    /// Scores every legal move, in generation order.
    pub fn rank<E: RulesEngine + ?Sized>(&mut self, engine: &mut E) -> Vec<ScoredMove> {
        engine
            .legal_moves()
            .iter()
            .filter_map(|candidate| self.score(engine, candidate))
            .collect()
    }

    /// Tries `candidate`, scores the resulting position and takes it back.
    /// `None` when the move or the resulting position cannot be scored.
    fn score<E: RulesEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        candidate: &CandidateMove,
    ) -> Option<ScoredMove> {
        let mover = engine.side_to_move();
        if engine.apply_move(candidate.mv).is_none() {
            warn!(mv = %candidate, "engine refused a move it listed as legal");
            return None;
        }
        let board = engine.board_snapshot();
        let key = PositionKey::from_serialized(&engine.serialize_state());
        engine.undo_last_move();

        let key = match key {
            Ok(key) => key,
            Err(e) => {
                warn!(mv = %candidate, error = %e, "cannot derive position key");
                return None;
            }
        };

        let memory = self.brain.get(&key);
        Some(ScoredMove {
            candidate: candidate.clone(),
            material: evaluate_for(&board, mover),
            memory: if mover == self.ai_side { memory } else { -memory },
            noise: self.rng.gen_range(0.0..NOISE_CEILING),
        })
    }
}

impl<R: Rng> Agent for MoveSelector<'_, R> {
    fn best_move(&mut self, engine: &mut dyn RulesEngine) -> Option<CandidateMove> {
        self.select_move(engine).map(|selection| selection.candidate)
    }

    fn name(&self) -> &str {
        "Learner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainchess_core::{BoardSnapshot, Game, Move, Piece, Square};
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    /// Two legal moves for Black, Kb8 and Kb7, with equal material.
    const TWO_KING_MOVES: &str = "k7/8/8/8/3B4/8/8/7K b - - 0 1";

    fn key_after(game: &mut Game, uci: &str) -> PositionKey {
        game.apply_move(Move::parse(uci).unwrap()).unwrap();
        let key = PositionKey::from_serialized(&game.serialize_state()).unwrap();
        game.undo_last_move();
        key
    }

    /// Wraps a game and garbles the serialized state after selected moves.
    struct GarbledKeys {
        game: Game,
        garble: Vec<Move>,
    }

    impl RulesEngine for GarbledKeys {
        fn legal_moves(&self) -> Vec<CandidateMove> {
            self.game.legal_moves()
        }
        fn apply_move(&mut self, mv: Move) -> Option<CandidateMove> {
            self.game.apply_move(mv)
        }
        fn undo_last_move(&mut self) -> Option<Move> {
            self.game.undo_last_move()
        }
        fn board_snapshot(&self) -> BoardSnapshot {
            self.game.board_snapshot()
        }
        fn side_to_move(&self) -> Color {
            self.game.side_to_move()
        }
        fn piece_at(&self, square: Square) -> Option<Piece> {
            self.game.piece_at(square)
        }
        fn is_in_check(&self) -> bool {
            self.game.is_in_check()
        }
        fn is_checkmate(&self) -> bool {
            self.game.is_checkmate()
        }
        fn is_draw(&self) -> bool {
            self.game.is_draw()
        }
        fn serialize_state(&self) -> String {
            match self.game.moves().last() {
                Some(mv) if self.garble.contains(&mv) => "garbled".to_string(),
                _ => self.game.serialize_state(),
            }
        }
    }

    #[test]
    fn test_single_legal_move_skips_scoring() {
        let brain = Brain::new();
        let mut game = Game::from_fen("k7/8/8/8/8/8/8/1R5K b - - 0 1").unwrap();
        let mut selector = MoveSelector::new(&brain, Color::Black, StepRng::new(5, 1));

        let selection = selector.select_move(&mut game).unwrap();
        assert_eq!(selection.candidate.mv, Move::parse("a8a7").unwrap());
        assert_eq!(selection.choice, Choice::Forced);
        // The noise source was never consulted.
        assert_eq!(selector.rng.next_u64(), 5);
    }

    #[test]
    fn test_no_legal_moves() {
        let brain = Brain::new();
        let mut game = Game::from_fen("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut selector = MoveSelector::new(&brain, Color::Black, StdRng::seed_from_u64(1));
        assert!(selector.select_move(&mut game).is_none());
    }

    #[test]
    fn test_memory_decides_when_material_is_equal() {
        let mut game = Game::from_fen(TWO_KING_MOVES).unwrap();
        assert_eq!(game.legal_moves().len(), 2);

        for preferred in ["a8b8", "a8b7"] {
            let mut brain = Brain::new();
            brain.apply_delta(key_after(&mut game, preferred), 100.0);

            for seed in 0..50 {
                let mut selector =
                    MoveSelector::new(&brain, Color::Black, StdRng::seed_from_u64(seed));
                let selection = selector.select_move(&mut game).unwrap();
                assert_eq!(selection.candidate.mv, Move::parse(preferred).unwrap());
            }
        }
    }

    #[test]
    fn test_memory_is_negated_for_the_other_side() {
        // Mirror image of TWO_KING_MOVES with White to move: Kb1 or Kb2.
        let mut game = Game::from_fen("7k/8/8/3b4/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(game.legal_moves().len(), 2);

        let mut brain = Brain::new();
        brain.apply_delta(key_after(&mut game, "a1b2"), 100.0);

        let mut selector = MoveSelector::new(&brain, Color::Black, StdRng::seed_from_u64(3));
        let selection = selector.select_move(&mut game).unwrap();
        assert_eq!(selection.candidate.mv, Move::parse("a1b1").unwrap());
    }

    #[test]
    fn test_material_gain_is_preferred() {
        let brain = Brain::new();
        let mut game = Game::from_fen("7k/8/8/8/8/8/r6R/7K b - - 0 1").unwrap();
        let mut selector = MoveSelector::new(&brain, Color::Black, StdRng::seed_from_u64(7));

        let selection = selector.select_move(&mut game).unwrap();
        assert_eq!(selection.candidate.mv, Move::parse("a2h2").unwrap());
        assert_eq!(selection.candidate.san, "Rxh2+");
    }

    #[test]
    fn test_exact_ties_keep_first_candidate() {
        let brain = Brain::new();
        let mut game = Game::from_fen("k7/p7/8/8/8/8/8/7K b - - 0 1").unwrap();
        let first = game.legal_moves()[0].clone();

        // A constant RNG draws identical noise for every candidate.
        let mut selector = MoveSelector::new(&brain, Color::Black, StepRng::new(0, 0));
        let selection = selector.select_move(&mut game).unwrap();
        assert_eq!(selection.candidate, first);
    }

    #[test]
    fn test_engine_position_is_restored() {
        let mut brain = Brain::new();
        let mut game = Game::new();
        game.apply_move(Move::parse("e2e4").unwrap()).unwrap();
        brain.apply_delta(key_after(&mut game, "e7e5"), -30.0);

        let before = game.serialize_state();
        let plies = game.ply_count();
        let mut selector = MoveSelector::new(&brain, Color::Black, StdRng::seed_from_u64(11));
        let selection = selector.select_move(&mut game).unwrap();

        assert_eq!(game.serialize_state(), before);
        assert_eq!(game.ply_count(), plies);
        assert_ne!(selection.candidate.mv, Move::parse("e7e5").unwrap());
    }

    #[test]
    fn test_unscorable_candidate_is_never_chosen() {
        let mut engine = GarbledKeys {
            game: Game::from_fen(TWO_KING_MOVES).unwrap(),
            garble: vec![Move::parse("a8b8").unwrap()],
        };
        let mut brain = Brain::new();
        // Even a heavy penalty on the only scorable move cannot lose to a broken one.
        brain.apply_delta(key_after(&mut engine.game, "a8b7"), -500.0);

        let mut selector = MoveSelector::new(&brain, Color::Black, StdRng::seed_from_u64(5));
        let selection = selector.select_move(&mut engine).unwrap();
        assert_eq!(selection.candidate.mv, Move::parse("a8b7").unwrap());
        assert!(matches!(selection.choice, Choice::Scored(s) if s < -400.0));
    }

    #[test]
    fn test_all_unscorable_falls_back_to_first_move() {
        let game = Game::from_fen(TWO_KING_MOVES).unwrap();
        let first = game.legal_moves()[0].clone();
        let garble = game.legal_moves().iter().map(|c| c.mv).collect();
        let mut engine = GarbledKeys { game, garble };

        let brain = Brain::new();
        let mut selector = MoveSelector::new(&brain, Color::Black, StdRng::seed_from_u64(5));
        let selection = selector.select_move(&mut engine).unwrap();
        assert_eq!(selection.candidate, first);
        assert_eq!(selection.choice, Choice::Fallback);
        assert_eq!(engine.game.ply_count(), 0);
    }

    #[test]
    fn test_rank_breaks_down_scores() {
        let brain = Brain::new();
        let mut game = Game::from_fen("7k/8/8/8/8/8/r6R/7K b - - 0 1").unwrap();
        let mut selector = MoveSelector::new(&brain, Color::Black, StdRng::seed_from_u64(2));

        let ranked = selector.rank(&mut game);
        assert_eq!(ranked.len(), game.legal_moves().len());
        let capture = ranked.iter().find(|s| s.candidate.san == "Rxh2+").unwrap();
        assert_eq!(capture.material, 50);
        assert!(ranked
            .iter()
            .all(|s| s.noise >= 0.0 && s.noise < NOISE_CEILING && s.memory == 0.0));
    }
}
