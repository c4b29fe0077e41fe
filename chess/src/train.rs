//! Offline training: the learner plays unattended games and learns from
//! each one that reaches a result.

use brainchess_agents::{
    play_game, Agent, BlobStore, Brain, CreditAssigner, MoveSelector, PlayedGame, RandomAgent,
};
use brainchess_core::{Color, GameResult};
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Opponent {
    /// Uniformly random legal moves
    #[default]
    Random,
    /// The learner itself, using the same brain
    #[value(name = "self")]
    SelfPlay,
}

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub games: usize,
    pub max_plies: usize,
    pub opponent: Opponent,
    pub seed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingSummary {
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    /// Games cut off by the ply limit; nothing is learned from them.
    pub unfinished: usize,
}

impl TrainingSummary {
    fn record(&mut self, result: Option<GameResult>, ai_side: Color) {
        self.games += 1;
        match result.map(GameResult::winner) {
            None => self.unfinished += 1,
            Some(None) => self.draws += 1,
            Some(Some(winner)) if winner == ai_side => self.wins += 1,
            Some(Some(_)) => self.losses += 1,
        }
    }
}

pub fn train<S: BlobStore + ?Sized>(
    brain: &mut Brain,
    store: &mut S,
    assigner: &CreditAssigner,
    config: &TrainingConfig,
) -> TrainingSummary {
    let ai_side = assigner.ai_side();
    let mut summary = TrainingSummary::default();

    for index in 0..config.games {
        let game_seed = config.seed.wrapping_add(index as u64);
        let played = play_one(brain, ai_side, config, game_seed);
        debug!(
            game = index + 1,
            plies = played.plies,
            result = ?played.result,
            "training game finished"
        );

        summary.record(played.result, ai_side);
        if let Some(result) = played.result {
            assigner.learn(brain, store, result, &played.trace);
        }
    }

    info!(
        games = summary.games,
        wins = summary.wins,
        losses = summary.losses,
        draws = summary.draws,
        unfinished = summary.unfinished,
        brain_size = brain.len(),
        "training complete"
    );
    summary
}

fn play_one(brain: &Brain, ai_side: Color, config: &TrainingConfig, seed: u64) -> PlayedGame {
    let mut learner = MoveSelector::new(brain, ai_side, StdRng::seed_from_u64(seed));
    let mut opponent: Box<dyn Agent + '_> = match config.opponent {
        Opponent::Random => Box::new(RandomAgent::seeded(!seed)),
        Opponent::SelfPlay => Box::new(MoveSelector::new(
            brain,
            ai_side,
            StdRng::seed_from_u64(!seed),
        )),
    };

    match ai_side {
        Color::White => play_game(&mut learner, opponent.as_mut(), config.max_plies),
        Color::Black => play_game(opponent.as_mut(), &mut learner, config.max_plies),
    }
}
