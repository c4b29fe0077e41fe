//! Unattended games between two agents, used to train the brain offline.

use crate::learning::GameTrace;
use crate::Agent;
use brainchess_core::{Color, Game, GameResult, RulesEngine};
use tracing::{debug, warn};

/// A finished (or abandoned) training game.
#[derive(Debug, Clone)]
pub struct PlayedGame {
    /// `None` when the ply limit was reached first.
    pub result: Option<GameResult>,
    pub trace: GameTrace,
    pub plies: usize,
}

/// Plays `white` against `black` from the starting position until the
/// game ends or `max_plies` moves have been made.
pub fn play_game(white: &mut dyn Agent, black: &mut dyn Agent, max_plies: usize) -> PlayedGame {
    let mut game = Game::new();
    let mut trace = GameTrace::new();

    while game.ply_count() < max_plies {
        if let Some(result) = game.result() {
            debug!(?result, plies = game.ply_count(), "training game over");
            return PlayedGame {
                result: Some(result),
                trace,
                plies: game.ply_count(),
            };
        }

        let agent: &mut dyn Agent = match game.side_to_move() {
            Color::White => &mut *white,
            Color::Black => &mut *black,
        };
        let Some(choice) = agent.best_move(&mut game) else {
            warn!(agent = agent.name(), "agent produced no move in a live position");
            break;
        };
        if game.apply_move(choice.mv).is_none() {
            warn!(agent = agent.name(), mv = %choice, "agent chose an illegal move");
            break;
        }
        trace.record_state(&game);
    }

    PlayedGame {
        result: game.result(),
        trace,
        plies: game.ply_count(),
    }
}
