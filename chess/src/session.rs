//! A single game as the player sees it: click-to-move input, the AI's
//! replies and learning once the game is decided.

use brainchess_agents::{
    BlobStore, Brain, CreditAssigner, GameTrace, LearnOutcome, MoveSelector, Selection,
};
use brainchess_core::{
    CandidateMove, Color, DrawReason, Game, GameResult, PieceType, RulesEngine, Square,
};
use rand::Rng;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    VsAi,
    PlayerVsPlayer,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::VsAi => "Player vs AI",
            Mode::PlayerVsPlayer => "Player vs Player",
        }
    }
}

/// What a click on the board did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Nothing happened: game over, AI to move, or an empty/enemy square
    /// with nothing selected.
    Ignored,
    Selected(Square),
    Deselected,
    Moved(CandidateMove),
    /// A pawn reached the last rank; waiting for [`Session::choose_promotion`].
    PromotionPending { from: Square, to: Square },
}

pub struct Session {
    game: Game,
    mode: Mode,
    ai_side: Color,
    selected: Option<Square>,
    targets: Vec<CandidateMove>,
    last_move: Option<CandidateMove>,
    pending_promotion: Option<(Square, Square)>,
    trace: GameTrace,
    learned: bool,
}

impl Session {
    pub fn new(mode: Mode, ai_side: Color) -> Self {
        Self::with_game(Game::new(), mode, ai_side)
    }

    /// Starts from an arbitrary position.
    pub fn with_game(game: Game, mode: Mode, ai_side: Color) -> Self {
        Self {
            game,
            mode,
            ai_side,
            selected: None,
            targets: Vec::new(),
            last_move: None,
            pending_promotion: None,
            trace: GameTrace::new(),
            learned: false,
        }
    }

    /// Resets the board and everything tied to the current game. The brain
    /// is not touched.
    pub fn new_game(&mut self, mode: Mode) {
        self.game.reset();
        self.mode = mode;
        self.selected = None;
        self.targets.clear();
        self.last_move = None;
        self.pending_promotion = None;
        self.trace.clear();
        self.learned = false;
        info!(mode = mode.label(), "new game");
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Legal moves of the selected piece.
    pub fn targets(&self) -> &[CandidateMove] {
        &self.targets
    }

    pub fn last_move(&self) -> Option<&CandidateMove> {
        self.last_move.as_ref()
    }

    pub fn pending_promotion(&self) -> Option<(Square, Square)> {
        self.pending_promotion
    }

    pub fn trace(&self) -> &GameTrace {
        &self.trace
    }

    pub fn is_over(&self) -> bool {
        self.game.is_game_over()
    }

    pub fn is_ai_turn(&self) -> bool {
        self.mode == Mode::VsAi && !self.is_over() && self.game.side_to_move() == self.ai_side
    }

    pub fn click(&mut self, square: Square) -> ClickOutcome {
        if self.is_over() || self.is_ai_turn() || self.pending_promotion.is_some() {
            return ClickOutcome::Ignored;
        }

        if let Some(from) = self.selected {
            let target = self.targets.iter().find(|c| c.to() == square).map(|c| c.mv);
            if let Some(mv) = target {
                if mv.promotion.is_some() {
                    self.pending_promotion = Some((from, square));
                    return ClickOutcome::PromotionPending { from, to: square };
                }
                return self.play(mv);
            }
        }

        let side = self.game.side_to_move();
        match self.game.piece_at(square) {
            Some(piece) if piece.color == side => {
                self.selected = Some(square);
                self.targets = self.game.legal_moves_from(square);
                ClickOutcome::Selected(square)
            }
            _ => {
                self.targets.clear();
                match self.selected.take() {
                    Some(_) => ClickOutcome::Deselected,
                    None => ClickOutcome::Ignored,
                }
            }
        }
    }

    /// Completes a pending promotion. Returns `None` when nothing is pending
    /// or `piece` is not a legal promotion.
    pub fn choose_promotion(&mut self, piece: PieceType) -> Option<CandidateMove> {
        let (from, to) = self.pending_promotion?;
        let mv = self
            .targets
            .iter()
            .find(|c| c.from() == from && c.to() == to && c.promotion() == Some(piece))?
            .mv;
        self.pending_promotion = None;
        match self.play(mv) {
            ClickOutcome::Moved(candidate) => Some(candidate),
            _ => None,
        }
    }

    pub fn cancel_promotion(&mut self) {
        if self.pending_promotion.take().is_some() {
            self.selected = None;
            self.targets.clear();
        }
    }

    /// Lets the selector pick and play a move for the side to move.
    pub fn play_ai_move<R: Rng>(&mut self, brain: &Brain, rng: &mut R) -> Option<Selection> {
        if self.is_over() {
            return None;
        }
        let side = self.game.side_to_move();
        let selection = MoveSelector::new(brain, self.ai_side, rng).select_move(&mut self.game)?;
        match self.play(selection.candidate.mv) {
            ClickOutcome::Moved(_) => {
                debug!(side = %side, mv = %selection.candidate, "AI moved");
                Some(selection)
            }
            _ => None,
        }
    }

    /// Runs credit assignment the first time this is called on a finished
    /// game. Later calls, and calls on a live game, do nothing.
    pub fn finish_if_over<S: BlobStore + ?Sized>(
        &mut self,
        brain: &mut Brain,
        store: &mut S,
        assigner: &CreditAssigner,
    ) -> Option<LearnOutcome> {
        if self.learned {
            return None;
        }
        let result = self.game.result()?;
        self.learned = true;
        Some(assigner.learn(brain, store, result, &self.trace))
    }

    pub fn status(&self) -> String {
        let line = match self.game.result() {
            Some(GameResult::Win(winner)) => format!("Checkmate! {winner} Wins"),
            Some(GameResult::Draw(reason)) => format!("Draw Game ({})", draw_label(reason)),
            None if self.pending_promotion.is_some() => {
                "Promote to: (q)ueen (r)ook (b)ishop k(n)ight".to_string()
            }
            None => {
                let mut line = format!("{}'s move", self.game.side_to_move());
                if self.game.is_in_check() {
                    line.push_str(" (Check!)");
                }
                line
            }
        };
        format!("{} | {}", self.mode.label(), line)
    }

    fn play(&mut self, mv: brainchess_core::Move) -> ClickOutcome {
        self.selected = None;
        self.targets.clear();
        match self.game.apply_move(mv) {
            Some(candidate) => {
                self.trace.record_state(&self.game);
                self.last_move = Some(candidate.clone());
                ClickOutcome::Moved(candidate)
            }
            None => {
                warn!(mv = %mv, "rejected illegal move");
                ClickOutcome::Ignored
            }
        }
    }
}

fn draw_label(reason: DrawReason) -> &'static str {
    match reason {
        DrawReason::Stalemate => "stalemate",
        DrawReason::FiftyMoveRule => "fifty-move rule",
        DrawReason::InsufficientMaterial => "insufficient material",
        DrawReason::ThreefoldRepetition => "threefold repetition",
    }
}
