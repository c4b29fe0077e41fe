use crate::session::{ClickOutcome, Mode, Session};
use brainchess_agents::{BlobStore, Brain, CreditAssigner, LearnOutcome};
use brainchess_core::{square_at, Color, File, PieceType, Rank, RulesEngine, Square};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent},
    style::{Color as TermColor, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
    ExecutableCommand,
};
use rand::rngs::StdRng;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

/// Cursor start: the human's king-pawn square.
fn home_cursor(ai_side: Color) -> (u8, u8) {
    (4, ai_side.opponent().pawn_rank().index())
}

pub struct InteractiveGame<'a> {
    session: Session,
    brain: &'a mut Brain,
    store: &'a mut dyn BlobStore,
    assigner: CreditAssigner,
    rng: StdRng,
    ai_delay: Duration,
    cursor_pos: (u8, u8), // (file, rank) in 0-7 range
    message: String,
}

impl<'a> InteractiveGame<'a> {
    pub fn new(
        brain: &'a mut Brain,
        store: &'a mut dyn BlobStore,
        assigner: CreditAssigner,
        rng: StdRng,
        ai_delay: Duration,
    ) -> Self {
        let ai_side = assigner.ai_side();
        Self {
            session: Session::new(Mode::VsAi, ai_side),
            brain,
            store,
            assigner,
            rng,
            ai_delay,
            cursor_pos: home_cursor(ai_side),
            message: String::from("Use hjkl to move, Enter to select/move, q to quit"),
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(Hide)?;
        stdout.execute(Clear(ClearType::All))?;

        let result = self.game_loop();

        stdout.execute(Show)?;
        terminal::disable_raw_mode()?;
        stdout.execute(Clear(ClearType::All))?;
        stdout.execute(MoveTo(0, 0))?;

        result
    }

    fn game_loop(&mut self) -> io::Result<()> {
        loop {
            self.draw_board()?;

            if self.session.is_ai_turn() {
                thread::sleep(self.ai_delay);
                self.ai_move();
                continue;
            }

            let Event::Key(KeyEvent { code, .. }) = event::read()? else {
                continue;
            };

            if self.session.pending_promotion().is_some() {
                self.handle_promotion_key(code);
                continue;
            }

            match code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('h') | KeyCode::Left => self.move_cursor(-1, 0),
                KeyCode::Char('j') | KeyCode::Down => self.move_cursor(0, -1),
                KeyCode::Char('k') | KeyCode::Up => self.move_cursor(0, 1),
                KeyCode::Char('l') | KeyCode::Right => self.move_cursor(1, 0),
                KeyCode::Enter | KeyCode::Char(' ') => self.handle_selection(),
                KeyCode::Char('n') => self.new_game(Mode::VsAi),
                KeyCode::Char('p') => self.new_game(Mode::PlayerVsPlayer),
                _ => {}
            }
        }

        Ok(())
    }

    fn move_cursor(&mut self, dx: i8, dy: i8) {
        let new_file = self.cursor_pos.0 as i8 + dx;
        let new_rank = self.cursor_pos.1 as i8 + dy;

        if (0..8).contains(&new_file) && (0..8).contains(&new_rank) {
            self.cursor_pos = (new_file as u8, new_rank as u8);
        }
    }

    fn cursor_square(&self) -> Option<Square> {
        Some(Square::new(
            File::new(self.cursor_pos.0)?,
            Rank::new(self.cursor_pos.1)?,
        ))
    }

    fn handle_selection(&mut self) {
        let Some(square) = self.cursor_square() else {
            return;
        };

        match self.session.click(square) {
            ClickOutcome::Selected(from) => {
                if let Some(piece) = self.session.game().piece_at(from) {
                    self.message = format!("Selected {} at {}", piece.piece_type.name(), from);
                }
            }
            ClickOutcome::Deselected => self.message.clear(),
            ClickOutcome::Moved(played) => {
                self.message = format!("Moved: {}", played);
                self.after_move();
            }
            ClickOutcome::PromotionPending { .. } => {
                self.message = String::from("Choose a piece, Esc to cancel");
            }
            ClickOutcome::Ignored => {}
        }
    }

    fn handle_promotion_key(&mut self, code: KeyCode) {
        let piece = match code {
            KeyCode::Char('q') => PieceType::Queen,
            KeyCode::Char('r') => PieceType::Rook,
            KeyCode::Char('b') => PieceType::Bishop,
            KeyCode::Char('n') => PieceType::Knight,
            KeyCode::Esc => {
                self.session.cancel_promotion();
                self.message = String::from("Promotion cancelled");
                return;
            }
            _ => return,
        };

        if let Some(played) = self.session.choose_promotion(piece) {
            self.message = format!("Moved: {}", played);
            self.after_move();
        }
    }

    fn ai_move(&mut self) {
        match self.session.play_ai_move(&*self.brain, &mut self.rng) {
            Some(selection) => {
                self.message = format!("AI played: {}", selection.candidate);
                self.after_move();
            }
            None => self.message = String::from("AI found no move"),
        }
    }

    /// Learns from the game once it has just ended.
    fn after_move(&mut self) {
        let outcome = self
            .session
            .finish_if_over(&mut *self.brain, &mut *self.store, &self.assigner);
        match outcome {
            Some(LearnOutcome::Applied {
                positions,
                persisted: true,
                ..
            }) => {
                self.message = format!("Game over. Learned from {} positions", positions);
            }
            Some(LearnOutcome::Applied {
                persisted: false, ..
            }) => {
                self.message = String::from("Game over. Could not save what was learned");
            }
            Some(LearnOutcome::Skipped) => self.message = String::from("Game over."),
            None => {}
        }
    }

    fn new_game(&mut self, mode: Mode) {
        self.session.new_game(mode);
        self.cursor_pos = home_cursor(self.assigner.ai_side());
        self.message = String::from("New game started!");
    }

    fn draw_board(&self) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.execute(MoveTo(0, 0))?;
        stdout.execute(Clear(ClearType::FromCursorDown))?;

        println!("Brain Chess - {} positions remembered\r", self.brain.len());
        println!("Enter=select/move, n=new vs AI, p=new vs player, q=quit\r");
        println!("\r");

        println!("  a b c d e f g h  \r");
        println!(" ┌─────────────────┐\r");

        let game = self.session.game();
        let snapshot = game.board_snapshot();
        let last = self.session.last_move();

        for (row, pieces) in snapshot.rows().iter().enumerate() {
            let rank_idx = 7 - row as u8;
            print!("{}│ ", rank_idx + 1);

            for (col, piece) in pieces.iter().enumerate() {
                let Some(square) = square_at(row, col) else {
                    continue;
                };

                let is_cursor = self.cursor_pos == (col as u8, rank_idx);
                let is_selected = self.session.selected() == Some(square);
                let is_legal_move = self.session.targets().iter().any(|m| m.to() == square);
                let is_last_move = last.is_some_and(|m| m.from() == square || m.to() == square);

                if is_cursor {
                    stdout.execute(SetBackgroundColor(TermColor::Yellow))?;
                } else if is_selected {
                    stdout.execute(SetBackgroundColor(TermColor::Green))?;
                } else if is_legal_move {
                    stdout.execute(SetBackgroundColor(TermColor::Blue))?;
                } else if is_last_move {
                    stdout.execute(SetBackgroundColor(TermColor::DarkCyan))?;
                } else if square.is_dark() {
                    stdout.execute(SetBackgroundColor(TermColor::DarkGrey))?;
                } else {
                    stdout.execute(SetBackgroundColor(TermColor::Black))?;
                }

                if let Some(piece) = piece {
                    let symbol = match (piece.piece_type, piece.color) {
                        (PieceType::King, Color::White) => '♔',
                        (PieceType::Queen, Color::White) => '♕',
                        (PieceType::Rook, Color::White) => '♖',
                        (PieceType::Bishop, Color::White) => '♗',
                        (PieceType::Knight, Color::White) => '♘',
                        (PieceType::Pawn, Color::White) => '♙',
                        (PieceType::King, Color::Black) => '♚',
                        (PieceType::Queen, Color::Black) => '♛',
                        (PieceType::Rook, Color::Black) => '♜',
                        (PieceType::Bishop, Color::Black) => '♝',
                        (PieceType::Knight, Color::Black) => '♞',
                        (PieceType::Pawn, Color::Black) => '♟',
                    };

                    if piece.color == Color::White {
                        stdout.execute(SetForegroundColor(TermColor::White))?;
                    } else {
                        stdout.execute(SetForegroundColor(TermColor::Magenta))?;
                    }

                    print!("{} ", symbol);
                } else {
                    print!("  ");
                }

                stdout.execute(ResetColor)?;
            }

            println!("│{}\r", rank_idx + 1);
        }

        println!(" └─────────────────┘\r");
        println!("  a b c d e f g h  \r");
        println!("\r");

        println!("{}\r", self.session.status());
        if let Some(mv) = last {
            println!("Last move: {}\r", mv);
        }

        println!("\r");
        println!("{}\r", self.message);

        stdout.flush()?;
        Ok(())
    }
}
