mod interactive;
mod session;
mod train;

use anyhow::{bail, Context, Result};
use brainchess_agents::{
    evaluate, Brain, CreditAssigner, FileStore, MoveSelector, PositionKey, Rewards, STORAGE_KEY,
};
use brainchess_core::{positions, Color, Game, RulesEngine};
use clap::{Parser, Subcommand, ValueEnum};
use interactive::InteractiveGame;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use train::{Opponent, TrainingConfig};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory the brain snapshot is kept in
    #[arg(long, global = true, default_value = ".brainchess")]
    brain_dir: PathBuf,

    /// Side the AI plays and learns for
    #[arg(long, global = true, value_enum, default_value = "black")]
    ai_side: Side,

    /// Added to every position of a game the AI wins
    #[arg(long, global = true, default_value_t = Rewards::default().win)]
    win_reward: f64,

    /// Added to every position of a game the AI loses
    #[arg(
        long,
        global = true,
        allow_negative_numbers = true,
        default_value_t = Rewards::default().loss
    )]
    loss_penalty: f64,

    /// Seed for the AI's tie-breaking noise and training opponents
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Pause before the AI replies, in milliseconds
    #[arg(long, global = true, default_value_t = 300)]
    ai_delay_ms: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Play on the terminal board (default)
    Play,
    /// Let the AI play unattended games and learn from them
    Train {
        #[arg(short, long, default_value_t = 100)]
        games: usize,
        /// Games longer than this are abandoned without learning
        #[arg(long, default_value_t = 200)]
        max_plies: usize,
        #[arg(long, value_enum, default_value = "random")]
        opponent: Opponent,
    },
    /// Summarise what the brain has learned
    Inspect {
        /// Number of best and worst positions to list
        #[arg(short = 'n', long, default_value_t = 10)]
        top: usize,
        /// Show the learned score of one position
        #[arg(long)]
        fen: Option<String>,
    },
    /// Score every legal move in a position the way the AI would
    Eval {
        /// Position to evaluate; defaults to the starting position
        fen: Option<String>,
    },
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Side {
    White,
    #[default]
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();
    let command = cli.command.take().unwrap_or(Command::Play);

    // The board owns the terminal while playing; keep the log quiet there.
    init_tracing(match command {
        Command::Play => "warn",
        _ => "info",
    });

    if !cli.win_reward.is_finite() || !cli.loss_penalty.is_finite() {
        bail!("rewards must be finite numbers");
    }
    if cli.loss_penalty > 0.0 {
        bail!("--loss-penalty must not be positive (got {})", cli.loss_penalty);
    }

    let assigner = CreditAssigner::new(
        cli.ai_side.into(),
        Rewards {
            win: cli.win_reward,
            loss: cli.loss_penalty,
        },
    );
    let mut store = FileStore::new(&cli.brain_dir);
    let mut brain = Brain::load(&store);

    match command {
        Command::Play => {
            let rng = cli
                .seed
                .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
            InteractiveGame::new(
                &mut brain,
                &mut store,
                assigner,
                rng,
                Duration::from_millis(cli.ai_delay_ms),
            )
            .run()
            .context("terminal UI failed")?;
        }
        Command::Train {
            games,
            max_plies,
            opponent,
        } => {
            let config = TrainingConfig {
                games,
                max_plies,
                opponent,
                seed: cli.seed.unwrap_or_else(rand::random),
            };
            let summary = train::train(&mut brain, &mut store, &assigner, &config);
            println!(
                "{} games: {} won, {} lost, {} drawn, {} unfinished",
                summary.games, summary.wins, summary.losses, summary.draws, summary.unfinished
            );
            println!("Brain now holds {} positions", brain.len());
        }
        Command::Inspect { top, fen } => inspect(&brain, &store, top, fen.as_deref())?,
        Command::Eval { fen } => eval(&brain, &cli, fen.as_deref())?,
    }

    if brain.is_dirty() {
        brain.persist(&mut store).with_context(|| {
            format!(
                "failed to save brain to {}",
                store.path_for(STORAGE_KEY).display()
            )
        })?;
        info!(positions = brain.len(), "saved brain on exit");
    }

    Ok(())
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn inspect(brain: &Brain, store: &FileStore, top: usize, fen: Option<&str>) -> Result<()> {
    println!("Brain file: {}", store.path_for(STORAGE_KEY).display());
    println!("Positions remembered: {}", brain.len());

    if let Some(fen) = fen {
        let key = PositionKey::from_serialized(fen).context("invalid position")?;
        println!("\n{}: {}", key, brain.get(&key));
        return Ok(());
    }

    if brain.is_empty() {
        return Ok(());
    }

    println!("\nStrongest:");
    for (key, score) in brain.strongest(top) {
        println!("{:>10.1}  {}", score, key);
    }
    println!("\nWeakest:");
    for (key, score) in brain.weakest(top) {
        println!("{:>10.1}  {}", score, key);
    }
    Ok(())
}

fn eval(brain: &Brain, cli: &Cli, fen: Option<&str>) -> Result<()> {
    let fen = fen.unwrap_or(positions::STARTING);
    let mut game = Game::from_fen(fen).with_context(|| format!("invalid FEN {fen:?}"))?;

    println!("Position: {}", game.serialize_state());
    println!(
        "Material: {} (+ = White, - = Black)",
        evaluate(&game.board_snapshot())
    );

    let rng = StdRng::seed_from_u64(cli.seed.unwrap_or(0));
    let mut selector = MoveSelector::new(brain, cli.ai_side.into(), rng);
    let mut ranked = selector.rank(&mut game);
    if ranked.is_empty() {
        println!("No legal moves");
        return Ok(());
    }
    ranked.sort_by(|a, b| b.total().total_cmp(&a.total()));

    println!("\n{:<8} {:>9} {:>9} {:>9}", "Move", "Material", "Memory", "Total");
    for scored in ranked {
        println!(
            "{:<8} {:>9} {:>9.1} {:>9.2}",
            scored.candidate.san,
            scored.material,
            scored.memory,
            scored.total()
        );
    }
    Ok(())
}
