use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mineagent_core::*;
use mineagent_winxp::{DriverConfig, InteractionMode, Theme};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    fn config(self) -> GameConfig {
        match self {
            Self::Beginner => GameConfig::beginner(),
            Self::Intermediate => GameConfig::intermediate(),
            Self::Expert => GameConfig::expert(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Click the status face before playing
    #[arg(long)]
    new_round: bool,

    /// Read the screen back once per sweep pass instead of after every click
    #[arg(long)]
    batched: bool,

    /// TOML file overriding colors and pixel offsets of the window
    #[arg(long, value_name = "PATH")]
    theme: Option<PathBuf>,

    /// Where to save the suspect screen region if the window cannot be trusted
    #[arg(long, value_name = "PATH", default_value = "cap.png")]
    diagnostic: PathBuf,

    /// Apply a single deduction instead of sweeping until nothing changes
    #[arg(long)]
    step: bool,

    /// Print the final board as JSON
    #[arg(long)]
    json: bool,

    /// Play an in-memory game instead of the window on screen
    #[arg(long, value_enum, value_name = "DIFFICULTY")]
    simulate: Option<Difficulty>,

    /// Force a seed instead of random (with --simulate)
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let snapshot = match args.simulate {
        Some(difficulty) => simulate(&args, difficulty)?,
        None => live(&args)?,
    };
    print_board(&snapshot, args.json)
}

fn simulate(args: &Args, difficulty: Difficulty) -> Result<BoardSnapshot> {
    let config = difficulty.config();
    let seed = args.seed.unwrap_or_else(rand::random);
    let start = (config.size.0 / 2, config.size.1 / 2);
    log::info!("Simulating {:?} with seed {}", difficulty, seed);

    let layout = RandomLayoutGenerator::new(seed, start, StartTile::AlwaysZero).generate(config);
    let mut board = SimBoard::new(layout);
    board.reveal(start)?;
    play(&mut board, args.step)?;
    Ok(board.snapshot())
}

fn driver_setup(args: &Args) -> Result<(Theme, DriverConfig)> {
    let theme = match &args.theme {
        Some(path) => Theme::load(path)
            .with_context(|| format!("Could not load theme {}", path.display()))?,
        None => Theme::winxp(),
    };
    let config = DriverConfig {
        mode: if args.batched {
            InteractionMode::Batched
        } else {
            InteractionMode::Verified
        },
        new_round: args.new_round,
        diagnostic_path: args.diagnostic.clone(),
        ..DriverConfig::default()
    };
    Ok((theme, config))
}

#[cfg(feature = "live")]
fn live(args: &Args) -> Result<BoardSnapshot> {
    use mineagent_winxp::{EnigoPointer, LiveBoard, XcapScreen};

    let (theme, config) = driver_setup(args)?;
    let pointer = EnigoPointer::new()?;
    let mut board = LiveBoard::attach(XcapScreen::new(), pointer, theme, config)
        .context("Could not attach to the minesweeper window")?;
    play(&mut board, args.step)?;
    Ok(board.snapshot().clone())
}

#[cfg(not(feature = "live"))]
fn live(args: &Args) -> Result<BoardSnapshot> {
    driver_setup(args)?;
    anyhow::bail!("built without the `live` feature; rebuild with it or pass --simulate")
}

fn play<B>(board: &mut B, single_step: bool) -> Result<()>
where
    B: BoardModel,
    B::Error: Send + Sync + 'static,
{
    if single_step {
        match full_board_scan(board) {
            Some(inference) => {
                log::info!("{:?} is {:?}", inference.coords, inference.deduction);
                apply_inference(board, inference)?;
                board.synchronize()?;
            }
            None => log::info!("Nothing follows from a single clue"),
        }
        return Ok(());
    }

    let report = fixpoint_sweep(board)?;
    log::info!(
        "{} passes, {} flagged, {} revealed, {:?}",
        report.passes,
        report.flagged,
        report.revealed,
        report.outcome
    );
    Ok(())
}

fn print_board(snapshot: &BoardSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    let (rows, cols) = snapshot.size();
    let mut out = String::new();
    for row in 0..rows {
        for col in 0..cols {
            out.push(cell_char(snapshot.cell_at((row, col))));
        }
        out.push('\n');
    }
    writeln!(
        out,
        "mines left: {}, steps: {}, {:?}",
        snapshot.mines_left, snapshot.step_count, snapshot.outcome
    )?;
    print!("{out}");
    Ok(())
}

fn cell_char(cell: CellState) -> char {
    match cell {
        CellState::Unchecked => '#',
        CellState::Question => '?',
        CellState::Flag => 'F',
        CellState::Revealed(0) => '.',
        CellState::Revealed(n) => char::from_digit(u32::from(n), 10).unwrap_or('?'),
        CellState::Mine => '*',
        CellState::ExplodedMine => 'X',
        CellState::MisflaggedMine => '!',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn simulated_beginner_game_finishes_or_stalls_cleanly() {
        let args = Args::parse_from(["mineagent", "--simulate", "beginner", "--seed", "7"]);

        let snapshot = simulate(&args, Difficulty::Beginner).unwrap();

        assert_ne!(snapshot.outcome, Outcome::Lost);
        assert_eq!(snapshot.size(), (9, 9));
    }

    #[test]
    fn cells_render_as_single_chars() {
        assert_eq!(cell_char(CellState::Revealed(0)), '.');
        assert_eq!(cell_char(CellState::Revealed(6)), '6');
        assert_eq!(cell_char(CellState::ExplodedMine), 'X');
    }
}
