use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::prelude::*;
use rand::rngs::SmallRng;
use sapper_core::*;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// 8x8, 8 mines
    Beginner,
    /// 16x16, 40 mines
    Intermediate,
    /// 16x30, 99 mines
    Expert,
}

impl From<Preset> for GameConfig {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Beginner => GameConfig::beginner(),
            Preset::Intermediate => GameConfig::intermediate(),
            Preset::Expert => GameConfig::expert(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Start {
    /// Mines may be anywhere, including under the first move
    Random,
    /// The first move is never a mine
    Safe,
    /// The first move always reveals a zero
    Zero,
}

impl From<Start> for StartTile {
    fn from(start: Start) -> Self {
        match start {
            Start::Random => StartTile::Random,
            Start::Safe => StartTile::SimpleSafe,
            Start::Zero => StartTile::AlwaysZero,
        }
    }
}

/// Let a knowledge-base agent play Minesweeper
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Board preset, overridden by --height, --width and --mines
    #[arg(short, long, value_enum, default_value_t = Preset::Beginner)]
    preset: Preset,

    /// Number of rows
    #[arg(long)]
    height: Option<Coord>,

    /// Number of columns
    #[arg(long)]
    width: Option<Coord>,

    /// Number of mines
    #[arg(short, long)]
    mines: Option<CellCount>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// What the first move is guaranteed to reveal
    #[arg(long, value_enum, default_value_t = Start::Random)]
    start: Start,

    /// How many games to play
    #[arg(short = 'n', long, default_value_t = 1)]
    games: u32,

    /// Print the final board of every game
    #[arg(long)]
    show: bool,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        let preset = GameConfig::from(self.preset);
        let size = (
            self.height.unwrap_or(preset.size.0),
            self.width.unwrap_or(preset.size.1),
        );
        let mines = self.mines.unwrap_or(preset.mines);
        let config = GameConfig::new(size, mines);
        if config.mines != mines {
            log::warn!("Only {} mines fit, requested {}", config.mines, mines);
        }
        config
    }
}

#[derive(Debug, Serialize)]
struct GameReport {
    seed: u64,
    start: Coord2,
    #[serde(flatten)]
    summary: GameSummary,
}

#[derive(Debug, Serialize)]
struct Report {
    seed: u64,
    config: GameConfig,
    wins: u32,
    games: Vec<GameReport>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.verbose);

    let config = args.game_config();
    let seed = args.seed.unwrap_or_else(rand::random);
    log::debug!("seed: {seed}, config: {config:?}");

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut report = Report {
        seed,
        config,
        wins: 0,
        games: Vec::new(),
    };

    for game in 1..=args.games {
        let game_seed = rng.random();
        let start = (
            rng.random_range(0..config.size.0),
            rng.random_range(0..config.size.1),
        );

        let player = play_game(config, game_seed, start, args.start.into(), &mut rng)
            .with_context(|| format!("game {game} with seed {game_seed} failed"))?;
        let summary = player.summary();

        if summary.state == SessionState::Won {
            report.wins += 1;
        }

        if !args.json {
            println!(
                "Game {game}: {:?} after {} moves ({} guesses), {}/{} mines flagged",
                summary.state,
                summary.moves,
                summary.random_moves,
                summary.mines_flagged,
                config.mines
            );
            if args.show {
                print!("{}", render_board(player.minefield(), player.knowledge(), true));
            }
        }

        report.games.push(GameReport {
            seed: game_seed,
            start,
            summary,
        });
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{json}");
    } else if args.games > 1 {
        let rate = f64::from(report.wins) * 100.0 / f64::from(args.games);
        println!("Won {}/{} games ({rate:.1}%), seed {seed}", report.wins, args.games);
    }

    Ok(())
}

fn play_game(
    config: GameConfig,
    seed: u64,
    start: Coord2,
    start_tile: StartTile,
    rng: &mut SmallRng,
) -> Result<Autoplayer> {
    let minefield = RandomMinefieldGenerator::new(seed, start, start_tile).generate(config);
    let mut player = Autoplayer::new(minefield);

    player.open(start)?;
    if !player.is_finished() {
        player.play(rng)?;
    }
    Ok(player)
}

fn init_logging(verbose: &clap_verbosity_flag::Verbosity) {
    let level = match verbose.log_level_filter() {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    };

    // records from the `log` facade are forwarded by the subscriber
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
