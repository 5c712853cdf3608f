use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use quads_core::{AppInfo, pack};
use quads_sim::config::{GameConfig, ResolvedOutputs};
use quads_sim::logging::init_logging;
use quads_sim::runner::GameRunner;
use quads_sim::store::{FileStore, MemoryStore, OutputStore};

/// Concurrent four-of-a-kind card game simulator.
#[derive(Debug, Parser)]
#[command(
    name = "quads",
    author,
    version,
    about = "Four-of-a-kind ring game with one thread per player"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play one game and write the player and deck output files.
    Play(PlayArgs),
    /// Write a shuffled, winnable pack file.
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
struct PlayArgs {
    /// Path to a YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of players (overrides the config).
    #[arg(short = 'n', long, value_name = "N", allow_negative_numbers = true)]
    players: Option<i64>,

    /// Pack file with 8n card values, one per line (overrides the config).
    #[arg(short, long, value_name = "FILE")]
    pack: Option<PathBuf>,

    /// Directory for the output files.
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Also write a JSON summary of the game.
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Halt the game once any player has taken this many turns.
    #[arg(long, value_name = "TURNS")]
    max_turns: Option<u64>,

    /// Pause after an empty draw, in milliseconds.
    #[arg(long, value_name = "MS")]
    backoff_ms: Option<u64>,

    /// Keep output in memory and only print the summary.
    #[arg(long)]
    dry_run: bool,

    /// Exit after validating the configuration and pack (no game is played).
    #[arg(long)]
    validate_only: bool,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Number of players the pack is for.
    #[arg(short = 'n', long, value_name = "N", allow_negative_numbers = true)]
    players: i64,

    /// Shuffle seed.
    #[arg(long, value_name = "SEED", default_value_t = 0)]
    seed: u64,

    /// Where to write the pack.
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Play(args) => play(args),
        Command::Generate(args) => generate(args),
    }
}

fn play(args: PlayArgs) -> anyhow::Result<()> {
    let mut config = match (&args.config, args.players, &args.pack) {
        (Some(path), _, _) => GameConfig::from_path(path)?,
        (None, Some(players), Some(pack_path)) => {
            GameConfig::new(pack::validate_player_count(players)?, pack_path.clone())
        }
        (None, _, _) => bail!("either --config or both --players and --pack are required"),
    };

    if let Some(players) = args.players {
        config.players = pack::validate_player_count(players)?;
    }
    if let Some(pack_path) = args.pack {
        config.pack = pack_path;
    }
    if let Some(dir) = args.output_dir {
        config.outputs.dir = dir.display().to_string();
    }
    if let Some(summary) = args.summary.as_ref() {
        config.outputs.summary_json = Some(summary.display().to_string());
    }
    if let Some(max_turns) = args.max_turns {
        config.agent.max_turns = Some(max_turns);
    }
    if let Some(backoff_ms) = args.backoff_ms {
        config.agent.backoff_ms = backoff_ms;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let logging_guard = init_logging(&config.logging, &outputs)?;
    info!(
        app = AppInfo::name(),
        codename = AppInfo::codename(),
        version = AppInfo::version(),
        players = config.players,
        pack = %config.pack.display(),
        telemetry = ?logging_guard.telemetry_path,
        "starting game"
    );

    // Validation never writes, so it gets the in-memory store too.
    let store: Box<dyn OutputStore> = if args.dry_run || args.validate_only {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::new(&outputs.dir).with_context(|| {
            format!("creating output directory at {}", outputs.dir.display())
        })?)
    };
    let runner = GameRunner::from_config(&config, store)
        .with_context(|| format!("loading pack {}", config.pack.display()))?;

    println!(
        "Loaded {} player{} from {}",
        runner.players(),
        if runner.players() == 1 { "" } else { "s" },
        config.pack.display()
    );

    if args.validate_only {
        println!("Validation-only mode: game skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    match summary.winner() {
        Some(winner) if summary.immediate => {
            println!("Player {winner} was dealt a winning hand");
        }
        Some(winner) => println!(
            "Player {winner} wins after {} turns",
            summary.total_turns()
        ),
        None => println!(
            "Game halted without a winner after {} turns",
            summary.total_turns()
        ),
    }
    if summary.log_failures > 0 {
        println!("WARN: {} output lines failed to write", summary.log_failures);
    }
    if !args.dry_run {
        println!("Output files: {}", outputs.dir.display());
    }
    if let Some(path) = outputs.summary_json.as_ref() {
        summary.write_json(path)?;
        println!("Summary: {}", path.display());
    }

    Ok(())
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let players = pack::validate_player_count(args.players)?;
    let values = pack::generate(players, args.seed);
    pack::write(&args.output, &values)
        .with_context(|| format!("writing pack to {}", args.output.display()))?;
    println!(
        "Wrote {} cards for {players} player{} to {}",
        values.len(),
        if players == 1 { "" } else { "s" },
        args.output.display()
    );
    Ok(())
}
