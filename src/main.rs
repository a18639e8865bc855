use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use sparse_life::{
    patterns, BoardId, CancellationToken, Cell, CellSet, Generation, GenerationCoordinator,
    LifeConfig, MemoryStore,
};

const DEFAULT_FPS: u64 = 15;
const VIEWPORT_ROWS: i64 = 40;
const VIEWPORT_COLS: i64 = 80;

/// Sparse Game of Life: animate patterns, look up generations, find final states.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// JSON configuration file.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Animate a pattern in the terminal (Ctrl+C to quit).
    Run {
        #[arg(default_value = "gun")]
        pattern: String,
        #[arg(
            long,
            default_value_t = DEFAULT_FPS,
            value_parser = clap::value_parser!(u64).range(1..=120)
        )]
        fps: u64,
        /// Stop after this many generations.
        #[arg(long, value_name = "COUNT")]
        generations: Option<u64>,
    },
    /// Print generation NUMBER of a pattern.
    Generation {
        pattern: String,
        #[arg(allow_negative_numbers = true)]
        number: i64,
    },
    /// Report whether a pattern stabilizes, cycles or keeps evolving.
    Final {
        pattern: String,
        /// Overrides max_iterations_for_final_state from the config.
        #[arg(long, value_name = "COUNT")]
        max_iterations: Option<u64>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Pattern cells placed where they look good in the default viewport.
fn seed(name: &str) -> Result<CellSet> {
    let pattern = patterns::by_name(name).ok_or_else(|| {
        anyhow!(
            "unknown pattern: {name} (available: {})",
            patterns::NAMES.join(", ")
        )
    })?;
    let (origin_x, origin_y) = match name {
        "glider" => (VIEWPORT_COLS / 4, VIEWPORT_ROWS / 4),
        "gun" => (2, 2),
        "lwss" => (4, VIEWPORT_ROWS / 2),
        "pulsar" => (VIEWPORT_COLS / 2 - 6, VIEWPORT_ROWS / 2 - 6),
        _ => (VIEWPORT_COLS / 2, VIEWPORT_ROWS / 2),
    };
    Ok(CellSet::from_pattern(pattern, origin_x, origin_y))
}

fn render(generation: &Generation) -> String {
    let mut buf = String::with_capacity((VIEWPORT_ROWS * (VIEWPORT_COLS + 1)) as usize);

    // Move cursor home + clear screen
    buf.push_str("\x1b[H\x1b[J");
    buf.push_str(&format!(
        " Generation: {}  Population: {}\n\n",
        generation.number,
        generation.cells.population()
    ));

    for y in 0..VIEWPORT_ROWS {
        for x in 0..VIEWPORT_COLS {
            buf.push(if generation.cells.is_alive(&Cell::new(x, y)) { '█' } else { ' ' });
        }
        buf.push('\n');
    }
    buf.push_str("\n Press Ctrl+C to quit.\n");
    buf
}

async fn animate(
    coordinator: &GenerationCoordinator<MemoryStore>,
    id: BoardId,
    fps: u64,
    limit: Option<u64>,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let delay = Duration::from_millis(1000 / fps);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Hide cursor
    write!(out, "\x1b[?25l").ok();

    let mut current = coordinator.generation(id, 0, &cancel)?;
    loop {
        write!(out, "{}", render(&current)).ok();
        out.flush().ok();
        if limit.is_some_and(|limit| current.number >= limit) {
            break;
        }
        tokio::time::sleep(delay).await;
        current = coordinator.next_generation(id, &cancel)?;
    }

    write!(out, "\x1b[?25h").ok();
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<LifeConfig> {
    match path {
        Some(path) => LifeConfig::load(path).with_context(|| format!("loading {}", path.display())),
        None => LifeConfig::default()
            .with_env_overrides()
            .context("reading environment overrides"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let mut config = load_config(args.config.as_ref())?;
    if let Command::Final {
        max_iterations: Some(max),
        ..
    } = &args.command
    {
        config.max_iterations_for_final_state = *max;
        config.validate()?;
    }
    log::debug!("using {config:?}");

    let coordinator = Arc::new(GenerationCoordinator::with_config(MemoryStore::new(), config));

    match args.command {
        Command::Run {
            pattern,
            fps,
            generations,
        } => {
            let board = coordinator.create_board(Some(pattern.clone()), seed(&pattern)?)?;
            animate(&coordinator, board.id, fps, generations).await?;
        }
        Command::Generation { pattern, number } => {
            let board = coordinator.create_board(Some(pattern.clone()), seed(&pattern)?)?;
            let generation = coordinator
                .generation(board.id, number, &CancellationToken::new())
                .with_context(|| format!("computing generation {number} of {pattern}"))?;
            println!(
                "{pattern} generation {} (population {}):",
                generation.number,
                generation.cells.population()
            );
            println!("{}", generation.cells);
        }
        Command::Final { pattern, json, .. } => {
            let board = coordinator.create_board(Some(pattern.clone()), seed(&pattern)?)?;
            let state = Arc::clone(&coordinator)
                .final_state_async(board.id)
                .await
                .with_context(|| format!("searching final state of {pattern}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("{pattern}: {state}");
                println!("{}", state.cells);
            }
        }
    }
    Ok(())
}
