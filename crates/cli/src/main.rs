use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

use playback::EngineConfig;
use timeline::{format_time, parse_time_input};

mod live;
mod replay;
mod script;

use script::Script;

#[derive(Parser)]
#[command(name = "timeline-engine")]
#[command(about = "Timeline clock and media sync engine - headless session driver")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script step by step and print the requested snapshots
    Replay {
        /// Script file path
        script: PathBuf,
    },

    /// Feed a script to the live runtime and let the clock run
    Live {
        /// Script file path
        script: PathBuf,

        /// Wall-clock seconds to keep running after the script
        #[arg(long, default_value = "5")]
        seconds: f64,
    },

    /// Format seconds as MM:SS.D
    Format {
        seconds: f64,
    },

    /// Parse MM:SS.D into seconds
    Parse {
        text: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay { script } => replay_command(load_config(cli.config)?, script),
        Commands::Live { script, seconds } => {
            live_command(load_config(cli.config)?, script, seconds)
        }
        Commands::Format { seconds } => {
            println!("{}", format_time(seconds));
            Ok(())
        }
        Commands::Parse { text } => {
            let seconds = parse_time_input(&text)?;
            println!("{seconds:.1}");
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config = EngineConfig::from_json(&text)
        .with_context(|| format!("load config {}", path.display()))?;
    info!("Loaded config from {:?}", path);
    Ok(config)
}

fn replay_command(config: EngineConfig, script_path: PathBuf) -> Result<()> {
    let script = Script::load(&script_path)?;
    info!(
        "Replaying {} steps over {} media from {:?}",
        script.steps.len(),
        script.media.len(),
        script_path
    );
    for snapshot in replay::replay(config, &script)? {
        live::print_snapshot(&snapshot)?;
    }
    Ok(())
}

fn live_command(config: EngineConfig, script_path: PathBuf, seconds: f64) -> Result<()> {
    let script = Script::load(&script_path)?;
    let run_for = Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("invalid duration {seconds}"))?;
    let last = live::live(config, &script, run_for)?;
    live::print_snapshot(&last)
}
