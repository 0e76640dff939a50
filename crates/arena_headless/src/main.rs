//! Headless arena runner.
//!
//! Runs arena scenarios without a renderer, streaming JSON lines on
//! stdout and logs on stderr.
//!
//! ```bash
//! # Real-time run with frame output
//! cargo run -p arena_headless -- run --scenario skirmish --ticks 200 --frames
//!
//! # Fast-forward with a parallel determinism sweep
//! cargo run -p arena_headless -- simulate --scenario duel --ticks 2000 --repeat 8
//!
//! # Capture and verified replay
//! cargo run -p arena_headless -- record --scenario duel --ticks 500 --output run.bin
//! cargo run -p arena_headless -- replay --scenario duel --file run.bin
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_core::recording::Recording;
use arena_core::world::{World, TICKS_PER_SECOND};
use arena_headless::protocol::{format_hash, write_line, Report};
use arena_headless::runner;
use arena_headless::scenario::{self, PRESET_NAMES};

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless arena simulation runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario at the real-time tick rate
    Run {
        /// Preset name or scenario file path
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Stop after this many ticks (0 = run forever)
        #[arg(short, long, default_value = "0")]
        ticks: u64,

        /// Stream frame lines to stdout while running
        #[arg(long)]
        frames: bool,
    },

    /// Step a scenario as fast as possible
    Simulate {
        /// Preset name or scenario file path
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Number of ticks to step
        #[arg(short, long, default_value = "2000")]
        ticks: u64,

        /// Also record the run and verify this many parallel replays
        #[arg(short, long, default_value = "0")]
        repeat: usize,
    },

    /// Run a scenario live and save the capture
    Record {
        /// Preset name or scenario file path
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Number of ticks to capture
        #[arg(short, long, default_value = "500")]
        ticks: u64,

        /// Recording output path
        #[arg(short, long, default_value = "recording.bin")]
        output: PathBuf,
    },

    /// Replay a recording and verify it reproduces the capture
    Replay {
        /// Preset name or scenario file the recording was captured on
        #[arg(short, long)]
        scenario: String,

        /// Recording file path
        #[arg(short, long)]
        file: PathBuf,

        /// Number of parallel verification replays
        #[arg(short, long, default_value = "1")]
        runs: usize,
    },

    /// List the built-in scenario presets
    Scenarios,
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON line protocol.
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            ticks,
            frames,
        } => cmd_run(&scenario, ticks, frames),
        Commands::Simulate {
            scenario,
            ticks,
            repeat,
        } => cmd_simulate(&scenario, ticks, repeat),
        Commands::Record {
            scenario,
            ticks,
            output,
        } => cmd_record(&scenario, ticks, &output),
        Commands::Replay {
            scenario,
            file,
            runs,
        } => cmd_replay(&scenario, &file, runs),
        Commands::Scenarios => cmd_scenarios(),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}

fn emit(report: &Report) -> Result<(), String> {
    write_line(&mut std::io::stdout().lock(), report).map_err(|e| e.to_string())
}

fn cmd_run(source: &str, ticks: u64, frames: bool) -> Result<(), String> {
    let scenario = scenario::build(source).map_err(|e| e.to_string())?;
    emit(&Report::Ready {
        scenario: scenario.name.clone(),
        agents: scenario.agents.len(),
        tick_rate: TICKS_PER_SECOND,
    })?;

    let outcome = runner::run_paced(scenario, ticks, frames).map_err(|e| e.to_string())?;
    emit(&Report::Finished {
        scenario: source.to_string(),
        ticks: outcome.ticks,
        hash: format_hash(outcome.hash),
        survivors: outcome.survivors,
    })
}

fn cmd_simulate(source: &str, ticks: u64, repeat: usize) -> Result<(), String> {
    if repeat > 1 {
        let scenario = scenario::build(source).map_err(|e| e.to_string())?;
        let (recording, outcome) = runner::record(scenario, ticks).map_err(|e| e.to_string())?;

        let build =
            || scenario::build(source).map_err(|e| arena_core::error::ArenaError::InvalidScenario(e.to_string()))
                .and_then(World::new);
        let verified = runner::verify_recording(build, &recording, repeat);
        let deterministic = verified.is_ok();
        if let Err(e) = verified {
            tracing::error!(error = %e, "determinism sweep failed");
        }

        emit(&Report::Determinism {
            runs: repeat,
            deterministic,
            hash: format_hash(outcome.hash),
        })?;
        if deterministic {
            Ok(())
        } else {
            Err("determinism sweep detected divergence".to_string())
        }
    } else {
        let scenario = scenario::build(source).map_err(|e| e.to_string())?;
        let outcome = runner::simulate(scenario, ticks).map_err(|e| e.to_string())?;
        emit(&Report::Finished {
            scenario: source.to_string(),
            ticks: outcome.ticks,
            hash: format_hash(outcome.hash),
            survivors: outcome.survivors,
        })
    }
}

fn cmd_record(source: &str, ticks: u64, output: &PathBuf) -> Result<(), String> {
    let scenario = scenario::build(source).map_err(|e| e.to_string())?;
    let (recording, outcome) = runner::record(scenario, ticks).map_err(|e| e.to_string())?;
    recording.save(output).map_err(|e| e.to_string())?;

    emit(&Report::Recorded {
        path: output.display().to_string(),
        ticks: recording.len(),
        hash: format_hash(outcome.hash),
    })
}

fn cmd_replay(source: &str, file: &PathBuf, runs: usize) -> Result<(), String> {
    let recording = Recording::load(file).map_err(|e| e.to_string())?;
    tracing::info!(
        scenario = %recording.scenario,
        ticks = recording.len(),
        "recording loaded"
    );

    let build = || {
        scenario::build(source)
            .map_err(|e| arena_core::error::ArenaError::InvalidScenario(e.to_string()))
            .and_then(World::new)
    };
    runner::verify_recording(build, &recording, runs).map_err(|e| e.to_string())?;

    emit(&Report::Replayed {
        path: file.display().to_string(),
        ticks: recording.len(),
        hash: format_hash(recording.final_hash),
    })
}

fn cmd_scenarios() -> Result<(), String> {
    emit(&Report::Scenarios {
        names: PRESET_NAMES.iter().map(ToString::to_string).collect(),
    })
}
