//! Round replay tool - runs a recorded round through a session and prints the screen state.
//!
//! Usage:
//!   cargo run --bin round-replay -- --round round.json --placements placements.json --now 46000
//!   cargo run --bin round-replay -- --round round.json --updates updates.json --every 5000

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use roundtable_client::{Config, SessionState, Update};
use roundtable_types::{PlacementRecord, RoundRecord, WalletSnapshot};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a round through a betting session")]
struct Args {
    /// Round record as served by the backend (JSON).
    #[arg(short, long)]
    round: PathBuf,

    /// The user's placements for the round (JSON array).
    #[arg(short, long)]
    placements: Option<PathBuf>,

    /// Wallet snapshot (JSON).
    #[arg(long)]
    wallet: Option<PathBuf>,

    /// Timed updates to apply after the round (JSON array of `{at_ms, update}`).
    #[arg(long)]
    updates: Option<PathBuf>,

    /// Session configuration (YAML). Defaults to the round's game with built-in rules.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Evaluation time in epoch ms. Defaults to now.
    #[arg(long)]
    now: Option<u64>,

    /// Print one view per step from round start to round end (or the last update)
    /// instead of a single view.
    #[arg(long)]
    every: Option<u64>,

    /// Dismiss the result dialog as soon as it opens.
    #[arg(long, default_value_t = false)]
    dismiss: bool,
}

#[derive(Debug, Deserialize)]
struct TimedUpdate {
    at_ms: u64,
    update: Update,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Apply every timed update due at or before `now`.
fn drain_due(state: &mut SessionState, pending: &mut Vec<TimedUpdate>, now: u64) {
    while pending.first().is_some_and(|next| next.at_ms <= now) {
        let next = pending.remove(0);
        if let Err(err) = state.apply(next.update, next.at_ms) {
            warn!(at_ms = next.at_ms, error = %err, "update not applied");
        }
    }
}

/// Evaluation times from `start` every `step` ms, always ending exactly at `last`.
fn replay_times(start: u64, last: u64, step: u64) -> Vec<u64> {
    let mut times = Vec::new();
    let mut now = start;
    while now < last {
        times.push(now);
        now = now.saturating_add(step);
    }
    times.push(last.max(start));
    times
}

fn main() -> Result<()> {
    let args = Args::parse();

    let round: RoundRecord = read_json(&args.round)?;
    let config = match &args.config {
        Some(path) => Config::load(path).context("Failed to load config")?,
        None => Config::new(round.game_type),
    };
    let config = config.validate().context("Invalid config")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_ascii_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut state = SessionState::from_config(&config);
    state
        .apply(Update::Round(round.clone()), round.start_time)
        .context("Round rejected by session")?;
    if let Some(path) = &args.placements {
        let records: Vec<PlacementRecord> = read_json(path)?;
        info!(count = records.len(), "loaded placements");
        state.apply(
            Update::Placements {
                round_id: round.id,
                records,
            },
            round.start_time,
        )?;
    }
    if let Some(path) = &args.wallet {
        let wallet: WalletSnapshot = read_json(path)?;
        state.apply(Update::Wallet(wallet), round.start_time)?;
    }
    let mut pending: Vec<TimedUpdate> = match &args.updates {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    pending.sort_by_key(|timed| timed.at_ms);

    // Late settlements arrive after round end; keep stepping until the last update.
    let last = pending
        .last()
        .map_or(round.end_time, |timed| timed.at_ms.max(round.end_time));
    let times: Vec<u64> = match args.every {
        Some(0) => anyhow::bail!("--every must be > 0"),
        Some(step) => replay_times(round.start_time, last, step),
        None => vec![args.now.unwrap_or_else(now_ms)],
    };

    for now in times {
        drain_due(&mut state, &mut pending, now);
        let view = state.tick(now);
        if args.every.is_some() {
            println!("{}", serde_json::to_string(&view)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        if args.dismiss && state.gate().showing().is_some() {
            state.apply(Update::Dismiss, now)?;
        }
    }

    Ok(())
}
