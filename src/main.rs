//! Swarm Strike headless host
//!
//! Runs one autopiloted game, routes events through the audio manager and records
//! the final score on the persisted leaderboard.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;

use swarm_strike::audio::{AudioManager, LogBackend};
use swarm_strike::persistence::JsonStore;
use swarm_strike::platform::autopilot;
use swarm_strike::platform::{DriverOptions, GameHandle, GameLoop};
use swarm_strike::sim::validate_invariants;
use swarm_strike::{Difficulty, GameState, HighScores, Settings, SimConfig, Simulation};

#[derive(Parser, Debug)]
#[command(name = "swarm-strike")]
#[command(about = "Run a headless, autopiloted game of Swarm Strike")]
struct Args {
    /// RNG seed
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Maximum number of ticks to simulate
    #[arg(short, long, default_value_t = 20_000)]
    ticks: u64,

    /// Difficulty override (EASY, NORMAL, HARD); saved to settings
    #[arg(short, long)]
    difficulty: Option<String>,

    /// Directory holding settings.json and high_scores.json
    #[arg(long, default_value = "swarm-strike-data")]
    data_dir: PathBuf,

    /// Name recorded on the leaderboard
    #[arg(short, long, default_value = "AUTOPILOT")]
    player: String,

    /// Pace ticks in wall-clock time on the driver thread
    #[arg(long)]
    realtime: bool,

    #[arg(long)]
    width: Option<f32>,

    #[arg(long)]
    height: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let store = JsonStore::new(&args.data_dir);
    let mut settings = Settings::load(&store);
    if let Some(name) = &args.difficulty {
        let difficulty = Difficulty::from_name(name)
            .with_context(|| format!("unknown difficulty {name:?}"))?;
        settings.set_difficulty(difficulty);
        settings.save(&store).context("saving settings")?;
    }
    let mut scores = HighScores::load(&store);

    let defaults = SimConfig::default();
    let config = SimConfig {
        screen_width: args.width.unwrap_or(defaults.screen_width),
        screen_height: args.height.unwrap_or(defaults.screen_height),
        seed: args.seed,
        difficulty: settings.difficulty(),
        high_score: scores.top_score().unwrap_or(0),
    };
    let mut sim = Simulation::new(config);
    sim.apply_settings(&settings);

    let mut audio = AudioManager::new(LogBackend, &settings);
    audio.on_game_start();
    sim.start_auto_fire();
    audio.handle_all(&sim.drain_events());

    let sim = if args.realtime {
        run_realtime(sim, audio, args.ticks)?
    } else {
        run_stepped(sim, audio, args.ticks)?
    };

    let state = sim.state();
    log::info!(
        "Finished after {} ticks: score {}, wave {}, lives {}",
        state.tick_count,
        state.score,
        state.current_wave,
        state.lives
    );
    println!("{}", serde_json::to_string(&summary(state))?);

    if state.is_game_over {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;
        match scores.add_score(&args.player, state.score, state.current_wave, timestamp) {
            Some(rank) => {
                log::info!("New leaderboard entry at rank {}", rank);
                scores.save(&store).context("saving high scores")?;
            }
            None => log::info!("Score {} did not make the leaderboard", state.score),
        }
    }
    Ok(())
}

/// Step the simulation back to back on this thread
fn run_stepped(mut sim: Simulation, mut audio: AudioManager<LogBackend>, ticks: u64) -> Result<Simulation> {
    for _ in 0..ticks {
        if let Some(command) = autopilot::steer(sim.state()) {
            sim.apply(command);
        }
        sim.tick();
        let state = sim.state();
        validate_invariants(state)
            .map_err(|rule| anyhow::anyhow!("invariant {} violated at tick {}", rule, state.tick_count))?;
        audio.handle_all(&sim.drain_events());
        if sim.state().is_game_over {
            break;
        }
    }
    Ok(sim)
}

/// Hand the simulation to the driver thread and steer it from the observer
fn run_realtime(sim: Simulation, mut audio: AudioManager<LogBackend>, ticks: u64) -> Result<Simulation> {
    let options = DriverOptions {
        max_ticks: Some(ticks),
        stop_on_game_over: true,
        ..DriverOptions::default()
    };

    // The observer runs on the loop thread; the handle it steers with is filled in
    // once the loop exists.
    let handle_slot: Arc<Mutex<Option<GameHandle>>> = Arc::new(Mutex::new(None));
    let observer_slot = Arc::clone(&handle_slot);
    let game = GameLoop::spawn(sim, options, move |state: &Arc<GameState>, events| {
        audio.handle_all(events);
        let Some(command) = autopilot::steer(state) else {
            return;
        };
        if let Ok(slot) = observer_slot.lock() {
            if let Some(handle) = slot.as_ref() {
                handle.send(command);
            }
        }
    })?;
    if let Ok(mut slot) = handle_slot.lock() {
        *slot = Some(game.handle());
    }

    Ok(game.join()?)
}

#[derive(serde::Serialize)]
struct Summary {
    score: u64,
    high_score: u64,
    wave: u32,
    lives: i32,
    ticks: u64,
    game_over: bool,
}

fn summary(state: &GameState) -> Summary {
    Summary {
        score: state.score,
        high_score: state.high_score.max(state.score),
        wave: state.current_wave,
        lives: state.lives,
        ticks: state.tick_count,
        game_over: state.is_game_over,
    }
}
