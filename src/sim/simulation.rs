//! The `Simulation` object: owns the canonical state, applies commands and
//! publishes immutable snapshots.

use std::sync::Arc;

use glam::Vec2;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects;
use super::events::GameEvent;
use super::state::{Bullet, GameState, Playfield};
use super::tick::{self, TickContext, TickOutcome};
use crate::consts::*;
use crate::settings::Settings;
use crate::tuning::Difficulty;

/// Construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    pub seed: u64,
    pub difficulty: Difficulty,
    pub high_score: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            seed: 0,
            difficulty: Difficulty::Normal,
            high_score: 0,
        }
    }
}

/// Input command, applied between ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Move { dx: f32, dy: f32 },
    Shoot,
    StartAutoFire,
    StopAutoFire,
    TogglePause,
    Restart,
    Resize { width: f32, height: f32 },
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    /// No tick has run yet
    Created,
    Ticking,
    Paused,
    /// Terminal until restart
    GameOver,
}

/// Owns one game: the mutable state, its seeded RNG and the pending event queue.
///
/// Hosts feed it commands and call [`Simulation::tick`] on the logical clock; readers
/// get immutable snapshots.
pub struct Simulation {
    state: GameState,
    snapshot: Arc<GameState>,
    rng: Box<dyn RngCore + Send>,
    events: Vec<GameEvent>,
    difficulty: Difficulty,
    /// Logical time of the next auto-fire shot while auto-fire is on
    next_auto_fire: Option<u64>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let rng = Box::new(Pcg32::seed_from_u64(config.seed));
        Self::with_rng(config, rng)
    }

    /// Build with an injected random source
    pub fn with_rng(config: SimConfig, mut rng: Box<dyn RngCore + Send>) -> Self {
        let playfield = Playfield::new(config.screen_width, config.screen_height);
        let state = GameState::new(
            playfield,
            config.difficulty.starting_lives(),
            config.high_score,
            rng.as_mut(),
        );
        log::info!(
            "Simulation created: {}x{}, difficulty {}",
            playfield.width,
            playfield.height,
            config.difficulty.as_str()
        );
        Self {
            snapshot: Arc::new(state.clone()),
            state,
            rng,
            events: Vec::new(),
            difficulty: config.difficulty,
            next_auto_fire: None,
        }
    }

    /// Advance one fixed step. Paused or finished games are left untouched.
    pub fn tick(&mut self) -> TickOutcome {
        if !tick::is_active(&self.state) {
            return TickOutcome::Skipped;
        }
        tick::advance_clock(&mut self.state);
        self.fire_auto_if_due();

        let outcome = {
            let mut ctx = TickContext {
                difficulty: self.difficulty,
                rng: self.rng.as_mut(),
                events: &mut self.events,
            };
            tick::run(&mut self.state, &mut ctx)
        };
        if self.state.is_game_over {
            self.next_auto_fire = None;
        }
        self.publish();
        outcome
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Move { dx, dy } => self.move_player(dx, dy),
            Command::Shoot => self.shoot(),
            Command::StartAutoFire => self.start_auto_fire(),
            Command::StopAutoFire => self.stop_auto_fire(),
            Command::TogglePause => self.toggle_pause(),
            Command::Restart => self.restart_game(),
            Command::Resize { width, height } => self.update_screen_size(width, height),
        }
    }

    pub fn move_player(&mut self, dx: f32, dy: f32) {
        if self.state.is_paused {
            return;
        }
        let speed = self.state.player_speed();
        let target = self.state.player.position + Vec2::new(dx, dy) * speed;
        self.state.player.position = self.state.playfield.clamp_player(target);
        self.publish();
    }

    pub fn shoot(&mut self) {
        if self.state.is_paused || self.state.is_game_over {
            return;
        }
        self.fire_volley();
        self.publish();
    }

    pub fn start_auto_fire(&mut self) {
        let state = &self.state;
        if state.is_auto_firing || state.is_paused || state.is_game_over {
            return;
        }
        self.state.is_auto_firing = true;
        self.fire_volley();
        self.next_auto_fire = Some(self.state.time_ms + AUTO_FIRE_INTERVAL_MS);
        self.publish();
    }

    pub fn stop_auto_fire(&mut self) {
        self.state.is_auto_firing = false;
        self.next_auto_fire = None;
        self.publish();
    }

    pub fn toggle_pause(&mut self) {
        if self.state.is_game_over {
            return;
        }
        self.state.is_paused = !self.state.is_paused;
        self.state.is_auto_firing = false;
        self.next_auto_fire = None;
        log::debug!("Paused: {}", self.state.is_paused);
        self.publish();
    }

    /// Fresh wave-1 game with the latest difficulty; high score and playfield carry over
    pub fn restart_game(&mut self) {
        let high_score = self.state.high_score.max(self.state.score);
        let playfield = self.state.playfield;
        self.state = GameState::new(
            playfield,
            self.difficulty.starting_lives(),
            high_score,
            self.rng.as_mut(),
        );
        self.next_auto_fire = None;
        log::info!("Game restarted on {}", self.difficulty.as_str());
        self.publish();
    }

    /// Replace the playfield bounds; entities are not moved
    pub fn update_screen_size(&mut self, width: f32, height: f32) {
        self.state.playfield = Playfield::new(width, height);
        self.publish();
    }

    /// Adopt persisted settings. The difficulty applies from the next restart,
    /// or immediately to the starting lives if no tick has run yet.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.difficulty = settings.difficulty();
        if self.state.tick_count == 0 && !self.state.is_game_over {
            self.state.lives = self.difficulty.starting_lives();
        }
        self.publish();
    }

    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.snapshot)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> SimPhase {
        if self.state.is_game_over {
            SimPhase::GameOver
        } else if self.state.is_paused {
            SimPhase::Paused
        } else if self.state.tick_count == 0 {
            SimPhase::Created
        } else {
            SimPhase::Ticking
        }
    }

    fn fire_auto_if_due(&mut self) {
        if !self.state.is_auto_firing {
            self.next_auto_fire = None;
            return;
        }
        let now = self.state.time_ms;
        if self.next_auto_fire.is_some_and(|at| now >= at) {
            self.fire_volley();
            self.next_auto_fire = Some(now + AUTO_FIRE_INTERVAL_MS);
        }
    }

    /// Spawn one shot's worth of bullets plus the muzzle flash
    fn fire_volley(&mut self) {
        let ship = self.state.player.position;
        let offsets: &[f32] = match self.state.shot_level() {
            3 => &[-TRIPLE_SHOT_SPREAD, 0.0, TRIPLE_SHOT_SPREAD],
            2 => &[-DOUBLE_SHOT_SPREAD, DOUBLE_SHOT_SPREAD],
            _ => &[0.0],
        };
        self.state.bullets.extend(offsets.iter().map(|dx| Bullet {
            position: Vec2::new(ship.x + dx, ship.y),
        }));
        effects::muzzle_flash(&mut self.state.particles, self.rng.as_mut(), ship, self.state.time_ms);
        self.events.push(GameEvent::Shot);
    }

    fn publish(&mut self) {
        self.snapshot = Arc::new(self.state.clone());
    }
}
