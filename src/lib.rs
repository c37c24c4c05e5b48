//! Swarm Strike - a Galaga-style vertical arcade shooter
//!
//! Core modules:
//! - `sim`: Fixed-cadence simulation (entities, formations, boss AI, collisions, game loop)
//! - `tuning`: Difficulty tiers and power-up policy
//! - `platform`: Fixed-cadence driver thread, command channel and a scripted autopilot
//! - `audio`: Maps game events to fire-and-forget sound/vibration effects
//! - `persistence`: JSON file store for settings and the leaderboard
//! - `highscores` / `settings`: Host-side records

pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::Settings;
pub use sim::{Command, GameEvent, GameState, SimConfig, Simulation};
pub use tuning::Difficulty;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in logical milliseconds (~60 Hz)
    pub const TICK_MS: u64 = 16;
    /// Maximum catch-up ticks per driver wakeup
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Default playfield, replaced by the host via `update_screen_size`
    pub const DEFAULT_SCREEN_WIDTH: f32 = 800.0;
    pub const DEFAULT_SCREEN_HEIGHT: f32 = 1600.0;

    /// Player movement band
    pub const PLAYER_MARGIN_X: f32 = 30.0;
    pub const PLAYER_MIN_Y_FRACTION: f32 = 0.75;
    pub const PLAYER_BOTTOM_MARGIN: f32 = 100.0;
    /// Spawn height above the bottom edge
    pub const PLAYER_SPAWN_OFFSET: f32 = 200.0;
    pub const SPEED_UP_MULTIPLIER: f32 = 1.5;
    pub const INVINCIBILITY_MS: u64 = 2000;

    /// Projectiles (units per tick)
    pub const PLAYER_BULLET_SPEED: f32 = 20.0;
    pub const ENEMY_BULLET_SPEED: f32 = 8.0;
    pub const TRIPLE_SHOT_SPREAD: f32 = 20.0;
    pub const DOUBLE_SHOT_SPREAD: f32 = 10.0;
    pub const AUTO_FIRE_INTERVAL_MS: u64 = 200;

    /// Enemy pacing before wave/difficulty scaling
    pub const BASE_ENEMY_SPEED: f32 = 3.0;
    pub const BASE_SHOOT_INTERVAL_MS: f32 = 2000.0;
    pub const SHOOT_JITTER_MS: u64 = 500;
    pub const SPEED_INCREASE_PER_WAVE: f32 = 0.05;
    pub const SHOOT_FREQUENCY_INCREASE_PER_WAVE: f32 = 0.10;
    pub const MIN_SHOOT_INTERVAL_FACTOR: f32 = 0.3;

    /// Hit radii
    pub const ENEMY_HIT_RADIUS: f32 = 40.0;
    pub const BOSS_HIT_RADIUS: f32 = 60.0;
    pub const POWER_UP_PICKUP_RADIUS: f32 = 50.0;
    pub const ENEMY_BODY_RADIUS: f32 = 40.0;
    pub const PROJECTILE_HIT_RADIUS: f32 = 30.0;

    /// Enemies this close to the bottom edge leave the playfield
    pub const OFFSCREEN_ENEMY_MARGIN: f32 = 200.0;

    /// Combo
    pub const COMBO_WINDOW_MS: u64 = 2000;
    pub const COMBO_DISPLAY_MS: u64 = 1500;
    pub const COMBO_STEP: f32 = 0.5;

    /// Waves and stage boss
    pub const BOSS_WAVE_INTERVAL: u32 = 5;
    pub const BOSS_TIER_WAVE_INTERVAL: u32 = 3;
    pub const BOSS_WARNING_MS: u64 = 2000;
    pub const BOSS_BASE_HEALTH: i32 = 20;
    pub const BOSS_HEALTH_PER_STAGE: i32 = 10;
    pub const BOSS_SPAWN_Y: f32 = 150.0;
    pub const BOSS_HIT_FLASH_MS: u64 = 100;
    pub const BOSS_DEFEAT_BONUS_PER_WAVE: u64 = 500;
    pub const PERFECT_WAVE_BONUS_PER_WAVE: u64 = 100;

    /// Formation layout
    pub const FORMATION_BASE_Y: f32 = 100.0;
    pub const FORMATION_SPACING: f32 = 80.0;
    pub const FORMATION_ROWS: usize = 3;
    pub const GRID_BASE_COLUMNS: usize = 4;
    pub const GRID_MAX_EXTRA_COLUMNS: usize = 3;

    /// Background
    pub const STAR_COUNT: usize = 150;
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Bearing from `from` to `to` in radians (screen coordinates, y down)
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Velocity of magnitude `speed` pointing from `from` to `to`.
///
/// `None` when the points coincide, since there is no bearing to aim along.
#[inline]
pub fn aim(from: Vec2, to: Vec2, speed: f32) -> Option<Vec2> {
    let d = to - from;
    let len = d.length();
    if len > 0.0 { Some(d / len * speed) } else { None }
}

/// Velocities for `count` projectiles evenly spaced around a ring, rotated by `offset`
pub fn ring_velocities(count: usize, speed: f32, offset: f32) -> impl Iterator<Item = Vec2> {
    (0..count).map(move |i| {
        let angle = std::f32::consts::TAU * i as f32 / count as f32 + offset;
        polar_to_cartesian(speed, angle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aim_normalizes_to_speed() {
        let v = aim(Vec2::ZERO, Vec2::new(3.0, 4.0), 10.0).unwrap();
        assert!((v.length() - 10.0).abs() < 1e-4);
        assert!((v.x - 6.0).abs() < 1e-4);
        assert!(aim(Vec2::ONE, Vec2::ONE, 5.0).is_none());
    }

    #[test]
    fn test_ring_is_uniform() {
        let ring: Vec<Vec2> = ring_velocities(8, 5.0, 0.0).collect();
        assert_eq!(ring.len(), 8);
        assert!((ring[0] - Vec2::new(5.0, 0.0)).length() < 1e-4);
        assert!((ring[2] - Vec2::new(0.0, 5.0)).length() < 1e-4);
        let sum: Vec2 = ring.iter().copied().sum();
        assert!(sum.length() < 1e-3);
    }

    #[test]
    fn test_angle_to_points_down_screen() {
        let a = angle_to(Vec2::ZERO, Vec2::new(0.0, 10.0));
        assert!((a - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }
}
