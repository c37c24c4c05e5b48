//! Difficulty tiers and power-up policy
//!
//! Multiplier tables consumed by the simulation every tick.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::state::PowerUpKind;

/// Difficulty tier chosen in settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Persisted name
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Normal => "NORMAL",
            Difficulty::Hard => "HARD",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Some(Difficulty::Easy),
            "NORMAL" => Some(Difficulty::Normal),
            "HARD" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Parse a persisted name, falling back to `Normal` for anything unrecognized
    pub fn resolve(s: &str) -> Self {
        Self::from_name(s).unwrap_or_else(|| {
            log::warn!("Unknown difficulty {:?}, using NORMAL", s);
            Difficulty::Normal
        })
    }

    /// Enemy movement speed multiplier
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.3,
        }
    }

    /// Enemy fire frequency multiplier (divides the shoot interval)
    pub fn shoot_frequency_multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 2.0,
        }
    }

    pub fn starting_lives(&self) -> i32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Normal => 3,
            Difficulty::Hard => 2,
        }
    }

    /// Chance a destroyed formation enemy drops a power-up
    pub fn power_up_drop_rate(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.15,
            Difficulty::Normal => 0.10,
            Difficulty::Hard => 0.05,
        }
    }

    /// Enemy descent speed (units per tick) for a wave
    pub fn enemy_speed(&self, wave: u32) -> f32 {
        let wave_factor = 1.0 + wave.saturating_sub(1) as f32 * SPEED_INCREASE_PER_WAVE;
        BASE_ENEMY_SPEED * wave_factor * self.speed_multiplier()
    }

    /// Minimum milliseconds between shots of a single enemy, before jitter.
    ///
    /// Never drops below 30% of the base interval.
    pub fn shoot_interval_ms(&self, wave: u32) -> u64 {
        let wave_factor = 1.0 - wave.saturating_sub(1) as f32 * SHOOT_FREQUENCY_INCREASE_PER_WAVE;
        let factor = (wave_factor / self.shoot_frequency_multiplier()).max(MIN_SHOOT_INTERVAL_FACTOR);
        (BASE_SHOOT_INTERVAL_MS * factor).round() as u64
    }
}

/// Lifetime of a collected power-up; `None` for instant effects
pub fn power_up_duration_ms(kind: PowerUpKind) -> Option<u64> {
    match kind {
        PowerUpKind::DoubleShot | PowerUpKind::TripleShot | PowerUpKind::SpeedUp => Some(10_000),
        PowerUpKind::Shield => Some(15_000),
        PowerUpKind::ExtraLife => None,
    }
}
