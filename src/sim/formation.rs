//! Formation generator
//!
//! Lays out a wave's enemies in three rows around the top-center of the playfield.

use glam::Vec2;
use rand::{Rng, RngCore};

use super::state::{Enemy, EnemyKind, FormationPattern, Playfield};
use crate::consts::*;

/// True when the wave promotes one row-0 slot to a boss-tier enemy.
///
/// Stage boss waves never carry a formation boss.
pub fn includes_boss_tier(wave: u32) -> bool {
    wave % BOSS_TIER_WAVE_INTERVAL == 0 && wave % BOSS_WAVE_INTERVAL != 0
}

/// Columns in a GRID formation: widens every other wave, capped
pub fn grid_columns(wave: u32) -> usize {
    GRID_BASE_COLUMNS + ((wave / 2) as usize).min(GRID_MAX_EXTRA_COLUMNS)
}

/// Build the enemy set for `wave` using `pattern`.
///
/// Every enemy's fire clock starts at `now`, so each wave holds its first volley for
/// one full shoot interval regardless of when it arrives.
pub fn spawn_formation(
    wave: u32,
    pattern: FormationPattern,
    playfield: &Playfield,
    now: u64,
    rng: &mut dyn RngCore,
) -> Vec<Enemy> {
    let base_x = playfield.center_x();
    let include_boss = includes_boss_tier(wave);

    let mut enemies = Vec::new();
    for row in 0..FORMATION_ROWS {
        let cols = match pattern {
            FormationPattern::VShape => row + 1,
            FormationPattern::InvertedV => FORMATION_ROWS - row,
            FormationPattern::Grid => grid_columns(wave),
        };
        // V_SHAPE offsets by row index; the others center each row on its width
        let row_offset = match pattern {
            FormationPattern::VShape => row as f32 * FORMATION_SPACING / 2.0,
            _ => (cols - 1) as f32 * FORMATION_SPACING / 2.0,
        };
        let y = FORMATION_BASE_Y + row as f32 * FORMATION_SPACING;

        for col in 0..cols {
            let x = base_x - row_offset + col as f32 * FORMATION_SPACING;
            let promoted = match pattern {
                FormationPattern::VShape => true,
                _ => col == cols / 2,
            };
            let kind = if row == 0 && promoted && include_boss {
                EnemyKind::Boss
            } else if row == 0 {
                EnemyKind::Butterfly
            } else {
                EnemyKind::Bee
            };
            let phase = rng.random_range(0.0..100.0);
            let mut enemy = Enemy::new(Vec2::new(x, y), kind, phase);
            enemy.last_shot_time = now;
            enemies.push(enemy);
        }
    }

    log::info!(
        "Wave {}: spawning {:?} formation ({} enemies)",
        wave,
        pattern,
        enemies.len()
    );
    enemies
}
