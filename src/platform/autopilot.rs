//! Scripted input for headless runs
//!
//! Tracks the lowest threat horizontally and sidesteps projectiles that are about
//! to land. Good enough to clear early waves; not meant to play well.

use glam::Vec2;

use crate::sim::{Command, GameState};

/// Horizontal input per tick before the speed multiplier
const MAX_STEP: f32 = 8.0;
/// Projectiles inside this box above the ship trigger a sidestep
const DODGE_HALF_WIDTH: f32 = 35.0;
const DODGE_LOOKAHEAD: f32 = 160.0;

/// X coordinate worth lining up under: the stage boss, else the lowest enemy
fn target_x(state: &GameState) -> Option<f32> {
    if let Some(boss) = &state.stage_boss {
        return Some(boss.position.x);
    }
    state
        .enemies
        .iter()
        .max_by(|a, b| a.position.y.total_cmp(&b.position.y))
        .map(|e| e.position.x)
}

fn incoming(state: &GameState, ship: Vec2) -> Option<Vec2> {
    state
        .enemy_bullets
        .iter()
        .map(|b| b.position)
        .chain(state.boss_bullets.iter().map(|b| b.position))
        .filter(|p| {
            (p.x - ship.x).abs() < DODGE_HALF_WIDTH && p.y < ship.y && ship.y - p.y < DODGE_LOOKAHEAD
        })
        .max_by(|a, b| a.y.total_cmp(&b.y))
}

/// Input for the next tick, or `None` to stay put
pub fn steer(state: &GameState) -> Option<Command> {
    if state.is_paused || state.is_game_over {
        return None;
    }
    let ship = state.player.position;

    let dx = if let Some(threat) = incoming(state, ship) {
        // away from the projectile, toward the roomier side when dead centre
        if threat.x > ship.x || (threat.x == ship.x && ship.x > state.playfield.center_x()) {
            -MAX_STEP
        } else {
            MAX_STEP
        }
    } else {
        let target = target_x(state)?;
        (target - ship.x).clamp(-MAX_STEP, MAX_STEP)
    };

    if dx.abs() < f32::EPSILON {
        None
    } else {
        Some(Command::Move { dx, dy: 0.0 })
    }
}
