//! Stage boss AI
//!
//! Phase is a pure function of remaining health. Each tick the boss sways toward a
//! sinusoidal target (or dives), then fires the volley for its phase once the phase
//! cooldown has elapsed.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, RngCore};

use super::state::{BossAttackPattern, BossBullet, Color, Playfield, StageBoss};
use crate::consts::*;
use crate::{angle_to, polar_to_cartesian, ring_velocities};

const SWAY_RANGE_FRACTION: f32 = 0.35;
const SWAY_CLOCK_RATE: f32 = 0.02;
const SWAY_EASING: f32 = 0.02;
const DIVE_SPEED: f32 = 8.0;
const DIVE_FLOOR_FRACTION: f32 = 0.7;
const AIMED_SPREAD: f32 = 0.15;

/// 1 above 66% health, 2 above 33%, otherwise 3
pub fn phase_for_health(health: i32, max_health: i32) -> u8 {
    let health = health as f32;
    let max = max_health as f32;
    if health > max * 0.66 {
        1
    } else if health > max * 0.33 {
        2
    } else {
        3
    }
}

/// Minimum gap between volleys in each phase
pub fn attack_interval_ms(phase: u8) -> u64 {
    match phase {
        1 => 3000,
        2 => 2000,
        _ => 1000,
    }
}

/// Health of the stage boss guarding `wave`
pub fn boss_health_for_wave(wave: u32) -> i32 {
    BOSS_BASE_HEALTH + (wave / BOSS_WAVE_INTERVAL) as i32 * BOSS_HEALTH_PER_STAGE
}

/// Fresh stage boss at the top-center, phase 1, with its attack clock starting at `now`
pub fn spawn_stage_boss(wave: u32, playfield: &Playfield, now: u64) -> StageBoss {
    let health = boss_health_for_wave(wave);
    StageBoss {
        position: Vec2::new(playfield.center_x(), BOSS_SPAWN_Y),
        health,
        max_health: health,
        phase: 1,
        attack_pattern: BossAttackPattern::CircleShot,
        last_attack_time: now,
        animation_phase: 0.0,
        is_hit: false,
        hit_time: 0,
        is_diving: false,
        target_position: None,
        original_position: None,
    }
}

/// Apply one point of damage; the phase follows the new health immediately
pub fn apply_hit(boss: &mut StageBoss, now: u64) {
    boss.health = (boss.health - 1).max(0);
    boss.is_hit = true;
    boss.hit_time = now;
    boss.phase = phase_for_health(boss.health, boss.max_health);
}

/// Clear the hit flash once it has shown for long enough
pub fn clear_hit_flash(boss: &mut StageBoss, now: u64) {
    if boss.is_hit && now.saturating_sub(boss.hit_time) > BOSS_HIT_FLASH_MS {
        boss.is_hit = false;
    }
}

/// Advance movement and fire any due volley into `bullets`
pub fn update_boss(
    boss: &mut StageBoss,
    player: Vec2,
    now: u64,
    playfield: &Playfield,
    bullets: &mut Vec<BossBullet>,
    rng: &mut dyn RngCore,
) {
    let sway_clock = boss.animation_phase;
    boss.animation_phase += 1.0;
    let was_diving = boss.is_diving;
    let center_x = playfield.center_x();

    if boss.is_diving {
        boss.position.y += DIVE_SPEED;
        if boss.position.y > playfield.height * DIVE_FLOOR_FRACTION {
            boss.is_diving = false;
            boss.position = boss
                .original_position
                .unwrap_or(Vec2::new(center_x, BOSS_SPAWN_Y));
        }
    } else {
        let target_x = center_x + (sway_clock * SWAY_CLOCK_RATE).sin() * playfield.width * SWAY_RANGE_FRACTION;
        boss.position.x += (target_x - boss.position.x) * SWAY_EASING;
    }

    if was_diving || now.saturating_sub(boss.last_attack_time) <= attack_interval_ms(boss.phase) {
        return;
    }

    let origin = boss.position;
    let mut volley = |count: usize, speed: f32, offset: f32, color: Color| {
        bullets.extend(ring_velocities(count, speed, offset).map(|velocity| BossBullet {
            position: origin,
            velocity,
            color,
        }));
    };

    match boss.phase {
        1 => {
            volley(8, 5.0, 0.0, Color::RED);
            boss.attack_pattern = BossAttackPattern::CircleShot;
        }
        2 => {
            let rotation = (now as f32 / 100.0) % TAU;
            volley(12, 6.0, rotation, Color::PURPLE);
            boss.attack_pattern = BossAttackPattern::SpiralShot;
        }
        _ => match rng.random_range(0..3) {
            0 => {
                boss.is_diving = true;
                boss.original_position = Some(origin);
                boss.target_position = Some(player);
                boss.attack_pattern = BossAttackPattern::DiveAttack;
                log::debug!("Stage boss diving toward {:?}", player);
            }
            1 => {
                if player != origin {
                    let bearing = angle_to(origin, player);
                    bullets.extend((-2..=2).map(|spread| BossBullet {
                        position: origin,
                        velocity: polar_to_cartesian(7.0, bearing + spread as f32 * AIMED_SPREAD),
                        color: Color::RED,
                    }));
                }
                boss.attack_pattern = BossAttackPattern::AimedBurst;
            }
            _ => {
                volley(16, 8.0, 0.0, Color::YELLOW);
                boss.attack_pattern = BossAttackPattern::RapidRing;
            }
        },
    }
    boss.last_attack_time = now;
}
