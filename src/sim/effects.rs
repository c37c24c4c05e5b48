//! Time-to-live visual records: stars, explosions, particles, floating text, screen shake
//!
//! None of these participate in collisions.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use super::state::{Color, Explosion, FloatingText, Particle, Playfield, ScreenShake, Star};
use crate::consts::STAR_COUNT;
use crate::polar_to_cartesian;

/// Screen shake peaks per triggering event
pub const SHAKE_PLAYER_HIT: f32 = 15.0;
pub const SHAKE_BOSS_WARNING: f32 = 20.0;
pub const SHAKE_BOSS_DEFEAT: f32 = 25.0;

const MUZZLE_COLORS: [Color; 3] = [Color::YELLOW, Color::WHITE, Color::CYAN];
const BOSS_DEBRIS_COLORS: [Color; 3] = [Color::RED, Color::YELLOW, Color::WHITE];

/// Three parallax layers of stars scattered over the playfield
pub fn create_stars(playfield: &Playfield, rng: &mut dyn RngCore) -> Vec<Star> {
    (0..STAR_COUNT)
        .map(|i| {
            let layer = (i % 3) as u8;
            let (speed, brightness, size) = match layer {
                0 => (
                    rng.random_range(0.5..1.0),
                    rng.random_range(0.3..0.5),
                    1.0,
                ),
                1 => (
                    rng.random_range(1.0..1.5),
                    rng.random_range(0.5..0.8),
                    1.5,
                ),
                _ => (
                    rng.random_range(1.5..2.5),
                    rng.random_range(0.7..1.0),
                    rng.random_range(2.0..3.0),
                ),
            };
            Star {
                position: Vec2::new(
                    rng.random_range(0.0..playfield.width.max(1.0)),
                    rng.random_range(0.0..playfield.height.max(1.0)),
                ),
                speed,
                size,
                brightness,
                layer,
            }
        })
        .collect()
}

/// Scroll stars down; stars leaving the bottom re-enter above the top edge
pub fn scroll_stars(stars: &mut [Star], playfield: &Playfield, rng: &mut dyn RngCore) {
    for star in stars.iter_mut() {
        let y = star.position.y + star.speed;
        if y > playfield.height {
            star.position = Vec2::new(rng.random_range(0.0..playfield.width.max(1.0)), -10.0);
        } else {
            star.position.y = y;
        }
    }
}

/// Drop explosions whose animation has finished
pub fn expire_explosions(explosions: &mut Vec<Explosion>, now: u64) {
    explosions.retain(|e| now.saturating_sub(e.start_time) < e.duration);
}

/// Drop expired particles, then advance the survivors
pub fn advance_particles(particles: &mut Vec<Particle>, now: u64) {
    particles.retain(|p| now.saturating_sub(p.created_at) < p.lifetime);
    for p in particles.iter_mut() {
        p.position += p.velocity;
    }
}

/// Drop expired texts, then drift the survivors upward
pub fn advance_floating_texts(texts: &mut Vec<FloatingText>, now: u64) {
    texts.retain(|t| now.saturating_sub(t.created_at) < t.duration);
    for t in texts.iter_mut() {
        t.position.y -= 1.0;
    }
}

/// Linear decay from the peak; resets to the idle state once the duration has elapsed
pub fn decay_shake(shake: &ScreenShake, now: u64) -> ScreenShake {
    let elapsed = now.saturating_sub(shake.start_time);
    if shake.peak > 0.0 && elapsed < shake.duration {
        let progress = elapsed as f32 / shake.duration as f32;
        ScreenShake {
            intensity: shake.peak * (1.0 - progress),
            ..shake.clone()
        }
    } else {
        ScreenShake::default()
    }
}

/// Radial burst of particles
#[allow(clippy::too_many_arguments)]
fn burst(
    out: &mut Vec<Particle>,
    rng: &mut dyn RngCore,
    position: Vec2,
    count: usize,
    speed: (f32, f32),
    size: (f32, f32),
    lifetime: (u64, u64),
    palette: &[Color],
    now: u64,
) {
    for _ in 0..count {
        let angle = rng.random_range(0.0..TAU);
        let speed = rng.random_range(speed.0..speed.1);
        out.push(Particle {
            position,
            velocity: polar_to_cartesian(speed, angle),
            color: palette.choose(rng).copied().unwrap_or(Color::WHITE),
            size: rng.random_range(size.0..size.1),
            lifetime: rng.random_range(lifetime.0..lifetime.1),
            created_at: now,
        });
    }
}

/// Debris for a destroyed formation enemy
pub fn destruction_particles(
    out: &mut Vec<Particle>,
    rng: &mut dyn RngCore,
    position: Vec2,
    kind: super::state::EnemyKind,
    now: u64,
) {
    burst(
        out,
        rng,
        position,
        kind.particle_count(),
        (2.0, 6.0),
        (2.0, 6.0),
        (200, 400),
        kind.debris_palette(),
        now,
    );
}

/// Large burst for a defeated stage boss
pub fn boss_defeat_particles(out: &mut Vec<Particle>, rng: &mut dyn RngCore, position: Vec2, now: u64) {
    burst(
        out,
        rng,
        position,
        30,
        (2.0, 8.0),
        (3.0, 8.0),
        (400, 800),
        &BOSS_DEBRIS_COLORS,
        now,
    );
}

/// Upward cone of sparks just above the ship's nose
pub fn muzzle_flash(out: &mut Vec<Particle>, rng: &mut dyn RngCore, ship: Vec2, now: u64) {
    let origin = Vec2::new(ship.x, ship.y - 25.0);
    for _ in 0..5 {
        let angle = -FRAC_PI_2 + rng.random_range(-0.25..0.25);
        let speed = rng.random_range(3.0..6.0);
        out.push(Particle {
            position: origin,
            velocity: polar_to_cartesian(speed, angle),
            color: MUZZLE_COLORS.choose(rng).copied().unwrap_or(Color::WHITE),
            size: rng.random_range(2.0..5.0),
            lifetime: rng.random_range(80..160),
            created_at: now,
        });
    }
}
