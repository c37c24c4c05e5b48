//! Collision and combat resolution
//!
//! Every check is a plain circle-overlap test (`distance < radius`). The resolver
//! steps run in a fixed order from [`super::tick::run`]; the boss-defeat and
//! enemy-ram steps end the tick early by returning [`Resolution::EndTick`].

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use super::boss;
use super::effects::{self, SHAKE_BOSS_DEFEAT, SHAKE_PLAYER_HIT};
use super::events::GameEvent;
use super::state::{
    Color, Enemy, Explosion, FloatingText, FormationPattern, GameState, PowerUp, PowerUpKind,
    ScreenShake, StageBoss,
};
use super::tick::TickContext;
use crate::consts::*;
use crate::distance;
use crate::tuning::power_up_duration_ms;

const BOSS_DEFEAT_EXPLOSION_MS: u64 = 800;
const BOSS_DEFEAT_SHAKE_MS: u64 = 500;
const RAM_EXPLOSION_MS: u64 = 400;
const RAM_SHAKE_MS: u64 = 300;
const PROJECTILE_EXPLOSION_MS: u64 = 300;

/// Whether the tick continues past a resolver step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Continue,
    EndTick,
}

/// Circle overlap test shared by every collision check
#[inline]
pub fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    distance(a, b) < radius
}

/// Remove every item within `radius` of `center`, returning how many were removed
fn remove_within<T>(items: &mut Vec<T>, center: Vec2, radius: f32, pos: impl Fn(&T) -> Vec2) -> usize {
    let before = items.len();
    items.retain(|item| !within(pos(item), center, radius));
    before - items.len()
}

fn random_power_up(rng: &mut dyn RngCore) -> PowerUpKind {
    PowerUpKind::ALL
        .choose(rng)
        .copied()
        .unwrap_or(PowerUpKind::DoubleShot)
}

/// Player bullets against formation enemies.
///
/// Each bullet damages at most the lowest-index enemy in range and is consumed.
/// A destroyed enemy leaves the list immediately so later bullets cannot hit it.
pub fn bullets_vs_enemies(state: &mut GameState, ctx: &mut TickContext<'_>) {
    let bullets = std::mem::take(&mut state.bullets);
    let mut survivors = Vec::with_capacity(bullets.len());

    for bullet in bullets {
        let target = state
            .enemies
            .iter()
            .position(|e| within(bullet.position, e.position, ENEMY_HIT_RADIUS));
        let Some(index) = target else {
            survivors.push(bullet);
            continue;
        };

        state.enemies[index].health -= 1;
        if state.enemies[index].health <= 0 {
            let enemy = state.enemies.remove(index);
            record_kill(state, &enemy, ctx);
        }
    }

    state.bullets = survivors;
}

/// Score, combo and effects for one destroyed enemy
fn record_kill(state: &mut GameState, enemy: &Enemy, ctx: &mut TickContext<'_>) {
    let now = state.time_ms;
    state.combo = state.combo.register_kill(now);
    let points = (enemy.kind.points() as f32 * state.combo.multiplier).floor() as u64;
    state.score += points;

    if state.combo.count >= 2 {
        state.floating_texts.push(FloatingText::new(
            format!("{}x COMBO! +{}", state.combo.count, points),
            enemy.position - Vec2::new(0.0, 20.0),
            Color::YELLOW,
            now,
        ));
    }

    state.explosions.push(Explosion {
        position: enemy.position,
        start_time: now,
        duration: enemy.kind.explosion_duration_ms(),
        color: enemy.kind.explosion_color(),
    });
    effects::destruction_particles(&mut state.particles, ctx.rng, enemy.position, enemy.kind, now);
    ctx.events.push(GameEvent::EnemyDestroyed { kind: enemy.kind });

    if ctx.rng.random::<f32>() < ctx.difficulty.power_up_drop_rate() {
        let kind = random_power_up(ctx.rng);
        log::debug!("{:?} dropped {:?}", enemy.kind, kind);
        state.power_ups.push(PowerUp::new(enemy.position, kind, now));
    }
}

/// Unspent player bullets against the stage boss
pub fn bullets_vs_boss(state: &mut GameState, ctx: &mut TickContext<'_>) -> Resolution {
    let Some(mut stage_boss) = state.stage_boss.take() else {
        return Resolution::Continue;
    };
    let now = state.time_ms;

    let mut defeated = false;
    state.bullets.retain(|bullet| {
        if defeated || !within(bullet.position, stage_boss.position, BOSS_HIT_RADIUS) {
            return true;
        }
        boss::apply_hit(&mut stage_boss, now);
        defeated = stage_boss.health <= 0;
        false
    });

    if defeated {
        defeat_boss(state, &stage_boss, ctx);
        return Resolution::EndTick;
    }

    boss::clear_hit_flash(&mut stage_boss, now);
    state.stage_boss = Some(stage_boss);
    Resolution::Continue
}

fn defeat_boss(state: &mut GameState, stage_boss: &StageBoss, ctx: &mut TickContext<'_>) {
    let now = state.time_ms;
    let wave = state.current_wave;
    let bonus = BOSS_DEFEAT_BONUS_PER_WAVE * wave as u64;
    state.score += bonus;

    state.explosions.push(Explosion {
        position: stage_boss.position,
        start_time: now,
        duration: BOSS_DEFEAT_EXPLOSION_MS,
        color: Color::RED,
    });
    effects::boss_defeat_particles(&mut state.particles, ctx.rng, stage_boss.position, now);
    state.screen_shake = ScreenShake::new(SHAKE_BOSS_DEFEAT, now, BOSS_DEFEAT_SHAKE_MS);

    let reward = random_power_up(ctx.rng);
    state.power_ups.push(PowerUp::new(stage_boss.position, reward, now));
    state.floating_texts.push(
        FloatingText::new(format!("BOSS DEFEATED! +{bonus}"), stage_boss.position, Color::GREEN, now)
            .with_duration(2000)
            .with_font_size(32.0),
    );

    state.boss_bullets.clear();
    state.is_boss_wave = false;
    state.boss_warning = false;
    state.current_wave = wave + 1;
    state.formation_pattern = FormationPattern::for_wave(wave + 1);

    ctx.events.push(GameEvent::BossDefeated { wave });
    log::info!("Stage boss defeated on wave {}: +{}", wave, bonus);
}

/// Collect power-ups touching the player
pub fn collect_power_ups(state: &mut GameState, ctx: &mut TickContext<'_>) {
    let now = state.time_ms;
    let player = state.player.position;
    let (collected, remaining): (Vec<PowerUp>, Vec<PowerUp>) = std::mem::take(&mut state.power_ups)
        .into_iter()
        .partition(|p| within(p.position, player, POWER_UP_PICKUP_RADIUS));
    state.power_ups = remaining;

    for power_up in collected {
        match power_up_duration_ms(power_up.kind) {
            Some(duration) => {
                state.active_power_ups.insert(power_up.kind, now + duration);
            }
            None => state.lives += 1,
        }
        state.floating_texts.push(
            FloatingText::new(power_up.kind.label(), power_up.position, power_up.kind.color(), now)
                .with_font_size(28.0),
        );
        ctx.events.push(GameEvent::PowerUpCollected(power_up.kind));
        log::debug!("Collected {:?}", power_up.kind);
    }
}

/// Lose `hits` lives and start the invincibility window
fn damage_player(
    state: &mut GameState,
    hits: usize,
    explosion_ms: u64,
    color: Color,
    ctx: &mut TickContext<'_>,
) {
    let now = state.time_ms;
    state.lives -= hits as i32;
    state.perfect_wave = false;
    state.player.grant_invincibility(now);
    state.explosions.push(Explosion {
        position: state.player.position,
        start_time: now,
        duration: explosion_ms,
        color,
    });
    ctx.events.push(GameEvent::PlayerHit);
    log::debug!("Player hit {} time(s), {} lives left", hits, state.lives);
}

/// Enemy bodies ramming a vulnerable player; every collider is destroyed
pub fn enemies_vs_player(state: &mut GameState, ctx: &mut TickContext<'_>) -> Resolution {
    if !state.player_vulnerable() {
        return Resolution::Continue;
    }
    let player = state.player.position;
    let hits = remove_within(&mut state.enemies, player, ENEMY_BODY_RADIUS, |e| e.position);
    if hits == 0 {
        return Resolution::Continue;
    }

    damage_player(state, hits, RAM_EXPLOSION_MS, Color::CYAN, ctx);
    state.screen_shake = ScreenShake::new(SHAKE_PLAYER_HIT, state.time_ms, RAM_SHAKE_MS);
    Resolution::EndTick
}

/// Enemy bullets, then boss bullets, against a vulnerable player
pub fn projectiles_vs_player(state: &mut GameState, ctx: &mut TickContext<'_>) {
    let player = state.player.position;

    if state.player_vulnerable() {
        let hits = remove_within(&mut state.enemy_bullets, player, PROJECTILE_HIT_RADIUS, |b| b.position);
        if hits > 0 {
            damage_player(state, hits, PROJECTILE_EXPLOSION_MS, Color::RED, ctx);
        }
    }

    if state.player_vulnerable() {
        let hits = remove_within(&mut state.boss_bullets, player, PROJECTILE_HIT_RADIUS, |b| b.position);
        if hits > 0 {
            damage_player(state, hits, PROJECTILE_EXPLOSION_MS, Color::RED, ctx);
        }
    }
}

/// Enemies that slipped past the player leave without penalty
pub fn drop_offscreen_enemies(state: &mut GameState) {
    let limit = state.playfield.height - OFFSCREEN_ENEMY_MARGIN;
    state.enemies.retain(|e| e.position.y <= limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Bullet, EnemyBullet, EnemyKind, Playfield};
    use crate::tuning::Difficulty;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn empty_state() -> GameState {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut state = GameState::new(Playfield::default(), 3, 0, &mut rng);
        state.enemies.clear();
        state.time_ms = 10_000;
        state
    }

    fn with_ctx<R>(f: impl FnOnce(&mut TickContext<'_>) -> R) -> (R, Vec<GameEvent>) {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut events = Vec::new();
        let result = {
            let mut ctx = TickContext {
                difficulty: Difficulty::Hard,
                rng: &mut rng,
                events: &mut events,
            };
            f(&mut ctx)
        };
        (result, events)
    }

    #[test]
    fn test_hit_radius_is_strict() {
        let mut state = empty_state();
        state.enemies.push(Enemy::new(Vec2::new(100.0, 100.0), EnemyKind::Bee, 0.0));
        state.enemies.push(Enemy::new(Vec2::new(500.0, 100.0), EnemyKind::Bee, 0.0));
        state.bullets.push(Bullet { position: Vec2::new(139.0, 100.0) });
        state.bullets.push(Bullet { position: Vec2::new(541.0, 100.0) });

        let (_, events) = with_ctx(|ctx| bullets_vs_enemies(&mut state, ctx));

        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].position.x, 500.0);
        assert_eq!(state.bullets.len(), 1, "the miss keeps flying");
        assert_eq!(events, vec![GameEvent::EnemyDestroyed { kind: EnemyKind::Bee }]);
        assert_eq!(state.score, 10);
    }

    #[test]
    fn test_bullet_hits_lowest_index_only() {
        let mut state = empty_state();
        state.enemies.push(Enemy::new(Vec2::new(100.0, 100.0), EnemyKind::Butterfly, 0.0));
        state.enemies.push(Enemy::new(Vec2::new(110.0, 100.0), EnemyKind::Butterfly, 0.0));
        state.bullets.push(Bullet { position: Vec2::new(108.0, 100.0) });

        with_ctx(|ctx| bullets_vs_enemies(&mut state, ctx));

        assert_eq!(state.enemies[0].health, 1);
        assert_eq!(state.enemies[1].health, 2);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_destroyed_enemy_cannot_absorb_second_bullet() {
        let mut state = empty_state();
        state.enemies.push(Enemy::new(Vec2::new(100.0, 100.0), EnemyKind::Bee, 0.0));
        state.bullets.push(Bullet { position: Vec2::new(100.0, 100.0) });
        state.bullets.push(Bullet { position: Vec2::new(100.0, 110.0) });

        with_ctx(|ctx| bullets_vs_enemies(&mut state, ctx));

        assert!(state.enemies.is_empty());
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_combo_multiplies_points() {
        let mut state = empty_state();
        state.combo = state.combo.register_kill(9_000).register_kill(9_500);
        state.enemies.push(Enemy::new(Vec2::new(100.0, 100.0), EnemyKind::Bee, 0.0));
        state.bullets.push(Bullet { position: Vec2::new(100.0, 100.0) });

        with_ctx(|ctx| bullets_vs_enemies(&mut state, ctx));

        assert_eq!(state.combo.count, 3);
        assert_eq!(state.combo.multiplier, 2.0);
        assert_eq!(state.score, 20);
        assert!(state.floating_texts.iter().any(|t| t.text == "3x COMBO! +20"));
    }

    #[test]
    fn test_boss_defeat_ends_tick() {
        let mut state = empty_state();
        state.current_wave = 5;
        state.is_boss_wave = true;
        let mut stage_boss = boss::spawn_stage_boss(5, &state.playfield, 0);
        stage_boss.health = 1;
        state.stage_boss = Some(stage_boss);
        state.boss_bullets.push(crate::sim::state::BossBullet {
            position: Vec2::new(10.0, 10.0),
            velocity: Vec2::ZERO,
            color: Color::RED,
        });
        state.bullets.push(Bullet { position: Vec2::new(400.0, 160.0) });
        state.bullets.push(Bullet { position: Vec2::new(400.0, 150.0) });

        let (resolution, events) = with_ctx(|ctx| bullets_vs_boss(&mut state, ctx));

        assert_eq!(resolution, Resolution::EndTick);
        assert!(state.stage_boss.is_none());
        assert!(state.boss_bullets.is_empty());
        assert_eq!(state.bullets.len(), 1, "bullets after the killing shot stay");
        assert_eq!(state.score, 2_500);
        assert_eq!(state.current_wave, 6);
        assert_eq!(state.formation_pattern, FormationPattern::for_wave(6));
        assert_eq!(state.power_ups.len(), 1);
        assert!(!state.is_boss_wave);
        assert_eq!(state.screen_shake.peak, SHAKE_BOSS_DEFEAT);
        assert_eq!(events, vec![GameEvent::BossDefeated { wave: 5 }]);
    }

    #[test]
    fn test_boss_survives_hits() {
        let mut state = empty_state();
        state.stage_boss = Some(boss::spawn_stage_boss(5, &state.playfield, 0));
        state.bullets.push(Bullet { position: Vec2::new(400.0, 150.0) });
        state.bullets.push(Bullet { position: Vec2::new(455.0, 150.0) });

        let (resolution, _) = with_ctx(|ctx| bullets_vs_boss(&mut state, ctx));

        assert_eq!(resolution, Resolution::Continue);
        let stage_boss = state.stage_boss.as_ref().expect("boss alive");
        assert_eq!(stage_boss.health, 28);
        assert!(stage_boss.is_hit);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_power_up_pickup() {
        let mut state = empty_state();
        let player = state.player.position;
        state.power_ups.push(PowerUp::new(player + Vec2::new(0.0, 49.0), PowerUpKind::Shield, 0));
        state.power_ups.push(PowerUp::new(player, PowerUpKind::ExtraLife, 0));
        state.power_ups.push(PowerUp::new(player, PowerUpKind::ExtraLife, 0));
        state.power_ups.push(PowerUp::new(player + Vec2::new(51.0, 0.0), PowerUpKind::SpeedUp, 0));

        let (_, events) = with_ctx(|ctx| collect_power_ups(&mut state, ctx));

        assert_eq!(state.active_power_ups.get(&PowerUpKind::Shield), Some(&25_000));
        assert_eq!(state.lives, 5);
        assert_eq!(state.power_ups.len(), 1);
        assert_eq!(events.len(), 3);
        assert!(state.has_shield());
    }

    #[test]
    fn test_multiple_rams_in_one_tick() {
        let mut state = empty_state();
        state.lives = 2;
        let player = state.player.position;
        state.enemies.push(Enemy::new(player + Vec2::new(10.0, 0.0), EnemyKind::Bee, 0.0));
        state.enemies.push(Enemy::new(player - Vec2::new(10.0, 0.0), EnemyKind::Bee, 0.0));
        state.enemies.push(Enemy::new(Vec2::new(100.0, 100.0), EnemyKind::Bee, 0.0));

        let (resolution, events) = with_ctx(|ctx| enemies_vs_player(&mut state, ctx));

        assert_eq!(resolution, Resolution::EndTick);
        assert_eq!(state.lives, 0);
        assert_eq!(state.enemies.len(), 1);
        assert!(!state.perfect_wave);
        assert!(state.player.is_invincible);
        assert_eq!(state.player.invincible_until, 12_000);
        assert_eq!(events, vec![GameEvent::PlayerHit]);
    }

    #[test]
    fn test_shield_blocks_everything() {
        let mut state = empty_state();
        state.active_power_ups.insert(PowerUpKind::Shield, 20_000);
        let player = state.player.position;
        state.enemies.push(Enemy::new(player, EnemyKind::Bee, 0.0));
        state.enemy_bullets.push(EnemyBullet { position: player, velocity: Vec2::ZERO });

        let (resolution, events) = with_ctx(|ctx| {
            let r = enemies_vs_player(&mut state, ctx);
            projectiles_vs_player(&mut state, ctx);
            r
        });

        assert_eq!(resolution, Resolution::Continue);
        assert_eq!(state.lives, 3);
        assert!(events.is_empty());
        assert_eq!(state.enemy_bullets.len(), 1);
    }

    #[test]
    fn test_boss_bullets_skipped_after_enemy_bullet_hit() {
        let mut state = empty_state();
        let player = state.player.position;
        state.enemy_bullets.push(EnemyBullet { position: player, velocity: Vec2::ZERO });
        state.enemy_bullets.push(EnemyBullet { position: player, velocity: Vec2::ZERO });
        state.boss_bullets.push(crate::sim::state::BossBullet {
            position: player,
            velocity: Vec2::ZERO,
            color: Color::RED,
        });

        let (_, events) = with_ctx(|ctx| projectiles_vs_player(&mut state, ctx));

        assert_eq!(state.lives, 1);
        assert!(state.enemy_bullets.is_empty());
        assert_eq!(state.boss_bullets.len(), 1);
        assert_eq!(events, vec![GameEvent::PlayerHit]);
    }

    #[test]
    fn test_offscreen_enemies_dropped() {
        let mut state = empty_state();
        state.enemies.push(Enemy::new(Vec2::new(100.0, 1400.0), EnemyKind::Bee, 0.0));
        state.enemies.push(Enemy::new(Vec2::new(100.0, 1401.0), EnemyKind::Bee, 0.0));
        drop_offscreen_enemies(&mut state);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.lives, 3);
    }
}
