//! Fixed timestep simulation tick
//!
//! Advances the game state by one logical step of `TICK_MS` milliseconds.

use rand::{Rng, RngCore};

use super::collision::{self, Resolution};
use super::effects::{self, SHAKE_BOSS_WARNING};
use super::events::GameEvent;
use super::state::{Color, ComboInfo, EnemyBullet, FloatingText, FormationPattern, GameState, ScreenShake};
use super::{boss, formation};
use crate::aim;
use crate::consts::*;
use crate::tuning::Difficulty;

/// Per-tick collaborators shared by the pipeline steps
pub struct TickContext<'a> {
    pub difficulty: Difficulty,
    pub rng: &'a mut dyn RngCore,
    pub events: &'a mut Vec<GameEvent>,
}

/// How a tick ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused or game over; nothing changed
    Skipped,
    Completed,
    BossDefeated,
    PlayerRammed,
    BossWarning,
}

/// True when a tick would change anything
pub fn is_active(state: &GameState) -> bool {
    !state.is_paused && !state.is_game_over
}

/// One logical step of `TICK_MS`
pub fn advance_clock(state: &mut GameState) {
    state.time_ms += TICK_MS;
    state.tick_count += 1;
}

/// Advance the clock and run one full step
pub fn tick(state: &mut GameState, ctx: &mut TickContext<'_>) -> TickOutcome {
    if !is_active(state) {
        return TickOutcome::Skipped;
    }
    advance_clock(state);
    run(state, ctx)
}

/// Run the pipeline for the current clock value, then finalize.
///
/// Finalization runs on every path, including the early exits.
pub fn run(state: &mut GameState, ctx: &mut TickContext<'_>) -> TickOutcome {
    let outcome = resolve(state, ctx);
    finalize(state, ctx);
    outcome
}

fn resolve(state: &mut GameState, ctx: &mut TickContext<'_>) -> TickOutcome {
    update_ambient(state, ctx);
    advance_bullets(state);
    advance_enemies(state, ctx);
    advance_enemy_bullets(state);
    advance_boss(state, ctx);

    collision::bullets_vs_enemies(state, ctx);
    if collision::bullets_vs_boss(state, ctx) == Resolution::EndTick {
        return TickOutcome::BossDefeated;
    }
    collision::collect_power_ups(state, ctx);
    if collision::enemies_vs_player(state, ctx) == Resolution::EndTick {
        return TickOutcome::PlayerRammed;
    }
    collision::projectiles_vs_player(state, ctx);
    collision::drop_offscreen_enemies(state);

    if advance_wave(state, ctx) == Resolution::EndTick {
        return TickOutcome::BossWarning;
    }
    spawn_boss_if_due(state, ctx);
    TickOutcome::Completed
}

/// Effects, power-up drift and expiry, invincibility and combo timeouts
fn update_ambient(state: &mut GameState, ctx: &mut TickContext<'_>) {
    let now = state.time_ms;
    state.screen_shake = effects::decay_shake(&state.screen_shake, now);
    effects::scroll_stars(&mut state.stars, &state.playfield, ctx.rng);
    effects::expire_explosions(&mut state.explosions, now);
    effects::advance_particles(&mut state.particles, now);
    effects::advance_floating_texts(&mut state.floating_texts, now);

    let height = state.playfield.height;
    for p in state.power_ups.iter_mut() {
        p.position += p.velocity;
    }
    state.power_ups.retain(|p| p.position.y < height);
    state.active_power_ups.retain(|_, expiry| now < *expiry);

    state.player.reconcile_invincibility(now);
    if state.combo.expired(now) {
        state.combo = ComboInfo::default();
    }
}

fn advance_bullets(state: &mut GameState) {
    for b in state.bullets.iter_mut() {
        b.position.y -= PLAYER_BULLET_SPEED;
    }
    state.bullets.retain(|b| b.position.y > 0.0);
}

/// Move the formation down and let each enemy fire when its interval has elapsed
fn advance_enemies(state: &mut GameState, ctx: &mut TickContext<'_>) {
    let now = state.time_ms;
    let wave = state.current_wave;
    let speed = ctx.difficulty.enemy_speed(wave);
    let interval = ctx.difficulty.shoot_interval_ms(wave);
    let player = state.player.position;

    for enemy in state.enemies.iter_mut() {
        enemy.position.y += speed;
        enemy.animation_phase += 1.0;

        let jitter = ctx.rng.random_range(0..SHOOT_JITTER_MS);
        if now.saturating_sub(enemy.last_shot_time) > interval + jitter {
            if let Some(velocity) = aim(enemy.position, player, ENEMY_BULLET_SPEED) {
                state.enemy_bullets.push(EnemyBullet {
                    position: enemy.position,
                    velocity,
                });
            }
            enemy.last_shot_time = now;
        }
    }
}

fn advance_enemy_bullets(state: &mut GameState) {
    for b in state.enemy_bullets.iter_mut() {
        b.position += b.velocity;
    }
    let field = state.playfield;
    state.enemy_bullets.retain(|b| field.contains(b.position));
}

/// Existing boss bullets move first; the boss then adds any new volley
fn advance_boss(state: &mut GameState, ctx: &mut TickContext<'_>) {
    for b in state.boss_bullets.iter_mut() {
        b.position += b.velocity;
    }
    let field = state.playfield;
    state.boss_bullets.retain(|b| field.contains(b.position));

    if let Some(stage_boss) = state.stage_boss.as_mut() {
        boss::update_boss(
            stage_boss,
            state.player.position,
            state.time_ms,
            &field,
            &mut state.boss_bullets,
            ctx.rng,
        );
    }
}

/// Start the next wave once the field is clear
fn advance_wave(state: &mut GameState, ctx: &mut TickContext<'_>) -> Resolution {
    if !state.enemies.is_empty() || state.stage_boss.is_some() || state.boss_warning {
        return Resolution::Continue;
    }
    let now = state.time_ms;
    let cleared = state.current_wave;

    if state.perfect_wave {
        let bonus = PERFECT_WAVE_BONUS_PER_WAVE * cleared as u64;
        state.score += bonus;
        let center = glam::Vec2::new(state.playfield.center_x(), state.playfield.height / 2.0);
        state.floating_texts.push(
            FloatingText::new(format!("PERFECT! +{bonus}"), center, Color::GREEN, now)
                .with_duration(2000)
                .with_font_size(36.0),
        );
        log::debug!("Perfect wave {}: +{}", cleared, bonus);
    }

    let wave = cleared + 1;
    let pattern = FormationPattern::for_wave(wave);
    state.current_wave = wave;
    state.perfect_wave = true;
    state.formation_pattern = pattern;

    if wave % BOSS_WAVE_INTERVAL == 0 {
        state.boss_warning = true;
        state.boss_warning_start_time = now;
        state.is_boss_wave = true;
        state.enemies.clear();
        state.screen_shake = ScreenShake::new(SHAKE_BOSS_WARNING, now, BOSS_WARNING_MS);
        ctx.events.push(GameEvent::BossWarning { wave });
        log::info!("Boss warning for wave {}", wave);
        return Resolution::EndTick;
    }

    state.enemies = formation::spawn_formation(wave, pattern, &state.playfield, now, ctx.rng);
    ctx.events.push(GameEvent::WaveCleared { wave });
    Resolution::Continue
}

/// Bring in the stage boss once the warning has run its course
fn spawn_boss_if_due(state: &mut GameState, ctx: &mut TickContext<'_>) {
    let now = state.time_ms;
    if !state.boss_warning
        || state.stage_boss.is_some()
        || now.saturating_sub(state.boss_warning_start_time) < BOSS_WARNING_MS
    {
        return;
    }
    let stage_boss = boss::spawn_stage_boss(state.current_wave, &state.playfield, now);
    log::info!("Stage boss spawned with {} hp", stage_boss.health);
    state.stage_boss = Some(stage_boss);
    state.boss_warning = false;
    ctx.events.push(GameEvent::BossSpawned);
}

/// Game-over check and invincibility reconciliation
pub fn finalize(state: &mut GameState, ctx: &mut TickContext<'_>) {
    if state.lives <= 0 && !state.is_game_over {
        state.is_game_over = true;
        state.is_auto_firing = false;
        state.high_score = state.high_score.max(state.score);
        ctx.events.push(GameEvent::GameOver {
            score: state.score,
            wave: state.current_wave,
        });
        log::info!("Game over: score={}, wave={}", state.score, state.current_wave);
    }
    state.player.reconcile_invincibility(state.time_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Bullet, Enemy, EnemyKind, Playfield, PowerUpKind};
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Harness {
        state: GameState,
        rng: Pcg32,
        events: Vec<GameEvent>,
        difficulty: Difficulty,
    }

    impl Harness {
        fn new(seed: u64) -> Self {
            let mut rng = Pcg32::seed_from_u64(seed);
            let state = GameState::new(Playfield::default(), 3, 0, &mut rng);
            Self {
                state,
                rng,
                events: Vec::new(),
                difficulty: Difficulty::Normal,
            }
        }

        fn tick(&mut self) -> TickOutcome {
            let mut ctx = TickContext {
                difficulty: self.difficulty,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            tick(&mut self.state, &mut ctx)
        }
    }

    #[test]
    fn test_paused_tick_is_noop() {
        let mut h = Harness::new(1);
        h.state.is_paused = true;
        let before = h.state.clone();
        assert_eq!(h.tick(), TickOutcome::Skipped);
        assert_eq!(h.state, before);
        assert!(h.events.is_empty());
    }

    #[test]
    fn test_clock_and_movement() {
        let mut h = Harness::new(1);
        let y0 = h.state.enemies[0].position.y;
        h.state.bullets.push(Bullet { position: Vec2::new(10.0, 30.0) });
        h.state.bullets.push(Bullet { position: Vec2::new(10.0, 15.0) });
        assert_eq!(h.tick(), TickOutcome::Completed);
        assert_eq!(h.state.time_ms, TICK_MS);
        assert_eq!(h.state.tick_count, 1);
        assert_eq!(h.state.enemies[0].position.y, y0 + BASE_ENEMY_SPEED);
        assert_eq!(h.state.bullets.len(), 1);
        assert_eq!(h.state.bullets[0].position.y, 10.0);
    }

    #[test]
    fn test_enemies_fire_after_interval() {
        let mut h = Harness::new(4);
        h.state.time_ms = 1_984;
        h.tick();
        assert!(h.state.enemy_bullets.is_empty(), "interval is strict");
        h.state.time_ms = 2_500;
        h.tick();
        assert_eq!(h.state.enemy_bullets.len(), h.state.enemies.len());
        assert!(h.state.enemies.iter().all(|e| e.last_shot_time == 2_516));
        let v = h.state.enemy_bullets[0].velocity;
        assert!((v.length() - ENEMY_BULLET_SPEED).abs() < 1e-3);
    }

    /// Ticks from `spawned_at` until the formation's first enemy bullet appears
    fn first_volley_delay(h: &mut Harness, spawned_at: u64) -> u64 {
        for _ in 0..1_000 {
            h.tick();
            if !h.state.enemy_bullets.is_empty() {
                return h.state.time_ms - spawned_at;
            }
        }
        panic!("formation never fired");
    }

    #[test]
    fn test_every_wave_holds_its_first_volley() {
        let mut first = Harness::new(6);
        let wave_one = first_volley_delay(&mut first, 0);
        let interval = first.difficulty.shoot_interval_ms(1);
        assert!(wave_one > interval);
        assert!(wave_one <= interval + SHOOT_JITTER_MS + TICK_MS);

        let mut later = Harness::new(6);
        later.state.time_ms = 50_000;
        later.state.enemies.clear();
        later.tick();
        assert_eq!(later.state.current_wave, 2);
        let spawned_at = later.state.time_ms;
        assert!(later.state.enemies.iter().all(|e| e.last_shot_time == spawned_at));
        later.tick();
        assert!(later.state.enemy_bullets.is_empty(), "no volley on arrival");

        let wave_two = first_volley_delay(&mut later, spawned_at);
        let interval = later.difficulty.shoot_interval_ms(2);
        assert!(wave_two > interval);
        assert!(wave_two <= interval + SHOOT_JITTER_MS + TICK_MS);
    }

    #[test]
    fn test_wave_clear_spawns_next_formation() {
        let mut h = Harness::new(2);
        h.state.enemies.clear();
        assert_eq!(h.tick(), TickOutcome::Completed);
        assert_eq!(h.state.current_wave, 2);
        assert_eq!(h.state.score, 100, "perfect bonus for wave 1");
        assert_eq!(h.state.formation_pattern, FormationPattern::InvertedV);
        assert_eq!(h.state.enemies.len(), 6);
        assert!(h.events.contains(&GameEvent::WaveCleared { wave: 2 }));
    }

    #[test]
    fn test_imperfect_wave_has_no_bonus() {
        let mut h = Harness::new(2);
        h.state.enemies.clear();
        h.state.perfect_wave = false;
        h.tick();
        assert_eq!(h.state.score, 0);
        assert!(h.state.perfect_wave);
    }

    #[test]
    fn test_boss_warning_then_spawn() {
        let mut h = Harness::new(3);
        h.state.current_wave = 4;
        h.state.enemies.clear();
        assert_eq!(h.tick(), TickOutcome::BossWarning);
        assert_eq!(h.state.current_wave, 5);
        assert!(h.state.boss_warning);
        assert!(h.state.is_boss_wave);
        assert!(h.state.enemies.is_empty());
        let start = h.state.boss_warning_start_time;

        while h.state.time_ms < start + BOSS_WARNING_MS - TICK_MS {
            h.tick();
            assert!(h.state.stage_boss.is_none());
        }
        h.tick();
        let stage_boss = h.state.stage_boss.as_ref().expect("boss spawned");
        assert_eq!(stage_boss.health, 30);
        assert_eq!(stage_boss.max_health, 30);
        assert!(!h.state.boss_warning);
        assert!(h.events.contains(&GameEvent::BossSpawned));
    }

    #[test]
    fn test_ram_sets_game_over_same_tick() {
        let mut h = Harness::new(5);
        h.state.lives = 2;
        h.state.enemies.clear();
        let player = h.state.player.position;
        // Placed so that after this tick's descent they overlap the ship
        let lead = Vec2::new(0.0, -BASE_ENEMY_SPEED);
        h.state.enemies.push(Enemy::new(player + lead, EnemyKind::Bee, 0.0));
        h.state.enemies.push(Enemy::new(player + lead + Vec2::new(15.0, 0.0), EnemyKind::Bee, 0.0));
        h.state.is_auto_firing = true;

        assert_eq!(h.tick(), TickOutcome::PlayerRammed);
        assert_eq!(h.state.lives, 0);
        assert!(h.state.is_game_over);
        assert!(!h.state.is_auto_firing);
        let game_overs = h
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);

        let frozen = h.state.clone();
        assert_eq!(h.tick(), TickOutcome::Skipped);
        assert_eq!(h.state, frozen);
    }

    #[test]
    fn test_invincibility_expires() {
        let mut h = Harness::new(6);
        h.state.player.grant_invincibility(0);
        for _ in 0..200 {
            h.tick();
            let now = h.state.time_ms;
            assert_eq!(h.state.player.is_invincible, now < h.state.player.invincible_until);
        }
        assert!(!h.state.player.is_invincible);
    }

    #[test]
    fn test_power_up_expiry() {
        let mut h = Harness::new(6);
        h.state.active_power_ups.insert(PowerUpKind::TripleShot, 32);
        h.tick();
        assert_eq!(h.state.shot_level(), 3);
        h.tick();
        assert_eq!(h.state.shot_level(), 1);
    }

    #[test]
    fn test_determinism() {
        let mut a = Harness::new(99);
        let mut b = Harness::new(99);
        for _ in 0..500 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.state, b.state);
        assert_eq!(a.events, b.events);
    }
}
