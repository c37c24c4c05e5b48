//! Game state and entity records
//!
//! Every entity is a plain value. The simulation replaces lists wholesale each tick;
//! nothing outside the simulation mutates a `GameState`.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{effects, formation};
use crate::consts::*;

/// Packed 0xAARRGGBB color tag for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const RED: Color = Color(0xFFFF_0055);
    pub const ORANGE: Color = Color(0xFFFF_6B35);
    pub const YELLOW: Color = Color(0xFFFF_EE00);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const CYAN: Color = Color(0xFF00_D9FF);
    pub const PURPLE: Color = Color(0xFF9D_4EDD);
    pub const GREEN: Color = Color(0xFF00_FF88);
}

/// Logical playfield bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
        }
    }
}

impl Playfield {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center_x(&self) -> f32 {
        self.width / 2.0
    }

    /// Strictly inside all four edges
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x > 0.0 && pos.x < self.width && pos.y > 0.0 && pos.y < self.height
    }

    /// Clamp a player position into the bottom movement band
    pub fn clamp_player(&self, pos: Vec2) -> Vec2 {
        let min_y = self.height * PLAYER_MIN_Y_FRACTION;
        let max_y = self.height - PLAYER_BOTTOM_MARGIN;
        Vec2::new(
            pos.x.clamp(PLAYER_MARGIN_X, (self.width - PLAYER_MARGIN_X).max(PLAYER_MARGIN_X)),
            pos.y.clamp(min_y, max_y.max(min_y)),
        )
    }

    pub fn player_spawn(&self) -> Vec2 {
        Vec2::new(self.center_x(), self.height - PLAYER_SPAWN_OFFSET)
    }
}

/// Formation enemy tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Bee,
    Butterfly,
    Boss,
}

impl EnemyKind {
    pub fn points(&self) -> u64 {
        match self {
            EnemyKind::Bee => 10,
            EnemyKind::Butterfly => 20,
            EnemyKind::Boss => 50,
        }
    }

    pub fn base_health(&self) -> i32 {
        match self {
            EnemyKind::Bee => 1,
            EnemyKind::Butterfly => 2,
            EnemyKind::Boss => 3,
        }
    }

    /// Number of debris particles spawned on destruction
    pub fn particle_count(&self) -> usize {
        match self {
            EnemyKind::Bee => 8,
            EnemyKind::Butterfly => 12,
            EnemyKind::Boss => 20,
        }
    }

    pub fn explosion_duration_ms(&self) -> u64 {
        match self {
            EnemyKind::Bee => 300,
            EnemyKind::Butterfly => 350,
            EnemyKind::Boss => 500,
        }
    }

    pub fn explosion_color(&self) -> Color {
        match self {
            EnemyKind::Bee => Color::YELLOW,
            EnemyKind::Butterfly => Color::GREEN,
            EnemyKind::Boss => Color::RED,
        }
    }

    pub fn debris_palette(&self) -> &'static [Color] {
        match self {
            EnemyKind::Bee => &[Color::YELLOW, Color::RED, Color::WHITE],
            EnemyKind::Butterfly => &[Color::GREEN, Color::CYAN, Color::WHITE],
            EnemyKind::Boss => &[Color::RED, Color::YELLOW, Color::WHITE],
        }
    }
}

/// Formation layout selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormationPattern {
    VShape,
    InvertedV,
    Grid,
}

impl FormationPattern {
    pub const ALL: [FormationPattern; 3] = [
        FormationPattern::VShape,
        FormationPattern::InvertedV,
        FormationPattern::Grid,
    ];

    /// Patterns cycle every three waves starting with V_SHAPE on wave 1
    pub fn for_wave(wave: u32) -> Self {
        Self::ALL[(wave.saturating_sub(1) % Self::ALL.len() as u32) as usize]
    }
}

/// Power-up kinds (ordered so the active map iterates deterministically)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    DoubleShot,
    TripleShot,
    Shield,
    SpeedUp,
    ExtraLife,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::DoubleShot,
        PowerUpKind::TripleShot,
        PowerUpKind::Shield,
        PowerUpKind::SpeedUp,
        PowerUpKind::ExtraLife,
    ];

    /// Pickup banner text
    pub fn label(&self) -> &'static str {
        match self {
            PowerUpKind::DoubleShot => "DOUBLE SHOT!",
            PowerUpKind::TripleShot => "TRIPLE SHOT!",
            PowerUpKind::Shield => "SHIELD!",
            PowerUpKind::SpeedUp => "SPEED UP!",
            PowerUpKind::ExtraLife => "+1 LIFE!",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            PowerUpKind::DoubleShot => Color::CYAN,
            PowerUpKind::TripleShot => Color::PURPLE,
            PowerUpKind::Shield => Color::GREEN,
            PowerUpKind::SpeedUp => Color::YELLOW,
            PowerUpKind::ExtraLife => Color::RED,
        }
    }
}

/// Stage boss attack currently (or last) in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossAttackPattern {
    CircleShot,
    SpiralShot,
    DiveAttack,
    AimedBurst,
    RapidRing,
}

/// The player's ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec2,
    pub is_invincible: bool,
    /// Logical time (ms) the invincibility window ends
    pub invincible_until: u64,
}

impl Player {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            is_invincible: false,
            invincible_until: 0,
        }
    }

    /// Bring `is_invincible` in line with the window at `now`
    pub fn reconcile_invincibility(&mut self, now: u64) {
        self.is_invincible = now < self.invincible_until;
    }

    pub fn grant_invincibility(&mut self, now: u64) {
        self.invincible_until = now + INVINCIBILITY_MS;
        self.is_invincible = true;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub position: Vec2,
    pub kind: EnemyKind,
    pub health: i32,
    pub last_shot_time: u64,
    /// Wing-flap clock, +1 per tick
    pub animation_phase: f32,
}

impl Enemy {
    pub fn new(position: Vec2, kind: EnemyKind, animation_phase: f32) -> Self {
        Self {
            position,
            kind,
            health: kind.base_health(),
            last_shot_time: 0,
            animation_phase,
        }
    }
}

/// Player projectile, travels straight up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub position: Vec2,
}

/// Enemy projectile aimed at the player when fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyBullet {
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossBullet {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageBoss {
    pub position: Vec2,
    pub health: i32,
    pub max_health: i32,
    /// 1..=3, always `phase_for_health(health, max_health)`
    pub phase: u8,
    pub attack_pattern: BossAttackPattern,
    pub last_attack_time: u64,
    pub animation_phase: f32,
    pub is_hit: bool,
    pub hit_time: u64,
    pub is_diving: bool,
    pub target_position: Option<Vec2>,
    pub original_position: Option<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub position: Vec2,
    pub kind: PowerUpKind,
    pub velocity: Vec2,
    pub created_at: u64,
}

impl PowerUp {
    pub const DRIFT: Vec2 = Vec2::new(0.0, 2.0);

    pub fn new(position: Vec2, kind: PowerUpKind, now: u64) -> Self {
        Self {
            position,
            kind,
            velocity: Self::DRIFT,
            created_at: now,
        }
    }
}

/// Decorative background star
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub position: Vec2,
    pub speed: f32,
    pub size: f32,
    pub brightness: f32,
    pub layer: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub position: Vec2,
    pub start_time: u64,
    pub duration: u64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Color,
    pub size: f32,
    pub lifetime: u64,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingText {
    pub text: String,
    pub position: Vec2,
    pub color: Color,
    pub created_at: u64,
    pub duration: u64,
    pub font_size: f32,
}

impl FloatingText {
    pub const DEFAULT_DURATION_MS: u64 = 1000;
    pub const DEFAULT_FONT_SIZE: f32 = 24.0;

    pub fn new(text: impl Into<String>, position: Vec2, color: Color, now: u64) -> Self {
        Self {
            text: text.into(),
            position,
            color,
            created_at: now,
            duration: Self::DEFAULT_DURATION_MS,
            font_size: Self::DEFAULT_FONT_SIZE,
        }
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }
}

/// Consecutive-kill tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboInfo {
    pub count: u32,
    pub last_kill_time: u64,
    pub display_until: u64,
    pub multiplier: f32,
}

impl Default for ComboInfo {
    fn default() -> Self {
        Self {
            count: 0,
            last_kill_time: 0,
            display_until: 0,
            multiplier: 1.0,
        }
    }
}

impl ComboInfo {
    pub fn multiplier_for(count: u32) -> f32 {
        1.0 + count.saturating_sub(1) as f32 * COMBO_STEP
    }

    /// Register a kill at `now`, continuing the chain if inside the window
    pub fn register_kill(&self, now: u64) -> Self {
        let count = if now.saturating_sub(self.last_kill_time) < COMBO_WINDOW_MS {
            self.count + 1
        } else {
            1
        };
        Self {
            count,
            last_kill_time: now,
            display_until: now + COMBO_DISPLAY_MS,
            multiplier: Self::multiplier_for(count),
        }
    }

    /// True once the chain has gone stale and should reset
    pub fn expired(&self, now: u64) -> bool {
        self.count > 0 && now.saturating_sub(self.last_kill_time) > COMBO_WINDOW_MS
    }
}

/// Screen shake, decaying linearly from `peak` to zero over `duration`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenShake {
    pub peak: f32,
    pub intensity: f32,
    pub start_time: u64,
    pub duration: u64,
}

impl ScreenShake {
    pub fn new(peak: f32, now: u64, duration: u64) -> Self {
        Self {
            peak,
            intensity: peak,
            start_time: now,
            duration,
        }
    }
}

/// Complete, externally observable simulation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<EnemyBullet>,
    pub boss_bullets: Vec<BossBullet>,
    pub stage_boss: Option<StageBoss>,
    pub power_ups: Vec<PowerUp>,
    /// Power-up kind -> logical expiry time
    pub active_power_ups: BTreeMap<PowerUpKind, u64>,
    pub stars: Vec<Star>,
    pub explosions: Vec<Explosion>,
    pub particles: Vec<Particle>,
    pub floating_texts: Vec<FloatingText>,
    pub combo: ComboInfo,
    pub screen_shake: ScreenShake,
    pub score: u64,
    /// May drop below zero when several hits land in one tick
    pub lives: i32,
    pub current_wave: u32,
    pub formation_pattern: FormationPattern,
    pub is_paused: bool,
    pub is_game_over: bool,
    pub is_auto_firing: bool,
    pub is_boss_wave: bool,
    pub boss_warning: bool,
    pub boss_warning_start_time: u64,
    pub perfect_wave: bool,
    pub high_score: u64,
    /// Logical clock (ms), advanced only by active ticks
    pub time_ms: u64,
    pub tick_count: u64,
    pub playfield: Playfield,
}

impl GameState {
    /// Fresh wave-1 state
    pub fn new(playfield: Playfield, lives: i32, high_score: u64, rng: &mut dyn RngCore) -> Self {
        let pattern = FormationPattern::for_wave(1);
        Self {
            player: Player::new(playfield.player_spawn()),
            enemies: formation::spawn_formation(1, pattern, &playfield, 0, rng),
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            boss_bullets: Vec::new(),
            stage_boss: None,
            power_ups: Vec::new(),
            active_power_ups: BTreeMap::new(),
            stars: effects::create_stars(&playfield, rng),
            explosions: Vec::new(),
            particles: Vec::new(),
            floating_texts: Vec::new(),
            combo: ComboInfo::default(),
            screen_shake: ScreenShake::default(),
            score: 0,
            lives,
            current_wave: 1,
            formation_pattern: pattern,
            is_paused: false,
            is_game_over: false,
            is_auto_firing: false,
            is_boss_wave: false,
            boss_warning: false,
            boss_warning_start_time: 0,
            perfect_wave: true,
            high_score,
            time_ms: 0,
            tick_count: 0,
            playfield,
        }
    }

    pub fn has_power_up(&self, kind: PowerUpKind) -> bool {
        self.active_power_ups.contains_key(&kind)
    }

    /// Bullets per shot: triple beats double beats single
    pub fn shot_level(&self) -> u8 {
        if self.has_power_up(PowerUpKind::TripleShot) {
            3
        } else if self.has_power_up(PowerUpKind::DoubleShot) {
            2
        } else {
            1
        }
    }

    pub fn has_shield(&self) -> bool {
        self.has_power_up(PowerUpKind::Shield)
    }

    /// Movement multiplier applied to player input
    pub fn player_speed(&self) -> f32 {
        if self.has_power_up(PowerUpKind::SpeedUp) {
            SPEED_UP_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Player can currently be damaged
    pub fn player_vulnerable(&self) -> bool {
        !self.player.is_invincible && !self.has_shield()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_initial_state() {
        let mut rng = Pcg32::seed_from_u64(7);
        let state = GameState::new(Playfield::default(), 3, 42, &mut rng);
        assert_eq!(state.current_wave, 1);
        assert_eq!(state.formation_pattern, FormationPattern::VShape);
        assert_eq!(state.enemies.len(), 6);
        assert_eq!(state.stars.len(), STAR_COUNT);
        assert_eq!(state.player.position, Vec2::new(400.0, 1400.0));
        assert_eq!(state.high_score, 42);
        assert!(state.perfect_wave);
        assert_eq!(state.shot_level(), 1);
    }

    #[test]
    fn test_shot_level_precedence() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut state = GameState::new(Playfield::default(), 3, 0, &mut rng);
        state.active_power_ups.insert(PowerUpKind::DoubleShot, 10_000);
        assert_eq!(state.shot_level(), 2);
        state.active_power_ups.insert(PowerUpKind::TripleShot, 10_000);
        assert_eq!(state.shot_level(), 3);
        state.active_power_ups.remove(&PowerUpKind::TripleShot);
        assert_eq!(state.shot_level(), 2);
    }

    #[test]
    fn test_combo_chain_and_reset() {
        let combo = ComboInfo::default().register_kill(5_000);
        assert_eq!(combo.count, 1);
        assert_eq!(combo.multiplier, 1.0);
        let combo = combo.register_kill(6_000).register_kill(7_000);
        assert_eq!(combo.count, 3);
        assert_eq!(combo.multiplier, 2.0);
        assert!(!combo.expired(9_000));
        assert!(combo.expired(9_001));
        let restarted = combo.register_kill(9_500);
        assert_eq!(restarted.count, 1);
    }

    #[test]
    fn test_pattern_cycle() {
        assert_eq!(FormationPattern::for_wave(1), FormationPattern::VShape);
        assert_eq!(FormationPattern::for_wave(2), FormationPattern::InvertedV);
        assert_eq!(FormationPattern::for_wave(3), FormationPattern::Grid);
        assert_eq!(FormationPattern::for_wave(4), FormationPattern::VShape);
    }

    #[test]
    fn test_clamp_player_band() {
        let field = Playfield::default();
        assert_eq!(field.clamp_player(Vec2::new(-50.0, 0.0)), Vec2::new(30.0, 1200.0));
        assert_eq!(field.clamp_player(Vec2::new(900.0, 2000.0)), Vec2::new(770.0, 1500.0));
    }
}
