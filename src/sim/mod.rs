//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep on a logical clock only
//! - Injected, seedable RNG only
//! - Stable iteration order (list index)
//! - No rendering, audio or platform dependencies

pub mod boss;
pub mod collision;
pub mod effects;
pub mod events;
pub mod formation;
pub mod simulation;
pub mod state;
pub mod tick;
pub mod verify;

pub use events::GameEvent;
pub use simulation::{Command, SimConfig, SimPhase, Simulation};
pub use state::{
    BossAttackPattern, BossBullet, Bullet, Color, ComboInfo, Enemy, EnemyBullet, EnemyKind,
    Explosion, FloatingText, FormationPattern, GameState, Particle, Player, Playfield, PowerUp,
    PowerUpKind, ScreenShake, StageBoss, Star,
};
pub use tick::{TickContext, TickOutcome};
pub use verify::{InvariantViolation, RuleCode, validate_invariants};
