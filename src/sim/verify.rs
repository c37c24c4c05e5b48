//! Post-tick state invariants
//!
//! The driver runs [`validate_invariants`] after every tick and stops on the first
//! violation.

use core::fmt;

use thiserror::Error;

use super::boss::phase_for_health;
use super::state::{ComboInfo, GameState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCode {
    GlobalWaveNonZero,
    GlobalGameOverLivesConsistency,
    GlobalAutoFireAfterGameOver,
    PlayerInvincibilityWindow,
    PlayerPositionFinite,
    EnemyHealthPositive,
    BossHealthRange,
    BossPhaseDerived,
    BossWarningExclusive,
    PowerUpExpiry,
    ComboMultiplier,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GlobalWaveNonZero => write!(f, "GLOBAL_WAVE_NONZERO"),
            Self::GlobalGameOverLivesConsistency => write!(f, "GLOBAL_GAME_OVER_LIVES_CONSISTENCY"),
            Self::GlobalAutoFireAfterGameOver => write!(f, "GLOBAL_AUTO_FIRE_AFTER_GAME_OVER"),
            Self::PlayerInvincibilityWindow => write!(f, "PLAYER_INVINCIBILITY_WINDOW"),
            Self::PlayerPositionFinite => write!(f, "PLAYER_POSITION_FINITE"),
            Self::EnemyHealthPositive => write!(f, "ENEMY_HEALTH_POSITIVE"),
            Self::BossHealthRange => write!(f, "BOSS_HEALTH_RANGE"),
            Self::BossPhaseDerived => write!(f, "BOSS_PHASE_DERIVED"),
            Self::BossWarningExclusive => write!(f, "BOSS_WARNING_EXCLUSIVE"),
            Self::PowerUpExpiry => write!(f, "POWER_UP_EXPIRY"),
            Self::ComboMultiplier => write!(f, "COMBO_MULTIPLIER"),
        }
    }
}

/// A rule broken at the end of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invariant {rule} violated at tick {tick}")]
pub struct InvariantViolation {
    pub tick: u64,
    pub rule: RuleCode,
}

/// Check a freshly ticked state
pub fn validate_invariants(state: &GameState) -> Result<(), RuleCode> {
    let now = state.time_ms;

    if state.current_wave < 1 {
        return Err(RuleCode::GlobalWaveNonZero);
    }
    if state.is_game_over != (state.lives <= 0) {
        return Err(RuleCode::GlobalGameOverLivesConsistency);
    }
    if state.is_game_over && state.is_auto_firing {
        return Err(RuleCode::GlobalAutoFireAfterGameOver);
    }

    let player = &state.player;
    if player.is_invincible != (now < player.invincible_until) {
        return Err(RuleCode::PlayerInvincibilityWindow);
    }
    if !player.position.is_finite() {
        return Err(RuleCode::PlayerPositionFinite);
    }

    if state.enemies.iter().any(|e| e.health <= 0) {
        return Err(RuleCode::EnemyHealthPositive);
    }

    if let Some(boss) = &state.stage_boss {
        if boss.health <= 0 || boss.health > boss.max_health {
            return Err(RuleCode::BossHealthRange);
        }
        if boss.phase != phase_for_health(boss.health, boss.max_health) {
            return Err(RuleCode::BossPhaseDerived);
        }
        if state.boss_warning {
            return Err(RuleCode::BossWarningExclusive);
        }
    }

    if state.active_power_ups.values().any(|&expiry| expiry <= now) {
        return Err(RuleCode::PowerUpExpiry);
    }

    let combo = &state.combo;
    let expected = if combo.count == 0 {
        1.0
    } else {
        ComboInfo::multiplier_for(combo.count)
    };
    if combo.multiplier != expected {
        return Err(RuleCode::ComboMultiplier);
    }

    Ok(())
}
