//! Events emitted by the simulation for audio, haptics and host bookkeeping

use serde::{Deserialize, Serialize};

use super::state::{EnemyKind, PowerUpKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Shot,
    EnemyDestroyed { kind: EnemyKind },
    PlayerHit,
    PowerUpCollected(PowerUpKind),
    /// A new formation was spawned for `wave`
    WaveCleared { wave: u32 },
    BossWarning { wave: u32 },
    BossSpawned,
    /// `wave` is the wave the boss guarded
    BossDefeated { wave: u32 },
    GameOver { score: u64, wave: u32 },
}
