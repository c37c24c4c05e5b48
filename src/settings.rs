//! Game settings and preferences
//!
//! Persisted as `settings.json` in the host's data directory.

use serde::{Deserialize, Serialize};

use crate::persistence::{JsonStore, StoreError};
use crate::tuning::Difficulty;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Sound effects
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Background music
    #[serde(default = "default_true")]
    pub music_enabled: bool,
    /// Haptic feedback
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    /// Persisted difficulty name; unknown names resolve to NORMAL
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

fn default_true() -> bool {
    true
}

fn default_difficulty() -> String {
    Difficulty::Normal.as_str().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: default_true(),
            music_enabled: default_true(),
            vibration_enabled: default_true(),
            difficulty: default_difficulty(),
        }
    }
}

impl Settings {
    const STORAGE_KEY: &'static str = "settings";

    /// Difficulty tier, falling back to NORMAL for unknown names
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::resolve(&self.difficulty)
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty.as_str().to_string();
    }

    pub fn load(store: &JsonStore) -> Self {
        store.load_or_default(Self::STORAGE_KEY)
    }

    pub fn save(&self, store: &JsonStore) -> Result<(), StoreError> {
        store.save(Self::STORAGE_KEY, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.sound_enabled && settings.music_enabled && settings.vibration_enabled);
        assert_eq!(settings.difficulty(), Difficulty::Normal);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"music_enabled": false}"#).unwrap();
        assert!(!settings.music_enabled);
        assert!(settings.sound_enabled);
        assert_eq!(settings.difficulty, "NORMAL");
    }

    #[test]
    fn test_unknown_difficulty_falls_back() {
        let mut settings = Settings::default();
        settings.difficulty = "INSANE".into();
        assert_eq!(settings.difficulty(), Difficulty::Normal);
        settings.set_difficulty(Difficulty::Easy);
        assert_eq!(settings.difficulty, "EASY");
        assert_eq!(settings.difficulty(), Difficulty::Easy);
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let mut settings = Settings::default();
        settings.vibration_enabled = false;
        settings.set_difficulty(Difficulty::Hard);
        settings.save(&store).unwrap();
        assert_eq!(Settings::load(&store), settings);
    }
}
