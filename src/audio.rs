//! Sound and haptics dispatch
//!
//! Game events map to fire-and-forget named effects. Playback itself belongs to an
//! [`AudioBackend`]; the manager only decides what to trigger and honours the
//! player's sound, music and vibration settings.

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    Shoot,
    Explosion,
    Hit,
    GameOver,
    LevelUp,
}

impl SoundEffect {
    /// Asset name
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::Shoot => "shoot",
            SoundEffect::Explosion => "explosion",
            SoundEffect::Hit => "hit",
            SoundEffect::GameOver => "gameover",
            SoundEffect::LevelUp => "levelup",
        }
    }
}

/// Haptic feedback types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vibration {
    Shoot,
    Hit,
    Explosion,
    GameOver,
}

impl Vibration {
    /// Alternating wait/buzz durations in ms; a single value is one buzz
    pub fn pattern(&self) -> &'static [u64] {
        match self {
            Vibration::Shoot => &[20],
            Vibration::Hit => &[100],
            Vibration::Explosion => &[50],
            Vibration::GameOver => &[0, 100, 50, 100, 50, 200],
        }
    }
}

/// Sound and vibration triggered by a game event
pub fn effects_for(event: &GameEvent) -> (Option<SoundEffect>, Option<Vibration>) {
    match event {
        GameEvent::Shot => (Some(SoundEffect::Shoot), Some(Vibration::Shoot)),
        GameEvent::EnemyDestroyed { .. } => (Some(SoundEffect::Explosion), Some(Vibration::Explosion)),
        GameEvent::BossDefeated { .. } => (Some(SoundEffect::Explosion), Some(Vibration::GameOver)),
        GameEvent::PlayerHit => (Some(SoundEffect::Hit), Some(Vibration::Hit)),
        GameEvent::PowerUpCollected(_) | GameEvent::WaveCleared { .. } => {
            (Some(SoundEffect::LevelUp), None)
        }
        GameEvent::GameOver { .. } => (Some(SoundEffect::GameOver), Some(Vibration::GameOver)),
        GameEvent::BossWarning { .. } | GameEvent::BossSpawned => (None, None),
    }
}

/// Device-facing playback
pub trait AudioBackend {
    fn play_sound(&mut self, effect: SoundEffect);
    fn vibrate(&mut self, vibration: Vibration);
    fn play_bgm(&mut self);
    fn pause_bgm(&mut self);
    fn resume_bgm(&mut self);
    fn stop_bgm(&mut self);
}

/// Backend that only logs what would play
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn play_sound(&mut self, effect: SoundEffect) {
        log::debug!("sfx: {}", effect.name());
    }

    fn vibrate(&mut self, vibration: Vibration) {
        log::debug!("vibrate: {:?}", vibration.pattern());
    }

    fn play_bgm(&mut self) {
        log::debug!("bgm: play");
    }

    fn pause_bgm(&mut self) {
        log::debug!("bgm: pause");
    }

    fn resume_bgm(&mut self) {
        log::debug!("bgm: resume");
    }

    fn stop_bgm(&mut self) {
        log::debug!("bgm: stop");
    }
}

/// Audio manager for the game
pub struct AudioManager<B: AudioBackend> {
    backend: B,
    sound_enabled: bool,
    music_enabled: bool,
    vibration_enabled: bool,
}

impl<B: AudioBackend> AudioManager<B> {
    pub fn new(backend: B, settings: &Settings) -> Self {
        Self {
            backend,
            sound_enabled: settings.sound_enabled,
            music_enabled: settings.music_enabled,
            vibration_enabled: settings.vibration_enabled,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        if self.music_enabled && !settings.music_enabled {
            self.backend.stop_bgm();
        }
        self.sound_enabled = settings.sound_enabled;
        self.music_enabled = settings.music_enabled;
        self.vibration_enabled = settings.vibration_enabled;
    }

    pub fn handle(&mut self, event: &GameEvent) {
        let (sound, vibration) = effects_for(event);
        if let Some(sound) = sound.filter(|_| self.sound_enabled) {
            self.backend.play_sound(sound);
        }
        if let Some(vibration) = vibration.filter(|_| self.vibration_enabled) {
            self.backend.vibrate(vibration);
        }
        if matches!(event, GameEvent::GameOver { .. }) {
            self.backend.stop_bgm();
        }
    }

    pub fn handle_all<'a>(&mut self, events: impl IntoIterator<Item = &'a GameEvent>) {
        for event in events {
            self.handle(event);
        }
    }

    /// Start (or restart) background music for a new game
    pub fn on_game_start(&mut self) {
        if self.music_enabled {
            self.backend.play_bgm();
        }
    }

    pub fn on_pause_changed(&mut self, paused: bool) {
        if !self.music_enabled {
            return;
        }
        if paused {
            self.backend.pause_bgm();
        } else {
            self.backend.resume_bgm();
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
