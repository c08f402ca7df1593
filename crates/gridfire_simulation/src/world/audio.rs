//! Audio ledger: логическое "что сейчас играет"
//!
//! Реального звука здесь нет. Хост читает `SoundCommand` events и играет сам,
//! ledger только отвечает на `is_playing(name)`.

use std::collections::BTreeSet;

use bevy::prelude::*;

use crate::combat::SoundCommand;

#[derive(Resource, Debug, Default)]
pub struct AudioLedger {
    looping: BTreeSet<String>,
    /// One-shot звуки, запущенные в текущем tick
    recent: BTreeSet<String>,
}

impl AudioLedger {
    pub fn is_playing(&self, name: &str) -> bool {
        self.looping.contains(name) || self.recent.contains(name)
    }

    /// Новый tick: one-shot звуки прошлого tick'а отыграли
    pub fn begin_tick(&mut self) {
        self.recent.clear();
    }

    pub fn apply(&mut self, command: &SoundCommand) {
        match command {
            SoundCommand::Play { name, looped: true, .. } => {
                self.looping.insert(name.clone());
            }
            SoundCommand::Play { name, .. } => {
                self.recent.insert(name.clone());
            }
            SoundCommand::Stop { name } => {
                self.looping.remove(name);
                self.recent.remove(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looped_sound_plays_until_stopped() {
        let mut ledger = AudioLedger::default();
        ledger.apply(&SoundCommand::Play {
            name: "hum".into(),
            position: None,
            looped: true,
        });
        ledger.begin_tick();
        assert!(ledger.is_playing("hum"));

        ledger.apply(&SoundCommand::Stop { name: "hum".into() });
        assert!(!ledger.is_playing("hum"));
    }

    #[test]
    fn test_one_shot_expires_next_tick() {
        let mut ledger = AudioLedger::default();
        ledger.apply(&SoundCommand::Play {
            name: "shot".into(),
            position: Some(Vec2::ZERO),
            looped: false,
        });
        assert!(ledger.is_playing("shot"));

        ledger.begin_tick();
        assert!(!ledger.is_playing("shot"));
    }
}
