use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{KeyValueStore, load_json};

pub const CONFIG_KEY: &str = "config";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub default_minutes: u32,
    pub duration_step_minutes: u32,
    pub duration_choices: u32,
    pub volume: u8,
    pub muted: bool,
    pub sound_enabled: bool,
    pub notifications_enabled: bool,
    pub ambient_sound: Option<PathBuf>,
    pub chime_sound: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_minutes: 25,
            duration_step_minutes: 25,
            duration_choices: 4,
            volume: 50,
            muted: false,
            sound_enabled: true,
            notifications_enabled: true,
            ambient_sound: None,
            chime_sound: None,
        }
    }
}

impl Config {
    /// Falls back to defaults when the stored config is missing or unreadable.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<Config>(store, CONFIG_KEY) {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                warn!("ignoring unreadable config: {e}");
                Self::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.duration_step_minutes = self.duration_step_minutes.max(1);
        self.duration_choices = self.duration_choices.clamp(1, 9);
        self.volume = self.volume.min(100);
        self.default_minutes = self.nearest_choice(self.default_minutes);
        self
    }

    /// Selectable durations in minutes, shortest first.
    pub fn choices(&self) -> Vec<u32> {
        (1..=self.duration_choices)
            .map(|i| i * self.duration_step_minutes)
            .collect()
    }

    fn nearest_choice(&self, minutes: u32) -> u32 {
        self.choices()
            .into_iter()
            .min_by_key(|choice| choice.abs_diff(minutes))
            .unwrap_or(self.duration_step_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn defaults_offer_four_quarter_hour_multiples() {
        let config = Config::default().normalized();
        assert_eq!(config.choices(), vec![25, 50, 75, 100]);
        assert_eq!(config.default_minutes, 25);
    }

    #[test]
    fn partial_config_fills_missing_fields() {
        let store = MemoryStore::new();
        store.set(CONFIG_KEY, r#"{"volume": 80, "muted": true}"#).unwrap();

        let config = Config::load(&store);
        assert_eq!(config.volume, 80);
        assert!(config.muted);
        assert_eq!(config.duration_step_minutes, 25);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let store = MemoryStore::new();
        store.set(CONFIG_KEY, "volume = 80").unwrap();
        assert_eq!(Config::load(&store), Config::default());
    }

    #[test]
    fn normalization_snaps_and_clamps() {
        let config = Config {
            default_minutes: 60,
            duration_step_minutes: 0,
            duration_choices: 0,
            volume: 200,
            ..Config::default()
        }
        .normalized();

        assert_eq!(config.choices(), vec![1]);
        assert_eq!(config.default_minutes, 1);
        assert_eq!(config.volume, 100);

        let snapped = Config {
            default_minutes: 60,
            ..Config::default()
        }
        .normalized();
        assert_eq!(snapped.default_minutes, 50);
    }
}
