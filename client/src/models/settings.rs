use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use skirmish_shared::ConfigError;
use skirmish_shared::combat::CombatClass;
use skirmish_shared::config::CombatConfig;
use skirmish_shared::rng::{CombatRng, seed_from_id};
use smol_str::SmolStr;

pub const SETTINGS_PATH: &str = "assets/settings.ron";

pub fn plugin(app: &mut App) {
    // Tests insert their own settings before adding plugins.
    if !app.world().contains_resource::<Settings>() {
        app.insert_resource(Settings::load());
    }
}

#[derive(Resource, Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    /// Identity on the peer link. Generated when absent.
    pub player_id: Option<SmolStr>,
    pub class: CombatClass,
    /// Roll seed. Derived from the player id when absent.
    pub seed: Option<u64>,
    pub combat: CombatConfig,
}

impl Settings {
    pub fn load() -> Self {
        Self::load_from(SETTINGS_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => match ron::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from '{}'", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse '{}', using defaults: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(SETTINGS_PATH)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = ron::ser::to_string_pretty(self, Default::default())?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn player_id(&self) -> SmolStr {
        self.player_id
            .clone()
            .unwrap_or_else(|| format!("player-{:04x}", rand::random::<u16>()).into())
    }

    pub fn rng_for(&self, player_id: &str) -> CombatRng {
        CombatRng::seeded(self.seed.unwrap_or_else(|| seed_from_id(player_id)))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_id: None,
            class: CombatClass::Warrior,
            seed: None,
            combat: CombatConfig::default(),
        }
    }
}
