//! Local player state as seen by the combat core, and kill rewards.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::combat::{CombatClass, ComboTracker, defaults};
use crate::config::CombatConfig;
use crate::registry::{DeathReport, EntityId};
use crate::rng::CombatRng;

/// Items a mob can drop.
pub const LOOT_TABLE: [&str; 5] = [
    "health_potion",
    "big_health_potion",
    "mushroom_item",
    "gold_ring",
    "iron_sword",
];
pub const LOOT_CHANCE: f32 = 0.4;
pub const BOSS_LOOT_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub attack: i32,
    pub defense: i32,
    pub speed: f32,
    pub hp: i32,
    pub max_hp: i32,
}

impl PlayerStats {
    pub fn for_class(class: CombatClass, config: &CombatConfig) -> Self {
        Self {
            attack: defaults::PLAYER_ATTACK,
            defense: defaults::PLAYER_DEFENSE,
            speed: config.class(class).move_speed,
            hp: defaults::PLAYER_HEALTH,
            max_hp: defaults::PLAYER_HEALTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: SmolStr,
    pub class: CombatClass,
    pub position: Vec2,
    pub angle: f32,
    pub stats: PlayerStats,
    pub blocking: bool,
    pub last_attack_at: Option<f64>,
    pub combo: ComboTracker,
}

impl PlayerState {
    pub fn new(id: impl Into<SmolStr>, class: CombatClass, position: Vec2, config: &CombatConfig) -> Self {
        Self {
            id: id.into(),
            class,
            position,
            angle: 0.0,
            stats: PlayerStats::for_class(class, config),
            blocking: false,
            last_attack_at: None,
            combo: ComboTracker::default(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.stats.hp <= 0
    }

    /// Subtract `amount`, clamping at zero. Returns true when this hit was fatal.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if amount <= 0 || self.is_dead() {
            return false;
        }
        self.stats.hp = (self.stats.hp - amount).max(0);
        self.stats.hp == 0
    }

    /// Restore full HP at `spawn`. Local only, never broadcast.
    pub fn respawn(&mut self, spawn: Vec2) {
        self.stats.hp = self.stats.max_hp;
        self.position = spawn;
        self.blocking = false;
        self.combo = ComboTracker::default();
    }
}

/// XP and loot earned for a locally caused kill, handed to the account layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub entity: EntityId,
    pub xp: u32,
    pub loot: Vec<SmolStr>,
    pub boss: bool,
}

impl Reward {
    pub fn for_kill(death: &DeathReport, rng: &mut CombatRng) -> Self {
        Self {
            entity: death.id.clone(),
            xp: death.xp,
            loot: roll_loot(death.is_boss, rng),
            boss: death.is_boss,
        }
    }
}

pub fn roll_loot(is_boss: bool, rng: &mut CombatRng) -> Vec<SmolStr> {
    let count = if is_boss {
        BOSS_LOOT_COUNT
    } else if rng.chance(LOOT_CHANCE) {
        1
    } else {
        0
    };
    (0..count)
        .filter_map(|_| rng.pick(&LOOT_TABLE).map(|item| SmolStr::new_static(*item)))
        .collect()
}
