//! Tunable combat parameters.
//!
//! Every section has a `Default` matching the shipped game balance, and every
//! field is `#[serde(default)]` so a RON file only needs to list overrides.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::{CombatClass, defaults};
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub classes: ClassTable,
    pub swing: SwingConfig,
    pub combo: ComboConfig,
    pub zones: ZoneConfig,
    pub respawn: RespawnConfig,
    pub ai: AiConfig,
    pub projectile: ProjectileConfig,
    pub debris: DebrisConfig,
    pub player: PlayerConfig,
    pub sync: SyncConfig,
}

impl CombatConfig {
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, Default::default())?)
    }

    pub fn class(&self, class: CombatClass) -> &ClassProfile {
        match class {
            CombatClass::Warrior => &self.classes.warrior,
            CombatClass::Archer => &self.classes.archer,
            CombatClass::Mage => &self.classes.mage,
        }
    }
}

/// How a class delivers its attacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackKind {
    Melee,
    Ranged { speed: f32, lifetime_secs: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassProfile {
    pub cooldown_secs: f64,
    pub damage_bonus: i32,
    pub move_speed: f32,
    pub attack: AttackKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassTable {
    pub warrior: ClassProfile,
    pub archer: ClassProfile,
    pub mage: ClassProfile,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self {
            warrior: ClassProfile {
                cooldown_secs: 0.45,
                damage_bonus: 20,
                move_speed: 120.0,
                attack: AttackKind::Melee,
            },
            archer: ClassProfile {
                cooldown_secs: 0.65,
                damage_bonus: 16,
                move_speed: 170.0,
                attack: AttackKind::Ranged {
                    speed: 400.0,
                    lifetime_secs: 2.0,
                },
            },
            mage: ClassProfile {
                cooldown_secs: 0.9,
                damage_bonus: 28,
                move_speed: 140.0,
                attack: AttackKind::Ranged {
                    speed: 300.0,
                    lifetime_secs: 2.5,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingConfig {
    pub overhead_multiplier: f32,
    pub thrust_multiplier: f32,
    pub lateral_multiplier: f32,
    pub overhead_knockback: f32,
    pub thrust_knockback: f32,
    pub lateral_knockback: f32,
    pub reach: f32,
    pub hit_radius: f32,
    pub boss_hit_radius: f32,
    pub thrust_deadzone: f32,
    pub stagger_secs: f64,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            overhead_multiplier: 1.5,
            thrust_multiplier: 1.3,
            lateral_multiplier: 1.0,
            overhead_knockback: 8.0,
            thrust_knockback: 12.0,
            lateral_knockback: 6.0,
            reach: defaults::SWING_REACH,
            hit_radius: defaults::MELEE_HIT_RADIUS,
            boss_hit_radius: defaults::BOSS_MELEE_HIT_RADIUS,
            thrust_deadzone: defaults::THRUST_DEADZONE,
            stagger_secs: defaults::STAGGER_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    pub window_secs: f64,
    pub max_stacks: u32,
    pub bonus_per_stack: f32,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            window_secs: defaults::COMBO_WINDOW_SECS,
            max_stacks: defaults::COMBO_MAX_STACKS,
            bonus_per_stack: defaults::COMBO_BONUS_PER_STACK,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub head_multiplier: f32,
    pub torso_multiplier: f32,
    pub arm_multiplier: f32,
    pub leg_multiplier: f32,
    /// Zone damage above this fraction of max HP severs the zone.
    pub dismember_fraction: f32,
    pub debuff_secs: f64,
    pub leg_speed_factor: f32,
    pub arm_attack_factor: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            head_multiplier: 3.0,
            torso_multiplier: 1.0,
            arm_multiplier: 0.5,
            leg_multiplier: 0.7,
            dismember_fraction: 0.2,
            debuff_secs: 5.0,
            leg_speed_factor: 0.3,
            arm_attack_factor: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnConfig {
    pub mob_delay_secs: f64,
    pub boss_delay_secs: f64,
    /// Peer hits arriving this soon after a local respawn belong to the previous life.
    pub peer_hit_grace_secs: f64,
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            mob_delay_secs: 15.0,
            boss_delay_secs: 60.0,
            peer_hit_grace_secs: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub melee_range: f32,
    pub boss_melee_range: f32,
    pub melee_cooldown_secs: f64,
    pub ranged_min: f32,
    pub ranged_max: f32,
    pub ranged_cooldown_secs: f64,
    pub bolt_speed: f32,
    pub boss_bolt_speed: f32,
    pub bolt_lifetime_secs: f64,
    pub bolt_hit_radius: f32,
    pub bolt_damage_penalty: i32,
    pub wander_speed_factor: f32,
    pub wander_min_secs: f64,
    pub wander_max_secs: f64,
    pub wander_pause_chance: f32,
    pub block_factor: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            melee_range: 20.0,
            boss_melee_range: 40.0,
            melee_cooldown_secs: 1.2,
            ranged_min: 80.0,
            ranged_max: 300.0,
            ranged_cooldown_secs: 1.8,
            bolt_speed: 160.0,
            boss_bolt_speed: 240.0,
            bolt_lifetime_secs: 3.0,
            bolt_hit_radius: 12.0,
            bolt_damage_penalty: 3,
            wander_speed_factor: 0.3,
            wander_min_secs: 2.0,
            wander_max_secs: 5.0,
            wander_pause_chance: 0.25,
            block_factor: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Projectiles spawn this far in front of the shooter.
    pub spawn_offset: f32,
    pub hit_radius: f32,
    pub boss_hit_radius: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            spawn_offset: 10.0,
            hit_radius: 15.0,
            boss_hit_radius: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebrisConfig {
    pub gravity: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    pub friction: f32,
    pub fade_start_secs: f64,
    pub lifetime_secs: f64,
    pub ragdoll_impulse: f32,
    pub boss_ragdoll_impulse: f32,
    pub limb_impulse: f32,
}

impl Default for DebrisConfig {
    fn default() -> Self {
        Self {
            gravity: -60.0,
            linear_damping: 0.3,
            angular_damping: 0.3,
            restitution: 0.4,
            friction: 0.45,
            fade_start_secs: 3.0,
            lifetime_secs: 5.0,
            ragdoll_impulse: 40.0,
            boss_ragdoll_impulse: 80.0,
            limb_impulse: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub safe_spawn: Vec2,
    pub map_size: f32,
    pub body_radius: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            safe_spawn: Vec2::new(1500.0, 1500.0),
            map_size: 3000.0,
            body_radius: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub state_interval_secs: f32,
    pub peer_timeout_secs: f64,
    /// Fraction of the gap closed toward a peer's reported position per update.
    pub peer_smoothing: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            state_interval_secs: 0.5,
            peer_timeout_secs: 10.0,
            peer_smoothing: 0.1,
        }
    }
}
