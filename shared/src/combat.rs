//! Shared combat logic: classes, swing classification, combo, cooldown and damage math.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{ComboConfig, SwingConfig};

/// Default combat values, shared by every client instance.
pub mod defaults {
    /// Base attack stat for a fresh character.
    pub const PLAYER_ATTACK: i32 = 10;
    pub const PLAYER_DEFENSE: i32 = 5;
    pub const PLAYER_HEALTH: i32 = 100;

    /// Distance from the attacker to the melee swing point.
    pub const SWING_REACH: f32 = 15.0;
    pub const MELEE_HIT_RADIUS: f32 = 25.0;
    pub const BOSS_MELEE_HIT_RADIUS: f32 = 40.0;

    /// Pointer movement (pixels) below which a click is classified as a thrust.
    pub const THRUST_DEADZONE: f32 = 3.0;

    pub const COMBO_WINDOW_SECS: f64 = 1.2;
    pub const COMBO_MAX_STACKS: u32 = 3;
    pub const COMBO_BONUS_PER_STACK: f32 = 0.15;

    /// Mob attack clock is pushed back by this much on every hit taken.
    pub const STAGGER_SECS: f64 = 0.3;
}

/// Character class of an attacker. Determines melee vs ranged handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatClass {
    #[default]
    Warrior,
    Archer,
    Mage,
}

impl CombatClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warrior => "warrior",
            Self::Archer => "archer",
            Self::Mage => "mage",
        }
    }
}

/// Direction of a swing, derived from pointer motion at the moment of the click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingDirection {
    Left,
    Right,
    Overhead,
    Thrust,
}

impl SwingDirection {
    /// Classify a screen-space pointer delta (`+y` points down the screen).
    ///
    /// Near-zero motion is a thrust, dominant upward motion is an overhead,
    /// everything else is a lateral swing by horizontal sign.
    pub fn classify(pointer_delta: Vec2, deadzone: f32) -> Self {
        let abs_x = pointer_delta.x.abs();
        let abs_y = pointer_delta.y.abs();

        if abs_x < deadzone && abs_y < deadzone {
            return Self::Thrust;
        }
        if abs_y > abs_x && pointer_delta.y < 0.0 {
            return Self::Overhead;
        }
        if pointer_delta.x > 0.0 {
            Self::Right
        } else {
            Self::Left
        }
    }

    pub fn damage_multiplier(self, swing: &SwingConfig) -> f32 {
        match self {
            Self::Overhead => swing.overhead_multiplier,
            Self::Thrust => swing.thrust_multiplier,
            Self::Left | Self::Right => swing.lateral_multiplier,
        }
    }

    pub fn knockback(self, swing: &SwingConfig) -> f32 {
        match self {
            Self::Overhead => swing.overhead_knockback,
            Self::Thrust => swing.thrust_knockback,
            Self::Left | Self::Right => swing.lateral_knockback,
        }
    }
}

/// Consecutive-attack counter. Grows while attacks land inside the combo
/// window and falls back to zero once the window is missed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComboTracker {
    pub stacks: u32,
    pub last_swing_at: Option<f64>,
}

impl ComboTracker {
    /// Record a swing at `now` and return the resulting stack count.
    pub fn register(&mut self, now: f64, combo: &ComboConfig) -> u32 {
        let chained = self
            .last_swing_at
            .is_some_and(|last| now - last < combo.window_secs);

        self.stacks = if chained {
            (self.stacks + 1).min(combo.max_stacks)
        } else {
            0
        };
        self.last_swing_at = Some(now);
        self.stacks
    }

    pub fn multiplier(&self, combo: &ComboConfig) -> f32 {
        1.0 + self.stacks as f32 * combo.bonus_per_stack
    }

    pub fn is_maxed(&self, combo: &ComboConfig) -> bool {
        self.stacks >= combo.max_stacks
    }
}

/// Check if enough time has passed since the last attack.
pub fn can_attack(last_attack_at: Option<f64>, now: f64, cooldown_secs: f64) -> bool {
    last_attack_at.is_none_or(|last| now - last >= cooldown_secs)
}

/// Attack stat plus class bonus, scaled by the swing direction.
pub fn directional_damage(attack: i32, class_bonus: i32, direction_multiplier: f32) -> i32 {
    ((attack + class_bonus) as f32 * direction_multiplier).round() as i32
}

pub fn scale_damage(damage: i32, multiplier: f32) -> i32 {
    (damage as f32 * multiplier).round() as i32
}

/// Unit vector on the ground plane for a facing angle.
///
/// Angles follow the `atan2(dx, dy)` convention: `0` faces `+y`.
pub fn forward(angle: f32) -> Vec2 {
    Vec2::new(angle.sin(), angle.cos())
}

/// Facing angle from `from` towards `to`.
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.x.atan2(delta.y)
}

/// Point in front of the attacker where a melee swing connects.
pub fn swing_point(origin: Vec2, angle: f32, reach: f32) -> Vec2 {
    origin + forward(angle) * reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Vec2::ZERO, SwingDirection::Thrust)]
    #[case(Vec2::new(2.0, -2.0), SwingDirection::Thrust)]
    #[case(Vec2::new(1.0, -12.0), SwingDirection::Overhead)]
    #[case(Vec2::new(1.0, 12.0), SwingDirection::Right)]
    #[case(Vec2::new(9.0, 4.0), SwingDirection::Right)]
    #[case(Vec2::new(-9.0, -4.0), SwingDirection::Left)]
    #[case(Vec2::new(-1.0, 12.0), SwingDirection::Left)]
    fn classifies_pointer_motion(#[case] delta: Vec2, #[case] expected: SwingDirection) {
        assert_eq!(
            SwingDirection::classify(delta, defaults::THRUST_DEADZONE),
            expected
        );
    }

    #[test]
    fn combo_increments_inside_window_and_caps() {
        let cfg = ComboConfig::default();
        let mut combo = ComboTracker::default();

        assert_eq!(combo.register(0.0, &cfg), 0);
        assert_eq!(combo.register(0.5, &cfg), 1);
        assert_eq!(combo.register(1.0, &cfg), 2);
        assert_eq!(combo.register(1.5, &cfg), 3);
        assert_eq!(combo.register(2.0, &cfg), 3);
        assert!(combo.is_maxed(&cfg));
        assert_relative_eq!(combo.multiplier(&cfg), 1.45);
    }

    #[test]
    fn combo_resets_after_window() {
        let cfg = ComboConfig::default();
        let mut combo = ComboTracker::default();

        combo.register(0.0, &cfg);
        combo.register(1.0, &cfg);
        assert_eq!(combo.stacks, 1);
        assert_eq!(combo.register(2.3, &cfg), 0);
        assert_relative_eq!(combo.multiplier(&cfg), 1.0);
    }

    #[rstest]
    #[case(None, 0.0, true)]
    #[case(Some(1.0), 1.2, false)]
    #[case(Some(1.0), 1.45, true)]
    fn cooldown_gate(#[case] last: Option<f64>, #[case] now: f64, #[case] ready: bool) {
        assert_eq!(can_attack(last, now, 0.45), ready);
    }

    #[test]
    fn directional_damage_rounds() {
        // (10 + 20) * 1.5
        assert_eq!(directional_damage(10, 20, 1.5), 45);
        // (10 + 16) * 1.3 = 33.8
        assert_eq!(directional_damage(10, 16, 1.3), 34);
        assert_eq!(scale_damage(45, 1.15), 52);
    }

    #[test]
    fn angle_and_forward_agree() {
        let from = Vec2::new(10.0, 10.0);
        let to = Vec2::new(20.0, 10.0);
        let angle = angle_to(from, to);
        let dir = forward(angle);
        assert_relative_eq!(dir.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(dir.y, 0.0, epsilon = 1e-5);

        let p = swing_point(from, angle, defaults::SWING_REACH);
        assert_relative_eq!(p.x, 25.0, epsilon = 1e-4);
    }
}
