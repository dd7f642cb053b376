//! Hit zones, zone selection and dismemberment.
//!
//! Zone choice is a weighted table keyed by swing direction and the zones
//! still attached to the target, sampled with a single roll.

use serde::{Deserialize, Serialize};

use crate::combat::SwingDirection;
use crate::config::ZoneConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitZone {
    Head,
    Torso,
    ArmLeft,
    ArmRight,
    LegLeft,
    LegRight,
}

impl HitZone {
    pub const ALL: [HitZone; 6] = [
        Self::Head,
        Self::Torso,
        Self::ArmLeft,
        Self::ArmRight,
        Self::LegLeft,
        Self::LegRight,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }

    pub fn is_arm(self) -> bool {
        matches!(self, Self::ArmLeft | Self::ArmRight)
    }

    pub fn is_leg(self) -> bool {
        matches!(self, Self::LegLeft | Self::LegRight)
    }

    pub fn multiplier(self, zones: &ZoneConfig) -> f32 {
        match self {
            Self::Head => zones.head_multiplier,
            Self::Torso => zones.torso_multiplier,
            Self::ArmLeft | Self::ArmRight => zones.arm_multiplier,
            Self::LegLeft | Self::LegRight => zones.leg_multiplier,
        }
    }

    /// Text shown over the target when this zone is struck. Torso hits are unlabeled.
    pub fn hit_label(self) -> Option<&'static str> {
        match self {
            Self::Head => Some("HEADSHOT"),
            Self::Torso => None,
            Self::ArmLeft | Self::ArmRight => Some("ARM"),
            Self::LegLeft | Self::LegRight => Some("LEG"),
        }
    }

    pub fn sever_label(self) -> Option<&'static str> {
        match self {
            Self::Head => Some("DECAPITATED"),
            Self::Torso => None,
            Self::ArmLeft | Self::ArmRight => Some("WEAK"),
            Self::LegLeft | Self::LegRight => Some("SLOW"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Torso => "torso",
            Self::ArmLeft => "arm_left",
            Self::ArmRight => "arm_right",
            Self::LegLeft => "leg_left",
            Self::LegRight => "leg_right",
        }
    }
}

/// Small set of zones, one bit per [`HitZone`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ZoneSet(u8);

impl ZoneSet {
    pub const EMPTY: ZoneSet = ZoneSet(0);

    pub const fn of(zones: &[HitZone]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < zones.len() {
            bits |= zones[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub fn contains(self, zone: HitZone) -> bool {
        self.0 & zone.bit() != 0
    }

    pub fn insert(&mut self, zone: HitZone) -> bool {
        let fresh = !self.contains(zone);
        self.0 |= zone.bit();
        fresh
    }

    pub fn without(self, other: ZoneSet) -> ZoneSet {
        ZoneSet(self.0 & !other.0)
    }

    pub fn with(self, zone: HitZone) -> ZoneSet {
        ZoneSet(self.0 | zone.bit())
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = HitZone> {
        HitZone::ALL.into_iter().filter(move |z| self.contains(*z))
    }
}

impl FromIterator<HitZone> for ZoneSet {
    fn from_iter<I: IntoIterator<Item = HitZone>>(iter: I) -> Self {
        let mut set = ZoneSet::EMPTY;
        for zone in iter {
            set.insert(zone);
        }
        set
    }
}

const HEAD_CHANCE: f32 = 0.6;
const ARM_CHANCE: f32 = 0.3;
/// Cumulative upper bound of the leg band on lateral swings.
const LEG_BAND_END: f32 = 0.5;

/// Weighted zone table for a swing against a target with `available` zones.
///
/// Weights sum to one; torso absorbs whatever the other zones don't claim.
pub fn zone_distribution(direction: SwingDirection, available: ZoneSet) -> Vec<(HitZone, f32)> {
    let mut table = Vec::with_capacity(3);
    let mut claimed = 0.0;

    match direction {
        SwingDirection::Thrust => {}
        SwingDirection::Overhead => {
            if available.contains(HitZone::Head) {
                table.push((HitZone::Head, HEAD_CHANCE));
                claimed = HEAD_CHANCE;
            }
        }
        SwingDirection::Right | SwingDirection::Left => {
            // A swing to the right lands on the target's left side.
            let (arm, leg) = if direction == SwingDirection::Right {
                (HitZone::ArmLeft, HitZone::LegLeft)
            } else {
                (HitZone::ArmRight, HitZone::LegRight)
            };
            if available.contains(arm) {
                table.push((arm, ARM_CHANCE));
                claimed = ARM_CHANCE;
            }
            if available.contains(leg) {
                table.push((leg, LEG_BAND_END - claimed));
                claimed = LEG_BAND_END;
            }
        }
    }

    table.push((HitZone::Torso, 1.0 - claimed));
    table
}

/// Sample the zone table with a roll in `[0, 1)`.
pub fn resolve_zone(direction: SwingDirection, available: ZoneSet, roll: f32) -> HitZone {
    let mut upper = 0.0;
    for (zone, weight) in zone_distribution(direction, available) {
        upper += weight;
        if roll < upper {
            return zone;
        }
    }
    HitZone::Torso
}

/// Whether `zone_damage` is heavy enough to sever `zone` from a target with `max_hp`.
pub fn severs(zone: HitZone, zone_damage: i32, max_hp: i32, zones: &ZoneConfig) -> bool {
    zone != HitZone::Torso && zone_damage as f32 > zones.dismember_fraction * max_hp as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const FULL: ZoneSet = ZoneSet::of(&HitZone::ALL);

    #[rstest]
    #[case(SwingDirection::Overhead, 0.59, HitZone::Head)]
    #[case(SwingDirection::Overhead, 0.6, HitZone::Torso)]
    #[case(SwingDirection::Thrust, 0.0, HitZone::Torso)]
    #[case(SwingDirection::Right, 0.1, HitZone::ArmLeft)]
    #[case(SwingDirection::Right, 0.35, HitZone::LegLeft)]
    #[case(SwingDirection::Right, 0.7, HitZone::Torso)]
    #[case(SwingDirection::Left, 0.1, HitZone::ArmRight)]
    #[case(SwingDirection::Left, 0.49, HitZone::LegRight)]
    fn full_anatomy(#[case] dir: SwingDirection, #[case] roll: f32, #[case] zone: HitZone) {
        assert_eq!(resolve_zone(dir, FULL, roll), zone);
    }

    #[test]
    fn missing_head_falls_to_torso() {
        let body = ZoneSet::of(&[HitZone::Torso]);
        assert_eq!(resolve_zone(SwingDirection::Overhead, body, 0.0), HitZone::Torso);
    }

    #[test]
    fn missing_arm_widens_leg_band() {
        let set = FULL.without(ZoneSet::of(&[HitZone::ArmLeft]));
        assert_eq!(resolve_zone(SwingDirection::Right, set, 0.1), HitZone::LegLeft);
        assert_eq!(resolve_zone(SwingDirection::Right, set, 0.5), HitZone::Torso);
    }

    #[rstest]
    #[case(SwingDirection::Overhead)]
    #[case(SwingDirection::Thrust)]
    #[case(SwingDirection::Left)]
    #[case(SwingDirection::Right)]
    fn weights_sum_to_one(#[case] dir: SwingDirection) {
        for available in [FULL, ZoneSet::of(&[HitZone::Torso]), ZoneSet::of(&[HitZone::LegRight])] {
            let total: f32 = zone_distribution(dir, available).iter().map(|(_, w)| w).sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn unavailable_zones_never_roll() {
        let set = ZoneSet::of(&[HitZone::Torso, HitZone::Head]);
        for i in 0..100 {
            let roll = i as f32 / 100.0;
            let zone = resolve_zone(SwingDirection::Right, set, roll);
            assert_eq!(zone, HitZone::Torso);
        }
    }

    #[test]
    fn sever_threshold_is_strict() {
        let cfg = ZoneConfig::default();
        assert!(!severs(HitZone::ArmLeft, 10, 50, &cfg));
        assert!(severs(HitZone::ArmLeft, 11, 50, &cfg));
        assert!(!severs(HitZone::Torso, 1000, 50, &cfg));
    }

    #[test]
    fn zone_set_ops() {
        let mut set = ZoneSet::EMPTY;
        assert!(set.insert(HitZone::Head));
        assert!(!set.insert(HitZone::Head));
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![HitZone::Head]);
        assert!(FULL.without(set).contains(HitZone::Torso));
        assert!(!FULL.without(set).contains(HitZone::Head));
    }
}
