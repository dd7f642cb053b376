//! Short-lived rigid bodies for ragdolls and severed limbs.
//!
//! Debris never refers back to the entity it came from: it only knows where
//! it spawned and how it was thrown, so respawning a mob never has to clean
//! anything up here. Positions are world-space with `y` up; the ground plane
//! coordinate `(x, y)` maps to `(x, z)`.

use glam::{Vec2, Vec3};

use crate::combat::forward;
use crate::config::DebrisConfig;
use crate::rng::CombatRng;
use crate::zones::{HitZone, ZoneSet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebrisShape {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

impl DebrisShape {
    fn scaled(self, scale: f32) -> Self {
        match self {
            Self::Sphere { radius } => Self::Sphere {
                radius: radius * scale,
            },
            Self::Cuboid { half_extents } => Self::Cuboid {
                half_extents: half_extents * scale,
            },
        }
    }
}

/// What the piece depicts, for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebrisKind {
    Segment(HitZone),
    Limb(HitZone),
    Weapon,
}

/// A body to hand to the physics engine. The core decides what flies and
/// how hard; the host simulates it.
#[derive(Debug, Clone)]
pub struct DebrisPart {
    pub id: u64,
    pub kind: DebrisKind,
    pub shape: DebrisShape,
    pub mass: f32,
    pub position: Vec3,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub spawned_at: f64,
}

/// How a ragdoll is thrown.
#[derive(Debug, Clone, Copy)]
pub struct Throw {
    pub origin: Vec2,
    pub angle: f32,
    pub overhead: bool,
    pub is_boss: bool,
}

struct Segment {
    zone: HitZone,
    shape: DebrisShape,
    mass: f32,
    offset: Vec3,
}

fn segment(zone: HitZone) -> Segment {
    let (shape, mass, offset) = match zone {
        HitZone::Torso => (
            DebrisShape::Cuboid {
                half_extents: Vec3::new(3.0, 4.0, 3.0),
            },
            5.0,
            Vec3::new(0.0, 8.0, 0.0),
        ),
        HitZone::Head => (
            DebrisShape::Sphere { radius: 2.5 },
            2.0,
            Vec3::new(0.0, 16.0, 0.0),
        ),
        HitZone::ArmLeft | HitZone::ArmRight => (
            DebrisShape::Cuboid {
                half_extents: Vec3::new(1.0, 3.0, 1.0),
            },
            1.0,
            Vec3::new(if zone == HitZone::ArmLeft { -4.0 } else { 4.0 }, 10.0, 0.0),
        ),
        HitZone::LegLeft | HitZone::LegRight => (
            DebrisShape::Cuboid {
                half_extents: Vec3::new(1.1, 3.5, 1.1),
            },
            1.5,
            Vec3::new(if zone == HitZone::LegLeft { -1.5 } else { 1.5 }, 3.0, 0.0),
        ),
    };
    Segment {
        zone,
        shape,
        mass,
        offset,
    }
}

const BOSS_SCALE: f32 = 2.0;
const LIMB_RADIUS: f32 = 2.0;
const LIMB_MASS: f32 = 1.5;
const LIMB_ANGULAR_DAMPING: f32 = 0.4;

/// Queue of bodies waiting to be spawned by the host.
#[derive(Debug, Clone)]
pub struct DebrisSpawner {
    pending: Vec<DebrisPart>,
    next_id: u64,
    config: DebrisConfig,
}

impl DebrisSpawner {
    pub fn new(config: DebrisConfig) -> Self {
        Self {
            pending: Vec::new(),
            next_id: 0,
            config,
        }
    }

    pub fn pending(&self) -> &[DebrisPart] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain(&mut self) -> Vec<DebrisPart> {
        std::mem::take(&mut self.pending)
    }

    fn push(&mut self, mut part: DebrisPart) -> u64 {
        part.id = self.next_id;
        self.next_id += 1;
        let id = part.id;
        self.pending.push(part);
        id
    }

    /// One body per remaining segment, all thrown along the killing angle.
    pub fn spawn_ragdoll(
        &mut self,
        throw: Throw,
        segments: ZoneSet,
        now: f64,
        rng: &mut CombatRng,
    ) -> Vec<u64> {
        let scale = if throw.is_boss { BOSS_SCALE } else { 1.0 };
        let impulse = if throw.is_boss {
            self.config.boss_ragdoll_impulse
        } else {
            self.config.ragdoll_impulse
        };
        let up = if throw.overhead {
            impulse * 1.5
        } else {
            impulse * 0.5
        };
        let dir = forward(throw.angle);
        let base = Vec3::new(throw.origin.x, 0.0, throw.origin.y);

        let mut ids = Vec::new();
        for zone in segments.with(HitZone::Torso).iter() {
            let seg = segment(zone);
            let jitter = Vec3::new(rng.spread(1.5), 0.0, rng.spread(1.5));
            let part = DebrisPart {
                id: 0,
                kind: DebrisKind::Segment(seg.zone),
                shape: seg.shape.scaled(scale),
                mass: seg.mass * scale,
                position: base + seg.offset * scale + jitter,
                linear_velocity: Vec3::new(
                    dir.x * impulse + rng.spread(10.0),
                    up + rng.roll() * 20.0,
                    dir.y * impulse + rng.spread(10.0),
                ),
                angular_velocity: Vec3::new(rng.spread(7.5), rng.spread(7.5), rng.spread(7.5)),
                linear_damping: self.config.linear_damping,
                angular_damping: self.config.angular_damping,
                spawned_at: now,
            };
            ids.push(self.push(part));
        }
        ids
    }

    /// A single severed zone flying off the body.
    pub fn spawn_limb(
        &mut self,
        zone: HitZone,
        throw: Throw,
        now: f64,
        rng: &mut CombatRng,
    ) -> u64 {
        let height = segment(zone).offset.y;
        self.spawn_detached(DebrisKind::Limb(zone), height, throw, now, rng)
    }

    /// The weapon prop dropped by a severed weapon arm.
    pub fn spawn_weapon(&mut self, throw: Throw, now: f64, rng: &mut CombatRng) -> u64 {
        let height = segment(HitZone::ArmRight).offset.y;
        self.spawn_detached(DebrisKind::Weapon, height, throw, now, rng)
    }

    fn spawn_detached(
        &mut self,
        kind: DebrisKind,
        height: f32,
        throw: Throw,
        now: f64,
        rng: &mut CombatRng,
    ) -> u64 {
        let force = self.config.limb_impulse;
        let up = if throw.overhead { 40.0 } else { 15.0 };
        let dir = forward(throw.angle);
        let shape = match kind {
            DebrisKind::Weapon => DebrisShape::Cuboid {
                half_extents: Vec3::new(0.3, 4.0, 0.3),
            },
            _ => DebrisShape::Sphere {
                radius: LIMB_RADIUS,
            },
        };
        self.push(DebrisPart {
            id: 0,
            kind,
            shape,
            mass: LIMB_MASS,
            position: Vec3::new(throw.origin.x, height, throw.origin.y),
            linear_velocity: Vec3::new(
                dir.x * force + rng.spread(7.5),
                up + rng.roll() * 10.0,
                dir.y * force + rng.spread(7.5),
            ),
            angular_velocity: Vec3::new(rng.spread(10.0), rng.spread(10.0), rng.spread(10.0)),
            linear_damping: self.config.linear_damping,
            angular_damping: LIMB_ANGULAR_DAMPING,
            spawned_at: now,
        })
    }
}

/// Render opacity at `age` seconds: solid until the fade starts, then linear
/// down to zero at the end of the lifetime.
pub fn fade_opacity(age: f64, config: &DebrisConfig) -> f32 {
    let fade = config.fade_start_secs;
    let span = (config.lifetime_secs - fade).max(f64::EPSILON);
    (1.0 - ((age - fade) / span).clamp(0.0, 1.0)) as f32
}

pub fn is_expired(age: f64, config: &DebrisConfig) -> bool {
    age >= config.lifetime_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn throw(overhead: bool, is_boss: bool) -> Throw {
        Throw {
            origin: Vec2::new(100.0, 200.0),
            angle: 0.0,
            overhead,
            is_boss,
        }
    }

    #[test]
    fn ragdoll_skips_severed_segments() {
        let mut sim = DebrisSpawner::new(DebrisConfig::default());
        let mut rng = CombatRng::seeded(5);
        let anatomy = ZoneSet::of(&HitZone::ALL);
        let severed = ZoneSet::of(&[HitZone::Head, HitZone::ArmRight]);

        let ids = sim.spawn_ragdoll(throw(false, false), anatomy.without(severed), 0.0, &mut rng);
        assert_eq!(ids.len(), 4);
        assert!(
            sim.pending()
                .iter()
                .all(|p| !matches!(p.kind, DebrisKind::Segment(HitZone::Head | HitZone::ArmRight)))
        );
    }

    #[test]
    fn torso_always_present_and_boss_scaled() {
        let mut sim = DebrisSpawner::new(DebrisConfig::default());
        let mut rng = CombatRng::seeded(5);
        sim.spawn_ragdoll(throw(false, true), ZoneSet::EMPTY, 0.0, &mut rng);
        assert_eq!(sim.len(), 1);
        let torso = &sim.pending()[0];
        assert_eq!(
            torso.shape,
            DebrisShape::Cuboid {
                half_extents: Vec3::new(6.0, 8.0, 6.0)
            }
        );
        assert_relative_eq!(torso.position.y, 16.0);
        // Thrown forward along +z at boss impulse, give or take the spread.
        assert!(torso.linear_velocity.z >= 69.0);
    }

    #[test]
    fn overhead_throws_higher() {
        let mut rng = CombatRng::seeded(9);
        let mut sim = DebrisSpawner::new(DebrisConfig::default());
        sim.spawn_ragdoll(throw(true, false), ZoneSet::EMPTY, 0.0, &mut rng);
        sim.spawn_ragdoll(throw(false, false), ZoneSet::EMPTY, 0.0, &mut rng);
        let high = sim.pending()[0].linear_velocity.y;
        let low = sim.pending()[1].linear_velocity.y;
        assert!(high >= 60.0);
        assert!(low < 40.0);
    }

    #[test]
    fn detached_parts_fly_off() {
        let mut spawner = DebrisSpawner::new(DebrisConfig::default());
        let mut rng = CombatRng::seeded(2);
        let limb = spawner.spawn_limb(HitZone::LegLeft, throw(false, false), 1.0, &mut rng);
        let weapon = spawner.spawn_weapon(throw(true, false), 1.0, &mut rng);
        assert_ne!(limb, weapon);

        let parts = spawner.drain();
        assert!(spawner.is_empty());
        assert_eq!(parts[0].kind, DebrisKind::Limb(HitZone::LegLeft));
        assert_eq!(parts[1].kind, DebrisKind::Weapon);
        assert!(parts.iter().all(|p| p.spawned_at == 1.0 && p.linear_velocity.z > 0.0));
        assert!(parts[1].linear_velocity.y >= 40.0);
    }

    #[test]
    fn fades_then_expires() {
        let config = DebrisConfig::default();
        assert_relative_eq!(fade_opacity(2.9, &config), 1.0);
        assert_relative_eq!(fade_opacity(4.0, &config), 0.5);
        assert_relative_eq!(fade_opacity(6.0, &config), 0.0);
        assert!(!is_expired(4.9, &config));
        assert!(is_expired(5.0, &config));
    }
}
