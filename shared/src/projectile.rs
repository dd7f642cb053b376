//! Ballistic projectiles: player arrows and magic bolts, and caster bolts.
//!
//! Projectiles fly in a straight line until they overlap a target or expire.
//! Only the local player's own shots and mob bolts can hit anything; replays
//! of peer shots are cosmetic.

use glam::Vec2;
use smol_str::SmolStr;

use crate::combat::CombatClass;
use crate::config::ProjectileConfig;
use crate::registry::{EntityId, EntityRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    Arrow,
    MagicBolt,
    EnemyBolt,
}

impl ProjectileKind {
    /// What a ranged class shoots.
    pub fn for_class(class: CombatClass) -> Self {
        match class {
            CombatClass::Mage => Self::MagicBolt,
            CombatClass::Archer | CombatClass::Warrior => Self::Arrow,
        }
    }

    pub fn effect_name(self) -> &'static str {
        match self {
            Self::Arrow => "arrow",
            Self::MagicBolt => "magic_bolt",
            Self::EnemyBolt => "enemy_bolt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectileOwner {
    /// Fired by the local player; credits kills to them.
    Local,
    /// Visual replay of a peer's shot.
    Peer(SmolStr),
    Mob(EntityId),
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u64,
    pub kind: ProjectileKind,
    pub owner: ProjectileOwner,
    pub origin: Vec2,
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: i32,
    pub expires_at: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectileHit {
    Mob {
        entity: EntityId,
        damage: i32,
        position: Vec2,
        angle: f32,
    },
    Player {
        source: EntityId,
        damage: i32,
        position: Vec2,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ProjectileSet {
    next_id: u64,
    live: Vec<Projectile>,
}

impl ProjectileSet {
    pub fn spawn(
        &mut self,
        kind: ProjectileKind,
        owner: ProjectileOwner,
        origin: Vec2,
        direction: Vec2,
        speed: f32,
        damage: i32,
        expires_at: f64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.push(Projectile {
            id,
            kind,
            owner,
            origin,
            position: origin,
            velocity: direction.normalize_or_zero() * speed,
            damage,
            expires_at,
        });
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Advance every projectile by `dt` and collect the hits of this step.
    ///
    /// Hits are detected against the registry as it is now; the caller applies
    /// damage afterwards, so two shots on one mob in a single step both report.
    pub fn step(
        &mut self,
        dt: f32,
        now: f64,
        mobs: &EntityRegistry,
        player: Option<(Vec2, f32)>,
        config: &ProjectileConfig,
    ) -> Vec<ProjectileHit> {
        let mut hits = Vec::new();

        self.live.retain_mut(|p| {
            p.position += p.velocity * dt;
            if now >= p.expires_at {
                return false;
            }

            match &p.owner {
                ProjectileOwner::Local => {
                    let target = mobs.living().find(|e| {
                        let radius = if e.is_boss() {
                            config.boss_hit_radius
                        } else {
                            config.hit_radius
                        };
                        e.position.distance_squared(p.position) < radius * radius
                    });
                    match target {
                        Some(e) => {
                            hits.push(ProjectileHit::Mob {
                                entity: e.id().clone(),
                                damage: p.damage,
                                position: p.position,
                                angle: p.velocity.x.atan2(p.velocity.y),
                            });
                            false
                        }
                        None => true,
                    }
                }
                ProjectileOwner::Mob(source) => match player {
                    Some((pos, radius)) if pos.distance_squared(p.position) < radius * radius => {
                        hits.push(ProjectileHit::Player {
                            source: source.clone(),
                            damage: p.damage,
                            position: p.position,
                        });
                        false
                    }
                    _ => true,
                },
                ProjectileOwner::Peer(_) => true,
            }
        });

        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RespawnConfig;
    use crate::registry::{MobKind, SpawnDef};

    fn mobs() -> EntityRegistry {
        EntityRegistry::new(
            [
                SpawnDef::new("slime_0", MobKind::Slime, Vec2::new(0.0, 100.0)),
                SpawnDef::new("slime_1", MobKind::Slime, Vec2::new(0.0, 130.0)),
            ],
            RespawnConfig::default(),
        )
    }

    #[test]
    fn arrow_hits_first_mob_only() {
        let cfg = ProjectileConfig::default();
        let reg = mobs();
        let mut set = ProjectileSet::default();
        set.spawn(
            ProjectileKind::Arrow,
            ProjectileOwner::Local,
            Vec2::new(0.0, 10.0),
            Vec2::Y,
            400.0,
            26,
            2.0,
        );

        let mut hits = Vec::new();
        for frame in 1..=30 {
            hits.extend(set.step(1.0 / 60.0, frame as f64 / 60.0, &reg, None, &cfg));
        }
        assert_eq!(hits.len(), 1);
        assert!(matches!(&hits[0], ProjectileHit::Mob { entity, damage: 26, .. } if entity == "slime_0"));
        assert!(set.is_empty());
    }

    #[test]
    fn peer_replays_never_hit() {
        let cfg = ProjectileConfig::default();
        let reg = mobs();
        let mut set = ProjectileSet::default();
        set.spawn(
            ProjectileKind::MagicBolt,
            ProjectileOwner::Peer("bob".into()),
            Vec2::new(0.0, 90.0),
            Vec2::Y,
            300.0,
            0,
            2.5,
        );
        assert!(set.step(0.016, 0.016, &reg, None, &cfg).is_empty());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn projectiles_expire() {
        let cfg = ProjectileConfig::default();
        let reg = EntityRegistry::new([], RespawnConfig::default());
        let mut set = ProjectileSet::default();
        set.spawn(
            ProjectileKind::EnemyBolt,
            ProjectileOwner::Mob("dmage_0".into()),
            Vec2::ZERO,
            Vec2::X,
            160.0,
            12,
            3.0,
        );
        set.step(1.0, 2.9, &reg, Some((Vec2::new(0.0, 500.0), 12.0)), &cfg);
        assert_eq!(set.len(), 1);
        set.step(0.2, 3.1, &reg, Some((Vec2::new(0.0, 500.0), 12.0)), &cfg);
        assert!(set.is_empty());
    }

    #[test]
    fn mob_bolt_hits_player() {
        let cfg = ProjectileConfig::default();
        let reg = EntityRegistry::new([], RespawnConfig::default());
        let mut set = ProjectileSet::default();
        set.spawn(
            ProjectileKind::EnemyBolt,
            ProjectileOwner::Mob("dmage_0".into()),
            Vec2::ZERO,
            Vec2::X,
            160.0,
            12,
            3.0,
        );
        let hits = set.step(0.5, 0.5, &reg, Some((Vec2::new(85.0, 0.0), 12.0)), &cfg);
        assert_eq!(
            hits,
            vec![ProjectileHit::Player {
                source: "dmage_0".into(),
                damage: 12,
                position: Vec2::new(80.0, 0.0),
            }]
        );
    }
}
