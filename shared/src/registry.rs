//! Hostile entity registry.
//!
//! Owns every mob, its fixed spawn definition and the respawn queue. All HP
//! changes go through [`EntityRegistry::apply_damage`] or
//! [`EntityRegistry::force_kill`], which share one death transition gated on
//! the `alive` flag.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};
use tracing::{debug, info};

use crate::ai::AiState;
use crate::config::{RespawnConfig, ZoneConfig};
use crate::geometry::WorldGeometry;
use crate::zones::{HitZone, ZoneSet};

pub type EntityId = SmolStr;

/// How long a struck mob renders tinted.
pub const FLASH_SECS: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MobKind {
    Slime,
    Skeleton,
    Wolf,
    DarkMage,
    Dragon,
    Kraken,
}

impl MobKind {
    /// Zones that can be struck. Torso is always present.
    pub fn anatomy(self) -> ZoneSet {
        use HitZone::*;
        match self {
            Self::Slime | Self::Kraken => ZoneSet::of(&[Torso]),
            Self::Skeleton => ZoneSet::of(&[Torso, Head, ArmLeft, ArmRight, LegLeft, LegRight]),
            Self::Wolf | Self::Dragon => ZoneSet::of(&[Torso, Head]),
            Self::DarkMage => ZoneSet::of(&[Torso, Head, ArmRight]),
        }
    }

    /// The arm holding a detachable weapon prop, if any.
    pub fn weapon_arm(self) -> Option<HitZone> {
        match self {
            Self::Skeleton | Self::DarkMage => Some(HitZone::ArmRight),
            _ => None,
        }
    }

    pub fn is_caster(self) -> bool {
        matches!(self, Self::DarkMage | Self::Kraken)
    }

    pub fn is_boss(self) -> bool {
        matches!(self, Self::Dragon | Self::Kraken)
    }

    pub fn stats(self) -> MobStats {
        let (max_hp, attack, speed, xp, detect_radius) = match self {
            Self::Slime => (30, 5, 30.0, 15, 150.0),
            Self::Skeleton => (50, 10, 40.0, 25, 200.0),
            Self::Wolf => (35, 12, 60.0, 20, 220.0),
            Self::DarkMage => (70, 15, 35.0, 35, 250.0),
            Self::Dragon => (1000, 30, 50.0, 500, 350.0),
            Self::Kraken => (800, 25, 30.0, 400, 300.0),
        };
        MobStats {
            max_hp,
            attack,
            speed,
            xp,
            detect_radius,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slime => "slime",
            Self::Skeleton => "skeleton",
            Self::Wolf => "wolf",
            Self::DarkMage => "darkmage",
            Self::Dragon => "dragon",
            Self::Kraken => "kraken",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MobStats {
    pub max_hp: i32,
    pub attack: i32,
    pub speed: f32,
    pub xp: u32,
    pub detect_radius: f32,
}

/// Immutable spawn record. A respawn restores the entity from this exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnDef {
    pub id: EntityId,
    pub kind: MobKind,
    pub position: Vec2,
    pub stats: MobStats,
}

impl SpawnDef {
    pub fn new(id: impl Into<EntityId>, kind: MobKind, position: Vec2) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            stats: kind.stats(),
        }
    }

    pub fn is_boss(&self) -> bool {
        self.kind.is_boss()
    }
}

const SLIME_SPAWNS: [(f32, f32); 10] = [
    (200., 200.),
    (400., 180.),
    (600., 350.),
    (250., 500.),
    (450., 650.),
    (700., 500.),
    (350., 800.),
    (150., 700.),
    (550., 150.),
    (780., 300.),
];
const SKELETON_SPAWNS: [(f32, f32); 8] = [
    (2200., 200.),
    (2400., 350.),
    (2600., 200.),
    (2300., 500.),
    (2500., 600.),
    (2700., 400.),
    (2800., 250.),
    (2150., 650.),
];
const WOLF_SPAWNS: [(f32, f32); 8] = [
    (200., 2200.),
    (400., 2350.),
    (600., 2500.),
    (300., 2600.),
    (500., 2750.),
    (700., 2400.),
    (150., 2500.),
    (750., 2650.),
];
const DARK_MAGE_SPAWNS: [(f32, f32); 5] = [
    (2150., 2150.),
    (2350., 2200.),
    (2700., 2300.),
    (2200., 2650.),
    (2650., 2700.),
];

/// The world's fixed mob roster, two bosses included.
pub fn spawn_table() -> Vec<SpawnDef> {
    let groups: [(&str, MobKind, &[(f32, f32)]); 4] = [
        ("slime", MobKind::Slime, &SLIME_SPAWNS),
        ("skel", MobKind::Skeleton, &SKELETON_SPAWNS),
        ("wolf", MobKind::Wolf, &WOLF_SPAWNS),
        ("dmage", MobKind::DarkMage, &DARK_MAGE_SPAWNS),
    ];

    let mut defs = Vec::with_capacity(33);
    for (prefix, kind, spots) in groups {
        for (i, &(x, y)) in spots.iter().enumerate() {
            defs.push(SpawnDef::new(
                format_smolstr!("{prefix}_{i}"),
                kind,
                Vec2::new(x, y),
            ));
        }
    }
    defs.push(SpawnDef::new("boss_dragon", MobKind::Dragon, Vec2::new(2500., 400.)));
    defs.push(SpawnDef::new("boss_kraken", MobKind::Kraken, Vec2::new(2500., 2500.)));
    defs
}

/// Who dealt a hit. Rewards only follow [`HitSource::Local`] kills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    Local,
    Peer,
}

#[derive(Debug, Clone)]
pub struct HostileEntity {
    pub def: SpawnDef,
    pub position: Vec2,
    pub angle: f32,
    pub hp: i32,
    pub alive: bool,
    pub dismembered: ZoneSet,
    pub weapon_attached: bool,
    pub leg_debuff_until: Option<f64>,
    pub arm_debuff_until: Option<f64>,
    pub flash_until: Option<f64>,
    /// Clock for melee and bolt cooldowns. Pushed into the future by staggers.
    pub last_attack_at: Option<f64>,
    pub respawned_at: Option<f64>,
    pub state: AiState,
    pub wander_heading: Option<f32>,
    pub next_wander_at: f64,
}

impl HostileEntity {
    pub fn spawn(def: SpawnDef) -> Self {
        Self {
            position: def.position,
            angle: 0.0,
            hp: def.stats.max_hp,
            alive: true,
            dismembered: ZoneSet::EMPTY,
            weapon_attached: def.kind.weapon_arm().is_some(),
            leg_debuff_until: None,
            arm_debuff_until: None,
            flash_until: None,
            last_attack_at: None,
            respawned_at: None,
            state: AiState::Wander,
            wander_heading: None,
            next_wander_at: 0.0,
            def,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.def.id
    }

    pub fn kind(&self) -> MobKind {
        self.def.kind
    }

    pub fn max_hp(&self) -> i32 {
        self.def.stats.max_hp
    }

    pub fn is_boss(&self) -> bool {
        self.def.is_boss()
    }

    /// Zones that can still be struck this life.
    pub fn available_zones(&self) -> ZoneSet {
        self.def.kind.anatomy().without(self.dismembered)
    }

    pub fn is_leg_slowed(&self, now: f64) -> bool {
        self.leg_debuff_until.is_some_and(|until| now < until)
    }

    pub fn is_arm_weakened(&self, now: f64) -> bool {
        self.arm_debuff_until.is_some_and(|until| now < until)
    }

    pub fn is_flashing(&self, now: f64) -> bool {
        self.flash_until.is_some_and(|until| now < until)
    }

    pub fn move_speed(&self, now: f64, zones: &ZoneConfig) -> f32 {
        let base = self.def.stats.speed;
        if self.is_leg_slowed(now) {
            base * zones.leg_speed_factor
        } else {
            base
        }
    }

    pub fn attack_factor(&self, now: f64, zones: &ZoneConfig) -> f32 {
        if self.is_arm_weakened(now) {
            zones.arm_attack_factor
        } else {
            1.0
        }
    }

    fn reset(&mut self, now: f64) {
        let def = self.def.clone();
        *self = Self::spawn(def);
        self.respawned_at = Some(now);
        self.next_wander_at = now;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeathReport {
    pub id: EntityId,
    pub kind: MobKind,
    pub position: Vec2,
    pub is_boss: bool,
    pub xp: u32,
    pub source: HitSource,
    pub respawn_at: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DamageOutcome {
    /// Unknown id, dead target or non-positive amount. Nothing changed.
    Ignored,
    Damaged { hp: i32 },
    Killed(DeathReport),
}

impl DamageOutcome {
    pub fn death(&self) -> Option<&DeathReport> {
        match self {
            Self::Killed(report) => Some(report),
            _ => None,
        }
    }
}

/// Result of severing a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Severed {
    pub zone: HitZone,
    pub weapon_dropped: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct PendingRespawn {
    id: EntityId,
    at: f64,
}

#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entities: Vec<HostileEntity>,
    index: HashMap<EntityId, usize>,
    respawns: Vec<PendingRespawn>,
    config: RespawnConfig,
}

impl EntityRegistry {
    /// Build from spawn definitions. Later duplicates of an id are dropped.
    pub fn new(defs: impl IntoIterator<Item = SpawnDef>, config: RespawnConfig) -> Self {
        let mut entities = Vec::new();
        let mut index = HashMap::new();
        for def in defs {
            if index.contains_key(&def.id) {
                debug!("Duplicate spawn id {}, skipping", def.id);
                continue;
            }
            index.insert(def.id.clone(), entities.len());
            entities.push(HostileEntity::spawn(def));
        }
        Self {
            entities,
            index,
            respawns: Vec::new(),
            config,
        }
    }

    pub fn get(&self, id: &str) -> Option<&HostileEntity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut HostileEntity> {
        self.index.get(id).map(|&i| &mut self.entities[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostileEntity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut HostileEntity> {
        self.entities.iter_mut()
    }

    pub fn living(&self) -> impl Iterator<Item = &HostileEntity> {
        self.entities.iter().filter(|e| e.alive)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Decrement HP, clamp at zero and run the death transition once.
    pub fn apply_damage(
        &mut self,
        id: &str,
        amount: i32,
        now: f64,
        source: HitSource,
    ) -> DamageOutcome {
        let Some(&idx) = self.index.get(id) else {
            return DamageOutcome::Ignored;
        };
        let entity = &mut self.entities[idx];
        if !entity.alive || amount <= 0 {
            return DamageOutcome::Ignored;
        }

        entity.hp = (entity.hp - amount).clamp(0, entity.max_hp());
        entity.flash_until = Some(now + FLASH_SECS);

        if entity.hp == 0 {
            DamageOutcome::Killed(self.kill(idx, now, source))
        } else {
            DamageOutcome::Damaged { hp: entity.hp }
        }
    }

    /// Kill regardless of remaining HP. `None` if already dead or unknown.
    pub fn force_kill(&mut self, id: &str, now: f64, source: HitSource) -> Option<DeathReport> {
        let &idx = self.index.get(id)?;
        if !self.entities[idx].alive {
            return None;
        }
        self.entities[idx].hp = 0;
        Some(self.kill(idx, now, source))
    }

    fn kill(&mut self, idx: usize, now: f64, source: HitSource) -> DeathReport {
        let entity = &mut self.entities[idx];
        entity.alive = false;
        entity.state = AiState::Dead;
        entity.wander_heading = None;

        let delay = if entity.is_boss() {
            self.config.boss_delay_secs
        } else {
            self.config.mob_delay_secs
        };
        let respawn_at = now + delay;
        let report = DeathReport {
            id: entity.id().clone(),
            kind: entity.kind(),
            position: entity.position,
            is_boss: entity.is_boss(),
            xp: entity.def.stats.xp,
            source,
            respawn_at,
        };

        // One pending respawn per entity: the first kill wins.
        if !self.respawns.iter().any(|p| p.id == report.id) {
            self.respawns.push(PendingRespawn {
                id: report.id.clone(),
                at: respawn_at,
            });
        }
        info!("{} died ({:?}), respawn at {:.1}", report.id, source, respawn_at);
        report
    }

    pub fn pending_respawn(&self, id: &str) -> Option<f64> {
        self.respawns.iter().find(|p| p.id == id).map(|p| p.at)
    }

    pub fn pending_respawn_count(&self) -> usize {
        self.respawns.len()
    }

    /// Restore every entity whose respawn time has passed. Returns their ids.
    pub fn process_respawns(&mut self, now: f64) -> Vec<EntityId> {
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.respawns.drain(..).partition(|p| p.at <= now);
        self.respawns = waiting;

        let mut restored = Vec::with_capacity(due.len());
        for pending in due {
            let Some(&idx) = self.index.get(&pending.id) else {
                continue;
            };
            self.entities[idx].reset(now);
            debug!("{} respawned", pending.id);
            restored.push(pending.id);
        }
        restored
    }

    /// Mark `zone` severed and start the matching debuff. `None` if it was
    /// already gone, isn't part of the anatomy, or the entity is dead.
    pub fn sever(
        &mut self,
        id: &str,
        zone: HitZone,
        now: f64,
        zones: &ZoneConfig,
    ) -> Option<Severed> {
        let entity = self.get_mut(id)?;
        if !entity.alive || zone == HitZone::Torso || !entity.available_zones().contains(zone) {
            return None;
        }
        entity.dismembered.insert(zone);

        let until = Some(now + zones.debuff_secs);
        if zone.is_leg() {
            entity.leg_debuff_until = until;
        } else if zone.is_arm() {
            entity.arm_debuff_until = until;
        }

        let weapon_dropped = entity.weapon_attached && entity.kind().weapon_arm() == Some(zone);
        if weapon_dropped {
            entity.weapon_attached = false;
        }
        debug!("{} lost {}", entity.id(), zone.as_str());
        Some(Severed {
            zone,
            weapon_dropped,
        })
    }

    /// Push a living entity by `displacement` and delay its next attack.
    /// A push into an obstacle leaves the entity where it was.
    pub fn knock_back(
        &mut self,
        id: &str,
        displacement: Vec2,
        stagger_until: f64,
        geometry: &dyn WorldGeometry,
    ) {
        let Some(entity) = self.get_mut(id) else {
            return;
        };
        if !entity.alive {
            return;
        }
        entity.position =
            geometry.resolve_move(entity.position, entity.position + displacement, 0.0);
        entity.last_attack_at = Some(
            entity
                .last_attack_at
                .map_or(stagger_until, |last| last.max(stagger_until)),
        );
    }

    /// A peer hit counts only against a living entity that hasn't just respawned.
    pub fn accepts_peer_hit(&self, id: &str, now: f64) -> bool {
        self.get(id).is_some_and(|e| {
            e.alive
                && e
                    .respawned_at
                    .is_none_or(|at| now - at >= self.config.peer_hit_grace_secs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::StaticGeometry;
    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> EntityRegistry {
        EntityRegistry::new(
            [
                SpawnDef::new("skel_0", MobKind::Skeleton, Vec2::new(100.0, 100.0)),
                SpawnDef::new("boss_dragon", MobKind::Dragon, Vec2::new(500.0, 500.0)),
            ],
            RespawnConfig::default(),
        )
    }

    #[test]
    fn spawn_table_ids_are_unique() {
        let defs = spawn_table();
        assert_eq!(defs.len(), 33);
        let reg = EntityRegistry::new(defs, RespawnConfig::default());
        assert_eq!(reg.len(), 33);
        assert_eq!(reg.iter().filter(|e| e.is_boss()).count(), 2);
        assert!(reg.get("dmage_4").is_some());
        assert_eq!(reg.get("boss_kraken").map(|e| e.max_hp()), Some(800));
    }

    #[rstest]
    fn three_hits_of_twenty(mut registry: EntityRegistry) {
        let hp: Vec<_> = (0..4)
            .map(|i| registry.apply_damage("skel_0", 20, i as f64, HitSource::Local))
            .collect();

        assert_eq!(hp[0], DamageOutcome::Damaged { hp: 30 });
        assert_eq!(hp[1], DamageOutcome::Damaged { hp: 10 });
        assert!(hp[2].death().is_some());
        assert_eq!(hp[3], DamageOutcome::Ignored);

        let skel = registry.get("skel_0").expect("exists");
        assert_eq!(skel.hp, 0);
        assert!(!skel.alive);
        assert_eq!(registry.pending_respawn_count(), 1);
        assert_eq!(registry.pending_respawn("skel_0"), Some(2.0 + 15.0));
    }

    #[rstest]
    fn hp_stays_in_bounds(mut registry: EntityRegistry) {
        for (i, amount) in [-5, 0, 7, 1000, 3, -100].into_iter().enumerate() {
            registry.apply_damage("boss_dragon", amount, i as f64, HitSource::Peer);
            let e = registry.get("boss_dragon").expect("exists");
            assert!((0..=e.max_hp()).contains(&e.hp));
            assert_eq!(e.alive, e.hp > 0);
        }
    }

    #[rstest]
    fn concurrent_kills_schedule_one_respawn(mut registry: EntityRegistry) {
        let first = registry.apply_damage("skel_0", 60, 1.0, HitSource::Local);
        let second = registry.apply_damage("skel_0", 60, 1.0, HitSource::Peer);
        assert_eq!(first.death().map(|d| d.source), Some(HitSource::Local));
        assert_eq!(second, DamageOutcome::Ignored);
        assert!(registry.force_kill("skel_0", 1.0, HitSource::Peer).is_none());
        assert_eq!(registry.pending_respawn_count(), 1);
    }

    #[rstest]
    fn boss_respawn_is_longer(mut registry: EntityRegistry) {
        let report = registry
            .force_kill("boss_dragon", 10.0, HitSource::Local)
            .expect("alive");
        assert_eq!(report.respawn_at, 70.0);
        assert!(report.is_boss);
    }

    #[rstest]
    fn respawn_restores_definition(mut registry: EntityRegistry) {
        let zones = ZoneConfig::default();
        registry.knock_back("skel_0", Vec2::new(12.0, 0.0), 0.3, &StaticGeometry::default());
        registry.sever("skel_0", HitZone::ArmRight, 0.0, &zones);
        registry.apply_damage("skel_0", 100, 0.0, HitSource::Local);

        assert!(registry.process_respawns(14.9).is_empty());
        assert!(!registry.get("skel_0").expect("exists").alive);

        assert_eq!(registry.process_respawns(15.0), vec![EntityId::from("skel_0")]);
        let skel = registry.get("skel_0").expect("exists");
        assert!(skel.alive);
        assert_eq!(skel.hp, 50);
        assert_eq!(skel.position, Vec2::new(100.0, 100.0));
        assert!(skel.dismembered.is_empty());
        assert!(skel.weapon_attached);
        assert_eq!(skel.state, AiState::Wander);
        assert_eq!(registry.pending_respawn_count(), 0);
    }

    #[rstest]
    fn zones_sever_once(mut registry: EntityRegistry) {
        let zones = ZoneConfig::default();
        let first = registry.sever("skel_0", HitZone::ArmRight, 1.0, &zones);
        assert_eq!(
            first,
            Some(Severed {
                zone: HitZone::ArmRight,
                weapon_dropped: true
            })
        );
        assert!(registry.sever("skel_0", HitZone::ArmRight, 1.5, &zones).is_none());
        assert!(registry.sever("skel_0", HitZone::Torso, 1.5, &zones).is_none());
        // Dragons have no arms.
        assert!(registry.sever("boss_dragon", HitZone::ArmLeft, 1.5, &zones).is_none());

        let skel = registry.get("skel_0").expect("exists");
        assert!(skel.is_arm_weakened(5.9));
        assert!(!skel.is_arm_weakened(6.0));
        assert!(!skel.available_zones().contains(HitZone::ArmRight));
    }

    #[rstest]
    fn leg_sever_slows(mut registry: EntityRegistry) {
        let zones = ZoneConfig::default();
        registry.sever("skel_0", HitZone::LegLeft, 0.0, &zones);
        let skel = registry.get("skel_0").expect("exists");
        assert_eq!(skel.move_speed(1.0, &zones), 40.0 * 0.3);
        assert_eq!(skel.move_speed(5.0, &zones), 40.0);
    }

    #[rstest]
    fn peer_hits_after_respawn_are_stale(mut registry: EntityRegistry) {
        registry.apply_damage("skel_0", 100, 0.0, HitSource::Local);
        assert!(!registry.accepts_peer_hit("skel_0", 1.0));
        registry.process_respawns(15.0);
        assert!(!registry.accepts_peer_hit("skel_0", 15.5));
        assert!(registry.accepts_peer_hit("skel_0", 16.0));
        assert!(!registry.accepts_peer_hit("nobody", 16.0));
    }

    #[rstest]
    fn stagger_delays_attack_clock(mut registry: EntityRegistry) {
        registry.knock_back("skel_0", Vec2::new(0.0, 8.0), 1.3, &StaticGeometry::default());
        let skel = registry.get("skel_0").expect("exists");
        assert_eq!(skel.position, Vec2::new(100.0, 108.0));
        assert_eq!(skel.last_attack_at, Some(1.3));
    }
}
