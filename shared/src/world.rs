//! The combat world: one client's locally authoritative simulation.
//!
//! Local attacks resolve to full effect (HP, rewards, respawns) and are
//! broadcast. Peer attacks only replay visuals; peer hits mutate HP but never
//! reward and are never re-broadcast.

use glam::Vec2;
use smol_str::{SmolStr, format_smolstr};
use tracing::{debug, info};

use crate::ai::{self, AiAction};
use crate::combat::{
    SwingDirection, angle_to, can_attack, directional_damage, forward, scale_damage, swing_point,
};
use crate::config::{AttackKind, CombatConfig};
use crate::debris::{DebrisPart, DebrisSpawner, Throw};
use crate::feedback::{FeedbackRequest, Tint};
use crate::geometry::{StaticGeometry, WorldGeometry};
use crate::player::{PlayerState, Reward};
use crate::projectile::{ProjectileHit, ProjectileKind, ProjectileOwner, ProjectileSet};
use crate::registry::{
    DamageOutcome, DeathReport, EntityId, EntityRegistry, HitSource, Severed, SpawnDef,
};
use crate::rng::CombatRng;
use crate::sync::{
    AttackBroadcast, MobHitBroadcast, PeerEvent, PeerRoster, PlayerStateBroadcast,
};
use crate::zones::{HitZone, resolve_zone, severs};

/// A local attack request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackIntent {
    /// Pointer projected onto the ground. `None` when the ray missed.
    pub target: Option<Vec2>,
    /// Pointer motion just before the click, in screen pixels.
    pub pointer_delta: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackRejection {
    Dead,
    Blocking,
    Cooldown,
    NoTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitReport {
    pub entity: EntityId,
    pub zone: HitZone,
    pub damage: i32,
    pub severed: Option<Severed>,
    pub killed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttackOutcome {
    Rejected(AttackRejection),
    Melee {
        direction: SwingDirection,
        combo: u32,
        hits: Vec<HitReport>,
    },
    Fired {
        direction: SwingDirection,
        combo: u32,
        projectile: u64,
    },
}

/// How a strike reached its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    pub direction: SwingDirection,
    pub damage: i32,
    pub angle: f32,
    pub melee: bool,
}

pub struct CombatWorld {
    config: CombatConfig,
    registry: EntityRegistry,
    player: PlayerState,
    projectiles: ProjectileSet,
    debris: DebrisSpawner,
    roster: PeerRoster,
    geometry: Box<dyn WorldGeometry + Send + Sync>,
    rng: CombatRng,
    feedback: Vec<FeedbackRequest>,
    outbox: Vec<PeerEvent>,
    rewards: Vec<Reward>,
}

impl CombatWorld {
    pub fn new(
        config: CombatConfig,
        player: PlayerState,
        spawns: impl IntoIterator<Item = SpawnDef>,
        geometry: Box<dyn WorldGeometry + Send + Sync>,
        rng: CombatRng,
    ) -> Self {
        Self {
            registry: EntityRegistry::new(spawns, config.respawn.clone()),
            debris: DebrisSpawner::new(config.debris.clone()),
            projectiles: ProjectileSet::default(),
            roster: PeerRoster::default(),
            feedback: Vec::new(),
            outbox: Vec::new(),
            rewards: Vec::new(),
            config,
            player,
            geometry,
            rng,
        }
    }

    /// A world on an open square map of the configured size.
    pub fn open_map(
        config: CombatConfig,
        player: PlayerState,
        spawns: impl IntoIterator<Item = SpawnDef>,
        rng: CombatRng,
    ) -> Self {
        let geometry = StaticGeometry::square_map(config.player.map_size);
        Self::new(config, player, spawns, Box::new(geometry), rng)
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    /// Debris thrown since the last drain, not yet handed to physics.
    pub fn debris(&self) -> &DebrisSpawner {
        &self.debris
    }

    pub fn drain_debris(&mut self) -> Vec<DebrisPart> {
        self.debris.drain()
    }

    pub fn projectiles(&self) -> &ProjectileSet {
        &self.projectiles
    }

    pub fn roster(&self) -> &PeerRoster {
        &self.roster
    }

    pub fn drain_feedback(&mut self) -> Vec<FeedbackRequest> {
        std::mem::take(&mut self.feedback)
    }

    pub fn drain_outbox(&mut self) -> Vec<PeerEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn drain_rewards(&mut self) -> Vec<Reward> {
        std::mem::take(&mut self.rewards)
    }

    pub fn set_blocking(&mut self, blocking: bool) {
        self.player.blocking = blocking;
    }

    /// Walk the player along `direction` at class speed. Blocked moves are cancelled.
    pub fn move_player(&mut self, direction: Vec2, dt: f32) {
        if self.player.is_dead() {
            return;
        }
        let step = direction.normalize_or_zero() * self.player.stats.speed * dt;
        if step == Vec2::ZERO {
            return;
        }
        let from = self.player.position;
        self.player.position =
            self.geometry
                .resolve_move(from, from + step, self.config.player.body_radius);
        self.player.angle = step.x.atan2(step.y);
    }

    /// Resolve one local attack.
    pub fn attack(&mut self, intent: AttackIntent, now: f64) -> AttackOutcome {
        if self.player.is_dead() {
            return AttackOutcome::Rejected(AttackRejection::Dead);
        }
        if self.player.blocking {
            return AttackOutcome::Rejected(AttackRejection::Blocking);
        }
        let Some(target) = intent.target else {
            return AttackOutcome::Rejected(AttackRejection::NoTarget);
        };
        let profile = self.config.class(self.player.class).clone();
        if !can_attack(self.player.last_attack_at, now, profile.cooldown_secs) {
            return AttackOutcome::Rejected(AttackRejection::Cooldown);
        }

        let origin = self.player.position;
        let angle = angle_to(origin, target);
        let direction =
            SwingDirection::classify(intent.pointer_delta, self.config.swing.thrust_deadzone);
        self.player.angle = angle;
        self.player.last_attack_at = Some(now);
        let combo = self.player.combo.register(now, &self.config.combo);

        let base = directional_damage(
            self.player.stats.attack,
            profile.damage_bonus,
            direction.damage_multiplier(&self.config.swing),
        );
        let damage = scale_damage(base, self.player.combo.multiplier(&self.config.combo));

        if combo > 0 {
            self.feedback.push(FeedbackRequest::FloatingText {
                position: origin,
                text: format_smolstr!("{}x COMBO!", combo + 1),
                tint: Tint::COMBO,
            });
        }
        if self.player.combo.is_maxed(&self.config.combo) {
            self.feedback.push(FeedbackRequest::SlowMotion { scale: 0.2 });
        }

        self.outbox.push(PeerEvent::Attack(AttackBroadcast {
            player_id: self.player.id.clone(),
            class: self.player.class,
            x: origin.x,
            y: origin.y,
            angle,
            swing_direction: Some(direction),
        }));

        match profile.attack {
            AttackKind::Melee => {
                self.feedback.push(FeedbackRequest::Effect {
                    name: "slash",
                    position: origin,
                    angle,
                });
                let point = swing_point(origin, angle, self.config.swing.reach);
                let candidates: Vec<EntityId> = self
                    .registry
                    .living()
                    .filter(|e| {
                        let radius = if e.is_boss() {
                            self.config.swing.boss_hit_radius
                        } else {
                            self.config.swing.hit_radius
                        };
                        e.position.distance(point) < radius
                    })
                    .map(|e| e.id().clone())
                    .collect();

                let strike = Strike {
                    direction,
                    damage,
                    angle,
                    melee: true,
                };
                let hits = candidates
                    .iter()
                    .filter_map(|id| self.strike_mob(id, strike, now, None))
                    .collect();
                AttackOutcome::Melee {
                    direction,
                    combo,
                    hits,
                }
            }
            AttackKind::Ranged {
                speed,
                lifetime_secs,
            } => {
                let kind = ProjectileKind::for_class(self.player.class);
                let spawn = origin + forward(angle) * self.config.projectile.spawn_offset;
                self.feedback.push(FeedbackRequest::Effect {
                    name: kind.effect_name(),
                    position: spawn,
                    angle,
                });
                let projectile = self.projectiles.spawn(
                    kind,
                    ProjectileOwner::Local,
                    spawn,
                    forward(angle),
                    speed,
                    damage,
                    now + lifetime_secs,
                );
                AttackOutcome::Fired {
                    direction,
                    combo,
                    projectile,
                }
            }
        }
    }

    /// Apply one local strike to a mob: zone roll, dismemberment, damage,
    /// knockback, feedback and broadcast. `zone_roll` overrides the random roll.
    pub fn strike_mob(
        &mut self,
        id: &str,
        strike: Strike,
        now: f64,
        zone_roll: Option<f32>,
    ) -> Option<HitReport> {
        let entity = self.registry.get(id).filter(|e| e.alive)?;
        let position = entity.position;
        let hp_before = entity.hp;
        let max_hp = entity.max_hp();
        let available = entity.available_zones();

        let roll = zone_roll.unwrap_or_else(|| self.rng.roll());
        let zone = resolve_zone(strike.direction, available, roll);
        let zone_damage = scale_damage(strike.damage, zone.multiplier(&self.config.zones));

        let severed = if severs(zone, zone_damage, max_hp, &self.config.zones) {
            self.sever(id, zone, position, strike, now)
        } else {
            None
        };

        let mut outcome = self.registry.apply_damage(id, zone_damage, now, HitSource::Local);
        let decapitated = severed.is_some_and(|s| s.zone == HitZone::Head);
        if decapitated && !matches!(outcome, DamageOutcome::Killed(_)) {
            if let Some(report) = self.registry.force_kill(id, now, HitSource::Local) {
                outcome = DamageOutcome::Killed(report);
            }
        }

        if strike.melee && !matches!(outcome, DamageOutcome::Killed(_)) {
            let push = forward(strike.angle) * strike.direction.knockback(&self.config.swing);
            self.registry.knock_back(
                id,
                push,
                now + self.config.swing.stagger_secs,
                self.geometry.as_ref(),
            );
        }

        self.hit_feedback(id, position, zone, zone_damage, now);

        // Peers get the HP actually removed, so a decapitation kills there too.
        let dealt = if decapitated {
            zone_damage.max(hp_before)
        } else {
            zone_damage
        };
        self.outbox.push(PeerEvent::MobHit(MobHitBroadcast {
            mob_id: id.into(),
            damage: dealt,
        }));

        let killed = match outcome {
            DamageOutcome::Killed(report) => {
                let execution = zone == HitZone::Head
                    || matches!(
                        strike.direction,
                        SwingDirection::Overhead | SwingDirection::Thrust
                    );
                if execution {
                    self.feedback.push(FeedbackRequest::SlowMotion { scale: 0.15 });
                }
                self.on_death(
                    &report,
                    strike.angle,
                    strike.direction == SwingDirection::Overhead,
                    now,
                );
                true
            }
            _ => false,
        };

        Some(HitReport {
            entity: id.into(),
            zone,
            damage: zone_damage,
            severed,
            killed,
        })
    }

    fn sever(
        &mut self,
        id: &str,
        zone: HitZone,
        position: Vec2,
        strike: Strike,
        now: f64,
    ) -> Option<Severed> {
        let severed = self.registry.sever(id, zone, now, &self.config.zones)?;
        let is_boss = self.registry.get(id).is_some_and(|e| e.is_boss());
        let throw = Throw {
            origin: position,
            angle: strike.angle,
            overhead: strike.direction == SwingDirection::Overhead,
            is_boss,
        };
        self.debris.spawn_limb(zone, throw, now, &mut self.rng);
        if severed.weapon_dropped {
            self.debris.spawn_weapon(throw, now, &mut self.rng);
        }
        if let Some(label) = zone.sever_label() {
            self.feedback.push(FeedbackRequest::FloatingText {
                position,
                text: SmolStr::new_static(label),
                tint: Tint::DISMEMBER,
            });
        }
        info!("{id} lost {}", zone.as_str());
        Some(severed)
    }

    fn hit_feedback(&mut self, id: &str, position: Vec2, zone: HitZone, damage: i32, now: f64) {
        let head = zone == HitZone::Head;
        self.feedback.push(FeedbackRequest::DamageNumber {
            position,
            value: damage,
            tint: if head { Tint::CRIT_RED } else { Tint::DAMAGE },
        });
        if let Some(label) = zone.hit_label() {
            self.feedback.push(FeedbackRequest::FloatingText {
                position,
                text: SmolStr::new_static(label),
                tint: Tint::CRIT_RED,
            });
        }
        self.feedback.push(FeedbackRequest::EntityFlash {
            entity: id.into(),
            until: now + crate::registry::FLASH_SECS,
        });
        if head {
            self.feedback.extend([
                FeedbackRequest::SlowMotion { scale: 0.3 },
                FeedbackRequest::HitStop { duration_secs: 0.1 },
                FeedbackRequest::ScreenFlash {
                    tint: Tint::CRIT_RED,
                    duration_secs: 0.2,
                },
                FeedbackRequest::CameraShake { intensity: 10.0 },
            ]);
        } else {
            self.feedback.extend([
                FeedbackRequest::HitStop { duration_secs: 0.06 },
                FeedbackRequest::ScreenFlash {
                    tint: Tint::WHITE,
                    duration_secs: 0.1,
                },
                FeedbackRequest::CameraShake { intensity: 5.0 },
            ]);
        }
    }

    /// Ragdoll and cleanup for a death, plus rewards when the kill was ours.
    fn on_death(&mut self, report: &DeathReport, angle: f32, overhead: bool, now: f64) {
        let segments = self
            .registry
            .get(&report.id)
            .map(|e| e.available_zones())
            .unwrap_or_default();
        let throw = Throw {
            origin: report.position,
            angle,
            overhead,
            is_boss: report.is_boss,
        };
        self.debris.spawn_ragdoll(throw, segments, now, &mut self.rng);
        self.feedback.push(FeedbackRequest::EntityRemoved {
            entity: report.id.clone(),
        });

        if report.source != HitSource::Local {
            return;
        }
        let reward = Reward::for_kill(report, &mut self.rng);
        self.feedback.push(FeedbackRequest::FloatingText {
            position: report.position,
            text: format_smolstr!("+{} XP", reward.xp),
            tint: Tint::XP,
        });
        if report.is_boss {
            self.feedback.push(FeedbackRequest::Notification {
                text: format_smolstr!("{} defeated!", report.kind.as_str()),
            });
        }
        self.rewards.push(reward);
    }

    /// Apply an event from a peer. Never rewards, never re-broadcasts.
    pub fn receive(&mut self, event: PeerEvent, now: f64) {
        if event.sender() == Some(self.player.id.as_str()) {
            return;
        }
        match event {
            PeerEvent::Attack(attack) => self.replay_attack(attack, now),
            PeerEvent::MobHit(hit) => self.apply_peer_hit(hit, now),
            PeerEvent::PlayerState(state) => self.roster.observe(&state, now),
        }
    }

    fn replay_attack(&mut self, attack: AttackBroadcast, now: f64) {
        self.roster.touch(&attack.player_id, now);
        let origin = Vec2::new(attack.x, attack.y);
        let profile = self.config.class(attack.class).clone();
        match profile.attack {
            AttackKind::Melee => self.feedback.push(FeedbackRequest::Effect {
                name: "slash",
                position: origin,
                angle: attack.angle,
            }),
            AttackKind::Ranged {
                speed,
                lifetime_secs,
            } => {
                let kind = ProjectileKind::for_class(attack.class);
                let spawn = origin + forward(attack.angle) * self.config.projectile.spawn_offset;
                self.projectiles.spawn(
                    kind,
                    ProjectileOwner::Peer(attack.player_id),
                    spawn,
                    forward(attack.angle),
                    speed,
                    0,
                    now + lifetime_secs,
                );
            }
        }
    }

    fn apply_peer_hit(&mut self, hit: MobHitBroadcast, now: f64) {
        if !self.registry.accepts_peer_hit(&hit.mob_id, now) {
            debug!("Ignoring stale hit on {}", hit.mob_id);
            return;
        }
        let (position, facing) = self
            .registry
            .get(&hit.mob_id)
            .map(|e| (e.position, e.angle))
            .unwrap_or_default();
        match self
            .registry
            .apply_damage(&hit.mob_id, hit.damage, now, HitSource::Peer)
        {
            DamageOutcome::Ignored => {}
            DamageOutcome::Damaged { .. } => {
                self.peer_hit_feedback(&hit, position, now);
            }
            DamageOutcome::Killed(report) => {
                self.peer_hit_feedback(&hit, position, now);
                // Mobs face whoever they fight, so the body flies backwards.
                self.on_death(&report, facing + std::f32::consts::PI, false, now);
            }
        }
    }

    fn peer_hit_feedback(&mut self, hit: &MobHitBroadcast, position: Vec2, now: f64) {
        self.feedback.extend([
            FeedbackRequest::DamageNumber {
                position,
                value: hit.damage,
                tint: Tint::DAMAGE,
            },
            FeedbackRequest::EntityFlash {
                entity: hit.mob_id.clone(),
                until: now + crate::registry::FLASH_SECS,
            },
        ]);
    }

    /// The periodic position and HP report for peers.
    pub fn state_broadcast(&self) -> PlayerStateBroadcast {
        PlayerStateBroadcast {
            player_id: self.player.id.clone(),
            class: self.player.class,
            x: self.player.position.x,
            y: self.player.position.y,
            hp: self.player.stats.hp,
            max_hp: self.player.stats.max_hp,
        }
    }

    pub fn queue_state_broadcast(&mut self) {
        let state = self.state_broadcast();
        self.outbox.push(PeerEvent::PlayerState(state));
    }

    /// One frame: enemy AI, projectiles, respawns, then the peer roster.
    pub fn tick(&mut self, now: f64, dt: f32) {
        let player = (!self.player.is_dead()).then_some(self.player.position);
        let mut actions = Vec::new();
        for entity in self.registry.iter_mut() {
            if let Some(action) = ai::tick_entity(
                entity,
                player,
                now,
                dt,
                &self.config,
                self.geometry.as_ref(),
                &mut self.rng,
            ) {
                actions.push(action);
            }
        }
        for action in actions {
            self.apply_ai_action(action);
        }

        let target = (!self.player.is_dead())
            .then_some((self.player.position, self.config.ai.bolt_hit_radius));
        let hits = self
            .projectiles
            .step(dt, now, &self.registry, target, &self.config.projectile);
        for hit in hits {
            match hit {
                ProjectileHit::Mob {
                    entity,
                    damage,
                    angle,
                    ..
                } => {
                    let strike = Strike {
                        direction: SwingDirection::Thrust,
                        damage,
                        angle,
                        melee: false,
                    };
                    self.strike_mob(&entity, strike, now, None);
                }
                ProjectileHit::Player {
                    source, damage, ..
                } => self.hurt_player(&source, damage),
            }
        }

        for id in self.registry.process_respawns(now) {
            if let Some(entity) = self.registry.get(&id) {
                self.feedback.push(FeedbackRequest::EntityRespawned {
                    entity: id.clone(),
                    position: entity.position,
                });
            }
        }

        self.roster.smooth(self.config.sync.peer_smoothing);
        self.roster
            .evict_stale(now, self.config.sync.peer_timeout_secs);
    }

    fn apply_ai_action(&mut self, action: AiAction) {
        match action {
            AiAction::MeleeHit { source, attack } => {
                let blocking = self.player.blocking;
                let damage = ai::melee_damage(
                    attack,
                    self.player.stats.defense,
                    blocking,
                    self.config.ai.block_factor,
                );
                if blocking {
                    self.feedback.push(FeedbackRequest::FloatingText {
                        position: self.player.position,
                        text: SmolStr::new_static("BLOCKED"),
                        tint: Tint::BLOCKED,
                    });
                }
                self.hurt_player(&source, damage);
            }
            AiAction::Shoot {
                source,
                origin,
                direction,
                speed,
                damage,
                expires_at,
            } => {
                self.projectiles.spawn(
                    ProjectileKind::EnemyBolt,
                    ProjectileOwner::Mob(source),
                    origin,
                    direction,
                    speed,
                    damage,
                    expires_at,
                );
            }
        }
    }

    fn hurt_player(&mut self, source: &str, damage: i32) {
        if damage <= 0 {
            return;
        }
        let position = self.player.position;
        self.feedback.extend([
            FeedbackRequest::DamageNumber {
                position,
                value: damage,
                tint: Tint::PLAYER_HURT,
            },
            FeedbackRequest::CameraShake { intensity: 3.0 },
        ]);
        if !self.player.take_damage(damage) {
            return;
        }

        info!("Player {} killed by {source}", self.player.id);
        self.player.respawn(self.config.player.safe_spawn);
        self.feedback.extend([
            FeedbackRequest::SlowMotion { scale: 0.1 },
            FeedbackRequest::ScreenFlash {
                tint: Tint::PLAYER_HURT,
                duration_secs: 0.5,
            },
            FeedbackRequest::Notification {
                text: SmolStr::new_static("You died! Respawning in the village..."),
            },
        ]);
    }
}
