//! ECS mirrors of core state, so scene code can query hostiles and peers
//! like any other entity. The core stays the source of truth, except for
//! debris: once thrown, it belongs to the physics engine.

use std::collections::HashMap;

use avian3d::prelude::*;
use bevy::prelude::*;
use skirmish_shared::debris::{self, DebrisKind, DebrisShape};
use skirmish_shared::feedback::FeedbackRequest;
use skirmish_shared::registry::{EntityId, MobKind};
use smol_str::SmolStr;

use crate::combat::{Combat, FeedbackRequested, FrameSet};

pub fn plugin(app: &mut App) {
    app.init_resource::<ViewIndex>()
        .add_observer(on_mob_removed)
        .add_observer(on_mob_respawned)
        .add_systems(
            Update,
            (
                sync_mob_views,
                sync_peer_views,
                spawn_debris,
                fade_debris.after(spawn_debris),
            )
                .in_set(FrameSet::Present),
        );
}

#[derive(Component, Debug)]
pub struct MobView {
    pub id: EntityId,
    pub kind: MobKind,
    pub hp: i32,
    pub max_hp: i32,
    /// Just took damage.
    pub flashing: bool,
}

/// Mob is dead and waiting to respawn.
#[derive(Component, Debug)]
pub struct Downed;

#[derive(Component, Debug)]
pub struct PeerAvatar {
    pub id: SmolStr,
    pub hp: i32,
}

/// A ragdoll segment, severed limb or dropped weapon in flight.
#[derive(Component, Debug)]
pub struct DebrisView {
    pub id: u64,
    pub kind: DebrisKind,
    /// Real-time seconds.
    pub spawned_at: f64,
    pub opacity: f32,
}

#[derive(Resource, Default, Debug)]
pub struct ViewIndex {
    pub mobs: HashMap<EntityId, Entity>,
    pub peers: HashMap<SmolStr, Entity>,
}

fn ground(position: Vec2, angle: f32) -> Transform {
    Transform::from_xyz(position.x, 0.0, position.y).with_rotation(Quat::from_rotation_y(angle))
}

pub(super) fn sync_mob_views(
    real: Res<Time<Real>>,
    combat: Res<Combat>,
    mut index: ResMut<ViewIndex>,
    mut views: Query<(&mut MobView, &mut Transform)>,
    mut commands: Commands,
) {
    let now = real.elapsed_secs_f64();
    for mob in combat.registry().iter() {
        let transform = ground(mob.position, mob.angle);
        let flashing = mob.is_flashing(now);
        match index.mobs.get(mob.id()).copied() {
            Some(entity) => {
                if let Ok((mut view, mut current)) = views.get_mut(entity) {
                    view.hp = mob.hp;
                    view.flashing = flashing;
                    *current = transform;
                }
            }
            None => {
                let entity = commands
                    .spawn((
                        MobView {
                            id: mob.id().clone(),
                            kind: mob.kind(),
                            hp: mob.hp,
                            max_hp: mob.max_hp(),
                            flashing,
                        },
                        transform,
                    ))
                    .id();
                index.mobs.insert(mob.id().clone(), entity);
            }
        }
    }
}

fn on_mob_removed(on: On<FeedbackRequested>, index: Res<ViewIndex>, mut commands: Commands) {
    if let FeedbackRequest::EntityRemoved { entity } = &on.event().0 {
        if let Some(view) = index.mobs.get(entity) {
            commands.entity(*view).insert(Downed);
        }
    }
}

fn on_mob_respawned(on: On<FeedbackRequested>, index: Res<ViewIndex>, mut commands: Commands) {
    if let FeedbackRequest::EntityRespawned { entity, .. } = &on.event().0 {
        if let Some(view) = index.mobs.get(entity) {
            commands.entity(*view).remove::<Downed>();
        }
    }
}

fn sync_peer_views(
    combat: Res<Combat>,
    mut index: ResMut<ViewIndex>,
    mut avatars: Query<(&mut PeerAvatar, &mut Transform)>,
    mut commands: Commands,
) {
    let roster = combat.roster();
    index.peers.retain(|id, entity| {
        let known = roster.get(id).is_some();
        if !known {
            commands.entity(*entity).despawn();
        }
        known
    });

    for (id, peer) in roster.iter() {
        let transform = ground(peer.position, 0.0);
        match index.peers.get(id).copied() {
            Some(entity) => {
                if let Ok((mut avatar, mut current)) = avatars.get_mut(entity) {
                    avatar.hp = peer.hp;
                    current.translation = transform.translation;
                }
            }
            None => {
                let entity = commands
                    .spawn((
                        PeerAvatar {
                            id: id.clone(),
                            hp: peer.hp,
                        },
                        transform,
                    ))
                    .id();
                index.peers.insert(id.clone(), entity);
            }
        }
    }
}

fn collider(shape: DebrisShape) -> Collider {
    match shape {
        DebrisShape::Sphere { radius } => Collider::sphere(radius),
        DebrisShape::Cuboid { half_extents } => {
            let size = half_extents * 2.0;
            Collider::cuboid(size.x, size.y, size.z)
        }
    }
}

/// Hands freshly thrown parts to the physics engine.
fn spawn_debris(mut combat: ResMut<Combat>, mut commands: Commands) {
    let config = combat.config().debris.clone();
    for part in combat.drain_debris() {
        commands.spawn((
            DebrisView {
                id: part.id,
                kind: part.kind,
                spawned_at: part.spawned_at,
                opacity: 1.0,
            },
            Transform::from_translation(part.position),
            RigidBody::Dynamic,
            collider(part.shape),
            Mass(part.mass),
            LinearVelocity(part.linear_velocity),
            AngularVelocity(part.angular_velocity),
            LinearDamping(part.linear_damping),
            AngularDamping(part.angular_damping),
            Restitution::new(config.restitution),
            Friction::new(config.friction),
        ));
    }
}

fn fade_debris(
    real: Res<Time<Real>>,
    combat: Res<Combat>,
    mut views: Query<(Entity, &mut DebrisView)>,
    mut commands: Commands,
) {
    let now = real.elapsed_secs_f64();
    let config = &combat.config().debris;
    for (entity, mut view) in &mut views {
        let age = now - view.spawned_at;
        if debris::is_expired(age, config) {
            commands.entity(entity).despawn();
        } else {
            view.opacity = debris::fade_opacity(age, config);
        }
    }
}
