//! Physics world for debris: gravity from the combat config and a floor.

use avian3d::prelude::*;
use bevy::prelude::*;
use skirmish_shared::config::DebrisConfig;

use crate::combat::Combat;

pub fn plugin(app: &mut App) {
    // MinimalPlugins leaves transforms out
    if !app.is_plugin_added::<TransformPlugin>() {
        app.add_plugins(TransformPlugin);
    }
    let gravity = app
        .world()
        .get_resource::<Combat>()
        .map(|combat| combat.config().debris.gravity)
        .unwrap_or(DebrisConfig::default().gravity);

    app.add_plugins(PhysicsPlugins::default())
        .insert_resource(Gravity(Vec3::Y * gravity))
        .add_systems(Startup, spawn_floor);
}

fn spawn_floor(mut commands: Commands) {
    commands.spawn((
        Name::new("Floor"),
        Transform::from_translation(Vec3::ZERO),
        Collider::half_space(Vec3::Y),
        RigidBody::Static,
    ));
}
