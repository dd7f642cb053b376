use bevy::prelude::*;
use skirmish_shared::player::PlayerState;
use skirmish_shared::registry::{SpawnDef, spawn_table};
use skirmish_shared::world::{AttackIntent, AttackOutcome, CombatWorld};
use smol_str::SmolStr;

use crate::models::Settings;

pub mod events;
mod feedback;
mod floaters;
mod views;

pub use events::*;
pub use feedback::*;
pub use floaters::*;
pub use views::*;

/// Per-frame order: peers in, local input, simulation, peers out, presentation.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Receive,
    Input,
    Simulate,
    Sync,
    Present,
}

/// The combat core, owned by the app.
#[derive(Resource, Deref, DerefMut)]
pub struct Combat(pub CombatWorld);

impl Combat {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_spawns(settings, spawn_table())
    }

    pub fn with_spawns(settings: &Settings, spawns: impl IntoIterator<Item = SpawnDef>) -> Self {
        let id = settings.player_id();
        let config = settings.combat.clone();
        let player = PlayerState::new(id.clone(), settings.class, config.player.safe_spawn, &config);
        let rng = settings.rng_for(&id);
        info!("Player {id} joined as {}", settings.class.as_str());
        Self(CombatWorld::open_map(config, player, spawns, rng))
    }
}

/// Kill tally of the local player.
#[derive(Resource, Default, Debug)]
pub struct Progress {
    pub xp: u32,
    pub kills: u32,
    pub loot: Vec<SmolStr>,
}

pub fn plugin(app: &mut App) {
    if !app.world().contains_resource::<Combat>() {
        let settings = app
            .world()
            .get_resource::<Settings>()
            .cloned()
            .unwrap_or_default();
        app.insert_resource(Combat::from_settings(&settings));
    }

    app.add_message::<MoveInput>()
        .add_message::<BlockInput>()
        .add_message::<AttackPressed>()
        .init_resource::<Progress>()
        .configure_sets(
            Update,
            (
                FrameSet::Receive,
                FrameSet::Input,
                FrameSet::Simulate,
                FrameSet::Sync,
                FrameSet::Present,
            )
                .chain(),
        )
        .add_observer(on_hit_landed)
        .add_observer(on_reward)
        .add_systems(Update, apply_input.in_set(FrameSet::Input))
        .add_systems(Update, tick_world.in_set(FrameSet::Simulate))
        .add_systems(
            Update,
            dispatch_feedback
                .in_set(FrameSet::Present)
                .after(views::sync_mob_views),
        );

    app.add_plugins((feedback::plugin, floaters::plugin, views::plugin));
}

pub(crate) fn apply_input(
    real: Res<Time<Real>>,
    time: Res<Time>,
    mut combat: ResMut<Combat>,
    mut moves: MessageReader<MoveInput>,
    mut blocks: MessageReader<BlockInput>,
    mut attacks: MessageReader<AttackPressed>,
    mut commands: Commands,
) {
    let now = real.elapsed_secs_f64();

    for block in blocks.read() {
        combat.set_blocking(block.0);
    }

    let heading: Vec2 = moves.read().map(|m| m.0).sum();
    combat.move_player(heading, time.delta_secs());

    for press in attacks.read() {
        let intent = AttackIntent {
            target: press.target,
            pointer_delta: press.pointer_delta,
        };
        match combat.attack(intent, now) {
            AttackOutcome::Rejected(reason) => {
                commands.trigger(AttackRejected(reason));
            }
            AttackOutcome::Melee { hits, .. } => {
                for hit in hits {
                    commands.trigger(HitLanded {
                        entity: hit.entity,
                        zone: hit.zone,
                        damage: hit.damage,
                        killed: hit.killed,
                    });
                }
            }
            AttackOutcome::Fired { .. } => {}
        }
    }
}

/// Game time drives movement. Deadlines (cooldowns, respawns, lifetimes)
/// compare against real time so hit-stop never stretches them.
fn tick_world(real: Res<Time<Real>>, time: Res<Time>, mut combat: ResMut<Combat>) {
    combat.tick(real.elapsed_secs_f64(), time.delta_secs());
}

fn dispatch_feedback(mut combat: ResMut<Combat>, mut commands: Commands) {
    for request in combat.drain_feedback() {
        commands.trigger(FeedbackRequested(request));
    }
    for reward in combat.drain_rewards() {
        commands.trigger(RewardEarned(reward));
    }
}

fn on_hit_landed(on: On<HitLanded>) {
    let hit = on.event();
    debug!(
        "Hit {} in the {} for {}{}",
        hit.entity,
        hit.zone.as_str(),
        hit.damage,
        if hit.killed { " (killed)" } else { "" }
    );
}

fn on_reward(on: On<RewardEarned>, mut progress: ResMut<Progress>) {
    let reward = &on.event().0;
    progress.xp += reward.xp;
    progress.kills += 1;
    progress.loot.extend(reward.loot.iter().cloned());
    if reward.boss {
        info!(
            "Boss {} down: {} xp, {} items",
            reward.entity,
            reward.xp,
            reward.loot.len()
        );
    }
}
