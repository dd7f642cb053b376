use bevy::prelude::*;
use skirmish_shared::feedback::{FeedbackRequest, Tint};
use smol_str::{SmolStr, ToSmolStr};

use crate::combat::{FeedbackRequested, FrameSet};

pub fn plugin(app: &mut App) {
    app.add_observer(on_floater)
        .add_systems(Update, tick_floaters.in_set(FrameSet::Present));
}

// ── Damage Numbers ──────────────────────────────────────────────────

/// Text that pops above a spot on the ground, rises and fades.
#[derive(Component, Debug)]
pub struct Floater {
    pub text: SmolStr,
    pub tint: Tint,
    pub origin: Vec2,
    pub timer: f32,
}

const DISPLAY_DURATION: f32 = 0.8;
const HOLD_END: f32 = 0.4;
const RISE: f32 = 30.0;

impl Floater {
    pub fn is_number(&self) -> bool {
        self.text.parse::<i32>().is_ok()
    }

    /// Height above the origin. Numbers hold still before drifting up.
    pub fn height(&self) -> f32 {
        let start = if self.is_number() { HOLD_END } else { 0.0 };
        let t = ((self.timer - start) / (DISPLAY_DURATION - start)).clamp(0.0, 1.0);
        t * RISE
    }

    pub fn alpha(&self) -> f32 {
        if self.timer <= HOLD_END {
            return 1.0;
        }
        1.0 - ((self.timer - HOLD_END) / (DISPLAY_DURATION - HOLD_END)).clamp(0.0, 1.0)
    }
}

fn on_floater(on: On<FeedbackRequested>, mut commands: Commands) {
    let (position, text, tint) = match &on.event().0 {
        FeedbackRequest::DamageNumber {
            position,
            value,
            tint,
        } => (*position, value.to_smolstr(), *tint),
        FeedbackRequest::FloatingText {
            position,
            text,
            tint,
        } => (*position, text.clone(), *tint),
        _ => return,
    };

    commands.spawn((
        Floater {
            text,
            tint,
            origin: position,
            timer: 0.0,
        },
        Transform::from_xyz(position.x, 0.0, position.y),
    ));
}

fn tick_floaters(
    time: Res<Time>,
    mut commands: Commands,
    mut floaters: Query<(Entity, &mut Floater, &mut Transform)>,
) {
    for (entity, mut floater, mut transform) in &mut floaters {
        floater.timer += time.delta_secs();
        if floater.timer >= DISPLAY_DURATION {
            commands.entity(entity).despawn();
            continue;
        }
        transform.translation.y = floater.height();
    }
}
