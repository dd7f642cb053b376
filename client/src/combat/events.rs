//! Combat message and event definitions for the host side of the core.
//!
//! Input chain:    [`MoveInput`], [`BlockInput`], [`AttackPressed`] → core
//! Outcome chain:  core → [`HitLanded`], [`AttackRejected`], [`RewardEarned`]
//! Feedback chain: core → [`FeedbackRequested`] → time, shake, floaters, views
//!
//! Convention: intents use noun form (hasn't happened yet), outcomes and
//! feedback use past tense (it happened).

use bevy::prelude::*;
use skirmish_shared::feedback::FeedbackRequest;
use skirmish_shared::player::Reward;
use skirmish_shared::registry::EntityId;
use skirmish_shared::world::AttackRejection;
use skirmish_shared::zones::HitZone;

// ── Intent ──────────────────────────────────────────────────────────

/// Intent: move the local player this frame. Not normalized.
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct MoveInput(pub Vec2);

/// Intent: raise or lower the shield.
#[derive(Message, Clone, Copy, Debug)]
pub struct BlockInput(pub bool);

/// Intent: the attack button was pressed.
#[derive(Message, Clone, Copy, Debug)]
pub struct AttackPressed {
    /// Pointer projected onto the ground, if the ray hit it.
    pub target: Option<Vec2>,
    pub pointer_delta: Vec2,
}

// ── Outcome ─────────────────────────────────────────────────────────

/// Outcome: a local melee swing connected.
#[derive(Event, Debug, Clone)]
pub struct HitLanded {
    pub entity: EntityId,
    pub zone: HitZone,
    pub damage: i32,
    pub killed: bool,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct AttackRejected(pub AttackRejection);

/// Outcome: the local player earned xp and loot for a kill.
#[derive(Event, Debug, Clone)]
pub struct RewardEarned(pub Reward);

// ── Feedback ────────────────────────────────────────────────────────

/// Feedback: the core asked for something to be shown or felt.
#[derive(Event, Debug, Clone)]
pub struct FeedbackRequested(pub FeedbackRequest);
