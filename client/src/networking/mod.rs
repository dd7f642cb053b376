//! Peer-to-peer combat sync.
//!
//! Every client broadcasts its attacks, mob hits and a periodic state report.
//! Nothing is acknowledged or retried; a failed send is logged and dropped.

use bevy::prelude::*;
use skirmish_shared::WireError;
use skirmish_shared::sync::PeerEvent;
use thiserror::Error;

use crate::combat::{Combat, FrameSet};
use crate::models::Settings;

mod loopback;

pub use loopback::{LoopbackHub, LoopbackLink};

pub fn plugin(app: &mut App) {
    let interval = app
        .world()
        .get_resource::<Settings>()
        .map_or(0.5, |s| s.combat.sync.state_interval_secs);

    app.insert_resource(StateSyncTimer::new(interval))
        .init_resource::<LinkStats>()
        .add_systems(Update, receive_peer_events.in_set(FrameSet::Receive))
        .add_systems(
            Update,
            (queue_state_sync, send_outbox).chain().in_set(FrameSet::Sync),
        );
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer link closed")]
    Closed,
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// A broadcast channel to every other peer in the session.
pub trait PeerTransport: Send + Sync + 'static {
    fn send(&self, message: &str) -> Result<(), TransportError>;

    /// Everything that arrived since the last poll.
    fn poll(&self) -> Vec<String>;
}

/// Present only when the session has peers.
#[derive(Resource)]
pub struct PeerLink(pub Box<dyn PeerTransport>);

impl PeerLink {
    pub fn new(transport: impl PeerTransport) -> Self {
        Self(Box::new(transport))
    }

    pub fn send_event(&self, event: &PeerEvent) -> Result<(), TransportError> {
        let text = event.encode()?;
        self.0.send(&text)
    }
}

/// Rate limit for the position and HP report.
#[derive(Resource)]
pub struct StateSyncTimer(pub Timer);

impl StateSyncTimer {
    pub fn new(interval_secs: f32) -> Self {
        Self(Timer::from_seconds(interval_secs, TimerMode::Repeating))
    }
}

#[derive(Resource, Default, Debug)]
pub struct LinkStats {
    pub sent: u64,
    pub received: u64,
    pub malformed: u64,
    pub failed: u64,
}

fn receive_peer_events(
    real: Res<Time<Real>>,
    link: Option<Res<PeerLink>>,
    mut combat: ResMut<Combat>,
    mut stats: ResMut<LinkStats>,
) {
    let Some(link) = link else {
        return;
    };
    let now = real.elapsed_secs_f64();
    for message in link.0.poll() {
        match PeerEvent::decode(&message) {
            Ok(event) => {
                stats.received += 1;
                combat.receive(event, now);
            }
            Err(e) => {
                stats.malformed += 1;
                warn!("Dropped malformed peer message: {e}");
            }
        }
    }
}

/// Runs on real time so slow motion does not slow the report rate.
fn queue_state_sync(
    real: Res<Time<Real>>,
    mut timer: ResMut<StateSyncTimer>,
    mut combat: ResMut<Combat>,
) {
    timer.0.tick(real.delta());
    if timer.0.just_finished() {
        combat.queue_state_broadcast();
    }
}

fn send_outbox(
    link: Option<Res<PeerLink>>,
    mut combat: ResMut<Combat>,
    mut stats: ResMut<LinkStats>,
) {
    let outbox = combat.drain_outbox();
    let Some(link) = link else {
        return;
    };
    for event in &outbox {
        match link.send_event(event) {
            Ok(()) => stats.sent += 1,
            Err(e) => {
                stats.failed += 1;
                warn!("Failed to send peer event: {e}");
            }
        }
    }
}
