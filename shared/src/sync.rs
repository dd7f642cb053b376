//! Peer wire payloads and the roster of other players.
//!
//! Messages are JSON objects `{ "event": ..., "payload": {...} }` with
//! camelCase payload fields. Nothing is acknowledged or retried.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use crate::combat::{CombatClass, SwingDirection};
use crate::error::WireError;
use crate::registry::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackBroadcast {
    pub player_id: SmolStr,
    pub class: CombatClass,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_direction: Option<SwingDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobHitBroadcast {
    pub mob_id: EntityId,
    pub damage: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateBroadcast {
    pub player_id: SmolStr,
    pub class: CombatClass,
    pub x: f32,
    pub y: f32,
    pub hp: i32,
    pub max_hp: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum PeerEvent {
    Attack(AttackBroadcast),
    MobHit(MobHitBroadcast),
    PlayerState(PlayerStateBroadcast),
}

impl PeerEvent {
    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Player that sent this event, when the payload names one.
    pub fn sender(&self) -> Option<&str> {
        match self {
            Self::Attack(a) => Some(a.player_id.as_str()),
            Self::PlayerState(s) => Some(s.player_id.as_str()),
            Self::MobHit(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeerInfo {
    pub class: CombatClass,
    /// Rendered position, eased toward `target`.
    pub position: Vec2,
    pub target: Vec2,
    pub hp: i32,
    pub max_hp: i32,
    pub last_seen: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PeerRoster {
    peers: HashMap<SmolStr, PeerInfo>,
}

impl PeerRoster {
    pub fn get(&self, id: &str) -> Option<&PeerInfo> {
        self.peers.get(id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &PeerInfo)> {
        self.peers.iter()
    }

    /// Record a state report. A first sighting snaps into place.
    pub fn observe(&mut self, state: &PlayerStateBroadcast, now: f64) {
        let target = Vec2::new(state.x, state.y);
        let peer = self
            .peers
            .entry(state.player_id.clone())
            .or_insert_with(|| {
                debug!("Peer {} joined", state.player_id);
                PeerInfo {
                    class: state.class,
                    position: target,
                    target,
                    hp: state.hp,
                    max_hp: state.max_hp,
                    last_seen: now,
                }
            });
        peer.class = state.class;
        peer.target = target;
        peer.hp = state.hp;
        peer.max_hp = state.max_hp;
        peer.last_seen = now;
    }

    /// Any message from a known peer proves it is still there.
    pub fn touch(&mut self, id: &str, now: f64) {
        if let Some(peer) = self.peers.get_mut(id) {
            peer.last_seen = now;
        }
    }

    /// Close `factor` of the remaining gap to each peer's reported position.
    pub fn smooth(&mut self, factor: f32) {
        for peer in self.peers.values_mut() {
            peer.position = peer.position.lerp(peer.target, factor.clamp(0.0, 1.0));
        }
    }

    /// Drop peers silent for `timeout` seconds. Returns who left.
    pub fn evict_stale(&mut self, now: f64, timeout: f64) -> Vec<SmolStr> {
        let stale: Vec<SmolStr> = self
            .peers
            .iter()
            .filter(|(_, p)| now - p.last_seen > timeout)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            self.peers.remove(id);
            debug!("Peer {id} timed out");
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn attack_wire_shape() {
        let event = PeerEvent::Attack(AttackBroadcast {
            player_id: "p1".into(),
            class: CombatClass::Warrior,
            x: 10.0,
            y: 20.0,
            angle: 0.5,
            swing_direction: Some(SwingDirection::Overhead),
        });
        let value: serde_json::Value =
            serde_json::from_str(&event.encode().expect("encodes")).expect("json");
        assert_eq!(
            value,
            json!({
                "event": "attack",
                "payload": {
                    "playerId": "p1",
                    "class": "warrior",
                    "x": 10.0,
                    "y": 20.0,
                    "angle": 0.5,
                    "swingDirection": "overhead"
                }
            })
        );
    }

    #[test]
    fn swing_direction_is_optional() {
        let text = r#"{"event":"attack","payload":{"playerId":"p2","class":"mage","x":1,"y":2,"angle":0}}"#;
        let PeerEvent::Attack(attack) = PeerEvent::decode(text).expect("decodes") else {
            panic!("wrong event");
        };
        assert_eq!(attack.swing_direction, None);
        assert_eq!(attack.class, CombatClass::Mage);
    }

    #[test]
    fn mob_hit_wire_shape() {
        let text = r#"{"event":"mob_hit","payload":{"mobId":"X","damage":20}}"#;
        assert_eq!(
            PeerEvent::decode(text).expect("decodes"),
            PeerEvent::MobHit(MobHitBroadcast {
                mob_id: "X".into(),
                damage: 20
            })
        );
    }

    #[test]
    fn garbage_is_a_wire_error() {
        assert!(PeerEvent::decode("{\"event\":\"teleport\",\"payload\":{}}").is_err());
        assert!(PeerEvent::decode("not json").is_err());
    }

    fn state(x: f32) -> PlayerStateBroadcast {
        PlayerStateBroadcast {
            player_id: "p1".into(),
            class: CombatClass::Archer,
            x,
            y: 0.0,
            hp: 80,
            max_hp: 100,
        }
    }

    #[test]
    fn roster_smooths_and_evicts() {
        let mut roster = PeerRoster::default();
        roster.observe(&state(0.0), 0.0);
        roster.observe(&state(100.0), 0.5);
        roster.smooth(0.1);
        let peer = roster.get("p1").expect("known");
        assert_relative_eq!(peer.position.x, 10.0);
        assert_eq!(peer.hp, 80);

        assert!(roster.evict_stale(10.5, 10.0).is_empty());
        assert_eq!(roster.evict_stale(10.6, 10.0), vec![SmolStr::from("p1")]);
        assert!(roster.is_empty());
    }
}
