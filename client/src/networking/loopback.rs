//! In-process peer hub. Links share one hub and each message fans out to
//! every other connected link.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use skirmish_shared::rng::CombatRng;

use super::{PeerTransport, TransportError};

#[derive(Clone, Default)]
pub struct LoopbackHub {
    members: Arc<Mutex<Vec<Option<Sender<String>>>>>,
}

impl LoopbackHub {
    pub fn connect(&self) -> LoopbackLink {
        let (tx, rx) = mpsc::channel();
        let mut members = self.members();
        members.push(Some(tx));
        LoopbackLink {
            slot: members.len() - 1,
            hub: self.clone(),
            inbox: Mutex::new(rx),
            loss: None,
        }
    }

    /// Cut a link off. Its later sends fail and nothing more reaches it.
    pub fn disconnect(&self, link: &LoopbackLink) {
        if let Some(slot) = self.members().get_mut(link.slot) {
            *slot = None;
        }
    }

    fn members(&self) -> MutexGuard<'_, Vec<Option<Sender<String>>>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct LoopbackLink {
    slot: usize,
    hub: LoopbackHub,
    inbox: Mutex<Receiver<String>>,
    loss: Option<(f32, Mutex<CombatRng>)>,
}

impl LoopbackLink {
    /// Drop this fraction of outgoing messages, to exercise lossy delivery.
    pub fn with_packet_loss(mut self, chance: f32, rng: CombatRng) -> Self {
        self.loss = Some((chance, Mutex::new(rng)));
        self
    }

    fn drops_next(&self) -> bool {
        self.loss.as_ref().is_some_and(|(chance, rng)| {
            rng.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .chance(*chance)
        })
    }
}

impl PeerTransport for LoopbackLink {
    fn send(&self, message: &str) -> Result<(), TransportError> {
        let members = self.hub.members();
        if members.get(self.slot).is_none_or(Option::is_none) {
            return Err(TransportError::Closed);
        }
        if self.drops_next() {
            return Ok(());
        }
        for (slot, member) in members.iter().enumerate() {
            if slot == self.slot {
                continue;
            }
            if let Some(tx) = member {
                // A peer that went away just misses the message.
                let _ = tx.send(message.to_owned());
            }
        }
        Ok(())
    }

    fn poll(&self) -> Vec<String> {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fans_out_to_everyone_else() {
        let hub = LoopbackHub::default();
        let a = hub.connect();
        let b = hub.connect();
        let c = hub.connect();

        a.send("hello").expect("sends");
        assert!(a.poll().is_empty());
        assert_eq!(b.poll(), vec!["hello".to_string()]);
        assert_eq!(c.poll(), vec!["hello".to_string()]);
        assert!(b.poll().is_empty());
    }

    #[test]
    fn disconnected_link_is_closed() {
        let hub = LoopbackHub::default();
        let a = hub.connect();
        let b = hub.connect();
        hub.disconnect(&b);

        assert!(matches!(b.send("x"), Err(TransportError::Closed)));
        a.send("y").expect("others still send");
        assert!(b.poll().is_empty());
    }

    #[test]
    fn total_loss_delivers_nothing() {
        let hub = LoopbackHub::default();
        let a = hub.connect().with_packet_loss(1.0, CombatRng::seeded(1));
        let b = hub.connect();

        for _ in 0..10 {
            a.send("lost").expect("loss is silent");
        }
        assert!(b.poll().is_empty());
    }
}
