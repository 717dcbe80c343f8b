use std::collections::HashMap;

use tokio::sync::mpsc;

use arena_core::{PlayerId, PresenceUser, ServerEvent};

use crate::connection::ConnId;

const BROADCAST_NAME: &str = "Broadcast";

struct PresenceEntry {
    name: String,
    conn: ConnId,
    tx: mpsc::Sender<String>,
}

/// Maps each connected identity to its live transport endpoint. The endpoint
/// is a handle to the connection's writer task; it is replaced wholesale on
/// reconnect and dropped on disconnect.
///
/// Owned by the dispatcher task alone, so a plain map suffices: every
/// mutation happens inside the dispatcher's run-to-completion loop.
///
/// The broadcast pseudo-identity (id 0) is always present in snapshots but
/// never resolves to an endpoint.
#[derive(Default)]
pub struct PlayerRegistry {
    entries: HashMap<PlayerId, PresenceEntry>,
    order: Vec<PlayerId>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `id`. Last write wins; a reconnect
    /// keeps the identity's position in the presence snapshot.
    pub fn register(&mut self, id: PlayerId, name: impl Into<String>, conn: ConnId, tx: mpsc::Sender<String>) {
        let entry = PresenceEntry { name: name.into(), conn, tx };
        if self.entries.insert(id, entry).is_none() {
            self.order.push(id);
        }
    }

    /// Remove the entry for `id` if present. Safe to call repeatedly.
    pub fn unregister(&mut self, id: PlayerId) -> bool {
        if self.entries.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|o| *o != id);
        true
    }

    /// The live endpoint for `id`. Absence is a normal outcome; the
    /// participant may simply be offline.
    pub fn resolve(&self, id: PlayerId) -> Option<&mpsc::Sender<String>> {
        self.entries.get(&id).map(|e| &e.tx)
    }

    /// The connection currently bound to `id`, used to ignore teardown
    /// signals from a connection that has already been replaced.
    pub fn conn_of(&self, id: PlayerId) -> Option<&ConnId> {
        self.entries.get(&id).map(|e| &e.conn)
    }

    pub fn name_of(&self, id: PlayerId) -> Option<&str> {
        self.entries.get(&id).map(|e| e.name.as_str())
    }

    /// Whether `id` is addressable: connected, or the broadcast identity.
    pub fn contains(&self, id: PlayerId) -> bool {
        id.is_broadcast() || self.entries.contains_key(&id)
    }

    /// Presence list in insertion order, broadcast identity first.
    pub fn snapshot(&self) -> Vec<PresenceUser> {
        let mut users = Vec::with_capacity(self.order.len() + 1);
        users.push(PresenceUser {
            id: PlayerId::BROADCAST,
            name: BROADCAST_NAME.to_string(),
        });
        for id in &self.order {
            if let Some(entry) = self.entries.get(id) {
                users.push(PresenceUser {
                    id: *id,
                    name: entry.name.clone(),
                });
            }
        }
        users
    }

    pub fn connected_count(&self) -> usize {
        self.entries.len()
    }

    /// Emit an event to one endpoint, fire-and-forget. A full or closed send
    /// queue drops the event; delivery is never retried.
    pub fn send_to(&self, id: PlayerId, event: &ServerEvent) -> bool {
        let Some(entry) = self.entries.get(&id) else {
            return false;
        };
        let Ok(frame) = serde_json::to_string(event) else {
            return false;
        };
        match entry.tx.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(user = %id, event = event.name(), "send queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Emit an event to every connected endpoint.
    pub fn broadcast(&self, event: &ServerEvent) {
        self.broadcast_filtered(event, |_| true);
    }

    /// Emit an event to every connected endpoint except `excluded`.
    pub fn broadcast_except(&self, excluded: PlayerId, event: &ServerEvent) {
        self.broadcast_filtered(event, |id| id != excluded);
    }

    fn broadcast_filtered(&self, event: &ServerEvent, keep: impl Fn(PlayerId) -> bool) {
        let Ok(frame) = serde_json::to_string(event) else {
            return;
        };
        for (id, entry) in &self.entries {
            if keep(*id) {
                let _ = entry.tx.try_send(frame.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> PlayerId {
        PlayerId::new(n)
    }

    fn register(reg: &mut PlayerRegistry, n: u64, name: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(8);
        reg.register(p(n), name, ConnId::new(), tx);
        rx
    }

    #[test]
    fn resolve_follows_the_latest_registration() {
        let mut reg = PlayerRegistry::new();
        let _rx1 = register(&mut reg, 1, "ada");
        assert!(reg.resolve(p(1)).is_some());

        // reconnect replaces the endpoint wholesale
        let (tx2, mut rx2) = mpsc::channel(8);
        reg.register(p(1), "ada", ConnId::new(), tx2);
        assert_eq!(reg.connected_count(), 1);

        assert!(reg.send_to(p(1), &ServerEvent::StartTurn));
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn unregister_twice_is_a_no_op() {
        let mut reg = PlayerRegistry::new();
        let _rx = register(&mut reg, 1, "ada");
        assert!(reg.unregister(p(1)));
        assert!(!reg.unregister(p(1)));
        assert!(reg.resolve(p(1)).is_none());
    }

    #[test]
    fn snapshot_keeps_insertion_order_with_broadcast_first() {
        let mut reg = PlayerRegistry::new();
        let _rx1 = register(&mut reg, 5, "eve");
        let _rx2 = register(&mut reg, 2, "bob");
        let _rx3 = register(&mut reg, 9, "kim");
        reg.unregister(p(2));

        let names: Vec<_> = reg.snapshot().into_iter().map(|u| (u.id.get(), u.name)).collect();
        assert_eq!(
            names,
            vec![
                (0, "Broadcast".to_string()),
                (5, "eve".to_string()),
                (9, "kim".to_string()),
            ]
        );
    }

    #[test]
    fn reconnect_keeps_snapshot_position() {
        let mut reg = PlayerRegistry::new();
        let _rx1 = register(&mut reg, 5, "eve");
        let _rx2 = register(&mut reg, 2, "bob");
        let _rx3 = register(&mut reg, 5, "eve");

        let ids: Vec<_> = reg.snapshot().into_iter().map(|u| u.id.get()).collect();
        assert_eq!(ids, vec![0, 5, 2]);
    }

    #[test]
    fn broadcast_identity_is_addressable_but_unresolvable() {
        let reg = PlayerRegistry::new();
        assert!(reg.contains(PlayerId::BROADCAST));
        assert!(reg.resolve(PlayerId::BROADCAST).is_none());
        assert!(!reg.contains(p(1)));
    }

    #[test]
    fn send_to_unknown_identity_reports_failure() {
        let reg = PlayerRegistry::new();
        assert!(!reg.send_to(p(42), &ServerEvent::StartTurn));
    }

    #[test]
    fn send_to_full_queue_drops_the_event() {
        let mut reg = PlayerRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        reg.register(p(1), "ada", ConnId::new(), tx);
        assert!(reg.send_to(p(1), &ServerEvent::StartTurn));
        assert!(!reg.send_to(p(1), &ServerEvent::StartTurn));
    }

    #[test]
    fn broadcast_except_skips_the_sender() {
        let mut reg = PlayerRegistry::new();
        let mut rx1 = register(&mut reg, 1, "ada");
        let mut rx2 = register(&mut reg, 2, "bob");

        reg.broadcast_except(p(1), &ServerEvent::StartTurn);
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());

        reg.broadcast(&ServerEvent::StartTurn);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
