//! Connection registry and room broadcaster.
//!
//! The registry is the single source of truth for live connections. All
//! mutations and every fan-out run under one lock, so a broadcast observes a
//! consistent membership snapshot and two publishes to the same room reach
//! each member in emission order.
//!
//! Delivery never blocks: each connection owns a bounded outbox and an event
//! that does not fit is dropped for that connection only.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use super::{ConnectionId, RoomName, ServerEvent};

/// Default per-connection outbox capacity.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

/// Identity label recorded for unauthenticated connections.
pub const ANONYMOUS: &str = "anonymous";

/// Read-only view of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub principal_username: String,
    pub connected_at: DateTime<Utc>,
    pub rooms: Vec<RoomName>,
}

/// Counts from a single fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    /// Outbox full; the event was discarded for that connection.
    pub dropped: usize,
    /// The receiving side has already gone away.
    pub closed: usize,
}

struct Entry {
    principal_username: String,
    connected_at: DateTime<Utc>,
    rooms: HashSet<RoomName>,
    outbox: mpsc::Sender<ServerEvent>,
}

/// Lock-guarded map of live connections.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Entry>>,
    outbox_capacity: usize,
    clock: Arc<dyn Clock>,
}

/// A registered connection. Dropping it removes the connection.
pub struct Connection {
    id: ConnectionId,
    events: mpsc::Receiver<ServerEvent>,
    registry: Arc<ConnectionRegistry>,
}

impl Connection {
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Next outbound event; `None` once the registry has forgotten us.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.registry.disconnect(self.id);
    }
}

fn send(id: ConnectionId, entry: &Entry, event: &ServerEvent, delivery: &mut Delivery) {
    match entry.outbox.try_send(event.clone()) {
        Ok(()) => delivery.delivered += 1,
        Err(TrySendError::Full(_)) => {
            warn!(connection_id = %id, event = event.name(), "outbox full; dropping event");
            delivery.dropped += 1;
        }
        Err(TrySendError::Closed(_)) => {
            debug!(connection_id = %id, event = event.name(), "connection gone; dropping event");
            delivery.closed += 1;
        }
    }
}

impl ConnectionRegistry {
    pub fn new(outbox_capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            outbox_capacity: outbox_capacity.max(1),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Entry>> {
        // Critical sections never leave the map half-updated.
        self.connections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a connection, acknowledge it privately, then broadcast the
    /// new connection count to everyone.
    pub fn connect(self: &Arc<Self>, principal_username: Option<&str>) -> Connection {
        let id = ConnectionId::random();
        let (outbox, events) = mpsc::channel(self.outbox_capacity);
        let principal_username = principal_username.unwrap_or(ANONYMOUS).to_owned();

        let mut connections = self.lock();
        connections.insert(
            id,
            Entry {
                principal_username: principal_username.clone(),
                connected_at: self.clock.utc(),
                rooms: HashSet::new(),
                outbox,
            },
        );
        if let Some(entry) = connections.get(&id) {
            send(id, entry, &ServerEvent::connected(id), &mut Delivery::default());
        }
        Self::broadcast_count(&connections);
        drop(connections);

        info!(connection_id = %id, principal = %principal_username, "connection opened");
        Connection {
            id,
            events,
            registry: Arc::clone(self),
        }
    }

    /// Remove a connection and broadcast the new count. Idempotent.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut connections = self.lock();
        let removed = connections.remove(&id).is_some();
        if removed {
            Self::broadcast_count(&connections);
        }
        drop(connections);
        if removed {
            info!(connection_id = %id, "connection closed");
        }
        removed
    }

    /// Add room membership and acknowledge to the requester only.
    pub fn join(&self, id: ConnectionId, room: RoomName) -> bool {
        let mut connections = self.lock();
        let Some(entry) = connections.get_mut(&id) else {
            return false;
        };
        entry.rooms.insert(room.clone());
        debug!(connection_id = %id, %room, "joined room");
        send(id, entry, &ServerEvent::RoomJoined { room }, &mut Delivery::default());
        true
    }

    /// Remove room membership and acknowledge to the requester only.
    pub fn leave(&self, id: ConnectionId, room: RoomName) -> bool {
        let mut connections = self.lock();
        let Some(entry) = connections.get_mut(&id) else {
            return false;
        };
        entry.rooms.remove(&room);
        debug!(connection_id = %id, %room, "left room");
        send(id, entry, &ServerEvent::RoomLeft { room }, &mut Delivery::default());
        true
    }

    /// Deliver `event` to every member of `room`.
    pub fn publish_to_room(&self, room: &RoomName, event: &ServerEvent) -> Delivery {
        let connections = self.lock();
        let mut delivery = Delivery::default();
        for (id, entry) in connections.iter().filter(|(_, e)| e.rooms.contains(room)) {
            send(*id, entry, event, &mut delivery);
        }
        delivery
    }

    /// Deliver `event` to one connection. `false` if it is not registered.
    pub fn unicast(&self, id: ConnectionId, event: &ServerEvent) -> bool {
        let connections = self.lock();
        let Some(entry) = connections.get(&id) else {
            return false;
        };
        let mut delivery = Delivery::default();
        send(id, entry, event, &mut delivery);
        delivery.delivered == 1
    }

    /// Deliver `event` to every live connection.
    pub fn broadcast(&self, event: &ServerEvent) -> Delivery {
        let connections = self.lock();
        let mut delivery = Delivery::default();
        for (id, entry) in connections.iter() {
            send(*id, entry, event, &mut delivery);
        }
        delivery
    }

    fn broadcast_count(connections: &HashMap<ConnectionId, Entry>) {
        let event = ServerEvent::ClientCount {
            count: connections.len(),
        };
        let mut delivery = Delivery::default();
        for (id, entry) in connections {
            send(*id, entry, &event, &mut delivery);
        }
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn room_size(&self, room: &RoomName) -> usize {
        self.lock()
            .values()
            .filter(|entry| entry.rooms.contains(room))
            .count()
    }

    #[must_use]
    pub fn info(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.lock().get(&id).map(|entry| {
            let mut rooms: Vec<_> = entry.rooms.iter().cloned().collect();
            rooms.sort();
            ConnectionInfo {
                id,
                principal_username: entry.principal_username.clone(),
                connected_at: entry.connected_at,
                rooms,
            }
        })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
