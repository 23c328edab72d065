//! Notification capability and its in-process implementation.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, instrument, trace};

use crate::code::LobbyCode;
use crate::game::ConnId;
use crate::protocol::{GameEvent, ServerMessage};

/// Recipient of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A single connection.
    Connection(ConnId),
    /// Every connection in a lobby's room.
    Room(LobbyCode),
}

/// Delivers events to connected clients and tracks room membership.
///
/// Calls must not block: the engine invokes them while holding a session lock.
pub trait Notifier: Send + Sync {
    /// Sends `event` to `target`. Undeliverable events are dropped.
    fn notify(&self, event: GameEvent, target: Target);

    /// Adds a connection to a lobby's room.
    fn join_room(&self, code: &LobbyCode, conn: ConnId);

    /// Removes a connection from a lobby's room.
    fn leave_room(&self, code: &LobbyCode, conn: ConnId);

    /// Drops a room and all its memberships.
    fn close_room(&self, code: &LobbyCode);
}

#[derive(Debug, Default)]
struct HubState {
    connections: HashMap<ConnId, UnboundedSender<ServerMessage>>,
    rooms: HashMap<LobbyCode, BTreeSet<ConnId>>,
}

/// Rooms and per-connection outbound queues for one server process.
#[derive(Debug)]
pub struct RoomHub {
    state: Mutex<HubState>,
    next_conn: AtomicU64,
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            next_conn: AtomicU64::new(1),
        }
    }

    fn state(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocates a connection id and its outbound queue.
    #[instrument(skip(self))]
    pub fn register(&self) -> (ConnId, UnboundedReceiver<ServerMessage>) {
        let conn = ConnId(self.next_conn.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = unbounded_channel();
        self.state().connections.insert(conn, tx);
        debug!(%conn, "Connection registered");
        (conn, rx)
    }

    /// Forgets a connection and all its room memberships.
    #[instrument(skip(self))]
    pub fn unregister(&self, conn: ConnId) {
        let mut state = self.state();
        state.connections.remove(&conn);
        for members in state.rooms.values_mut() {
            members.remove(&conn);
        }
        state.rooms.retain(|_, members| !members.is_empty());
        debug!(%conn, "Connection unregistered");
    }

    /// Sends a frame to one connection. Returns whether it was queued.
    pub fn send(&self, conn: ConnId, message: ServerMessage) -> bool {
        match self.state().connections.get(&conn) {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Members of a room.
    pub fn members(&self, code: &LobbyCode) -> Vec<ConnId> {
        self.state()
            .rooms
            .get(code)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Notifier for RoomHub {
    #[instrument(level = "trace", skip(self, event), fields(event = event.name()))]
    fn notify(&self, event: GameEvent, target: Target) {
        let state = self.state();
        let recipients: Vec<ConnId> = match &target {
            Target::Connection(conn) => vec![*conn],
            Target::Room(code) => state
                .rooms
                .get(code)
                .map(|members| members.iter().copied().collect())
                .unwrap_or_default(),
        };
        trace!(event = event.name(), ?target, recipients = recipients.len(), "Notify");
        for conn in recipients {
            if let Some(tx) = state.connections.get(&conn) {
                let _ = tx.send(ServerMessage::Event {
                    event: event.clone(),
                });
            }
        }
    }

    #[instrument(skip(self))]
    fn join_room(&self, code: &LobbyCode, conn: ConnId) {
        debug!("Joining room");
        self.state()
            .rooms
            .entry(code.clone())
            .or_default()
            .insert(conn);
    }

    #[instrument(skip(self))]
    fn leave_room(&self, code: &LobbyCode, conn: ConnId) {
        let mut state = self.state();
        if let Some(members) = state.rooms.get_mut(code) {
            members.remove(&conn);
            if members.is_empty() {
                state.rooms.remove(code);
            }
        }
    }

    #[instrument(skip(self))]
    fn close_room(&self, code: &LobbyCode) {
        if let Some(members) = self.state().rooms.remove(code) {
            debug!(members = members.len(), "Room closed");
        }
    }
}
