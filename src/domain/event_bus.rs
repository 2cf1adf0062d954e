//! Broadcast channel for outbound deliveries.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The service
//! layer publishes a [`BusMessage`] for every outbound event, and every
//! WebSocket connection subscribes and keeps the ones addressed to it.

use tokio::sync::broadcast;

use super::duel_event::{Audience, BusMessage, DuelEvent};
use super::{ConnectionId, SessionId};

/// Broadcast bus for [`BusMessage`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest messages are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusMessage>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a message to all subscribers.
    ///
    /// Returns the number of receivers that got it. With no receivers the
    /// message is silently dropped.
    pub fn publish(&self, message: BusMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    /// Sends `event` to a single connection.
    pub fn send_to(&self, connection: ConnectionId, event: DuelEvent) -> usize {
        self.deliver(Audience::Connection(connection), event)
    }

    /// Sends `event` to both players of a duel.
    pub fn to_session(&self, session_id: SessionId, event: DuelEvent) -> usize {
        self.deliver(Audience::Session(session_id), event)
    }

    /// Sends `event` to every connection.
    pub fn to_all(&self, event: DuelEvent) -> usize {
        self.deliver(Audience::All, event)
    }

    /// Adds a connection to a session scope.
    pub fn join_scope(&self, connection: ConnectionId, session_id: SessionId) -> usize {
        self.publish(BusMessage::JoinScope {
            connection,
            session_id,
        })
    }

    /// Removes a connection from a session scope.
    pub fn leave_scope(&self, connection: ConnectionId, session_id: SessionId) -> usize {
        self.publish(BusMessage::LeaveScope {
            connection,
            session_id,
        })
    }

    fn deliver(&self, audience: Audience, event: DuelEvent) -> usize {
        tracing::trace!(event = event.event_type_str(), ?audience, "publishing");
        self.publish(BusMessage::Deliver { audience, event })
    }

    /// Creates a new receiver that will get all future messages.
    ///
    /// Each WebSocket connection calls this once, before it registers
    /// anything, so it cannot miss its own replies.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
