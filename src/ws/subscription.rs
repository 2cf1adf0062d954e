//! Per-connection session scope membership.
//!
//! Tracks which duels a WebSocket connection belongs to and decides which
//! bus messages are forwarded to it.

use std::collections::HashSet;

use crate::domain::{Audience, BusMessage, ConnectionId, DuelEvent, SessionId};

/// Session scopes joined by a single WebSocket connection.
#[derive(Debug)]
pub struct SessionScopes {
    connection: ConnectionId,
    sessions: HashSet<SessionId>,
}

impl SessionScopes {
    /// Creates an empty scope set for `connection`.
    #[must_use]
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            sessions: HashSet::new(),
        }
    }

    /// Connection these scopes belong to.
    #[must_use]
    pub const fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Applies a bus message, returning the event to forward, if any.
    ///
    /// Scope joins and leaves addressed to this connection update the set
    /// and are never forwarded themselves.
    pub fn route<'a>(&mut self, message: &'a BusMessage) -> Option<&'a DuelEvent> {
        match message {
            BusMessage::Deliver { audience, event } => self.matches(*audience).then_some(event),
            BusMessage::JoinScope {
                connection,
                session_id,
            } => {
                if *connection == self.connection {
                    self.sessions.insert(*session_id);
                }
                None
            }
            BusMessage::LeaveScope {
                connection,
                session_id,
            } => {
                if *connection == self.connection {
                    self.sessions.remove(session_id);
                }
                None
            }
        }
    }

    /// Returns `true` if this connection is part of `audience`.
    #[must_use]
    pub fn matches(&self, audience: Audience) -> bool {
        match audience {
            Audience::All => true,
            Audience::Connection(id) => id == self.connection,
            Audience::Session(session_id) => self.sessions.contains(&session_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliver(audience: Audience) -> BusMessage {
        BusMessage::Deliver {
            audience,
            event: DuelEvent::DisableOptions,
        }
    }

    #[test]
    fn broadcast_reaches_everyone() {
        let mut scopes = SessionScopes::new(ConnectionId::new());
        assert!(scopes.route(&deliver(Audience::All)).is_some());
    }

    #[test]
    fn direct_delivery_only_reaches_addressee() {
        let me = ConnectionId::new();
        let mut scopes = SessionScopes::new(me);
        assert!(scopes.route(&deliver(Audience::Connection(me))).is_some());
        assert!(
            scopes
                .route(&deliver(Audience::Connection(ConnectionId::new())))
                .is_none()
        );
    }

    #[test]
    fn session_delivery_requires_joined_scope() {
        let me = ConnectionId::new();
        let session_id = SessionId::new();
        let mut scopes = SessionScopes::new(me);
        assert!(scopes.route(&deliver(Audience::Session(session_id))).is_none());

        let join = BusMessage::JoinScope {
            connection: me,
            session_id,
        };
        assert!(scopes.route(&join).is_none());
        assert!(scopes.matches(Audience::Session(session_id)));
        assert!(scopes.route(&deliver(Audience::Session(session_id))).is_some());

        let leave = BusMessage::LeaveScope {
            connection: me,
            session_id,
        };
        assert!(scopes.route(&leave).is_none());
        assert!(scopes.route(&deliver(Audience::Session(session_id))).is_none());
    }

    #[test]
    fn other_connections_joins_are_ignored() {
        let mut scopes = SessionScopes::new(ConnectionId::new());
        let session_id = SessionId::new();
        let join = BusMessage::JoinScope {
            connection: ConnectionId::new(),
            session_id,
        };
        scopes.route(&join);
        assert!(!scopes.matches(Audience::Session(session_id)));
    }
}
