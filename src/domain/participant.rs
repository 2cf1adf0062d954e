//! Lobby participant and its public summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::ConnectionId;

/// A connection that has joined the lobby under a display name.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Connection handle (immutable after join).
    pub id: ConnectionId,
    /// Trimmed display name, unique among registered participants.
    pub name: String,
    /// `true` while the participant is playing a duel.
    pub busy: bool,
    /// When the participant joined the lobby.
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    /// Creates an idle participant.
    #[must_use]
    pub fn new(id: ConnectionId, name: String) -> Self {
        Self {
            id,
            name,
            busy: false,
            joined_at: Utc::now(),
        }
    }
}

/// What other clients see of an idle participant in `updatePlayers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ParticipantSummary {
    /// Handle to pass as `targetId` when challenging.
    pub id: ConnectionId,
    /// Display name.
    pub name: String,
}

impl From<&Participant> for ParticipantSummary {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
        }
    }
}
