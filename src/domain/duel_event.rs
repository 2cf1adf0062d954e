//! Outbound events and the audience each one is addressed to.
//!
//! Every state change is turned into one or more [`DuelEvent`]s and
//! published through the [`super::EventBus`] wrapped in a [`BusMessage`].
//! WebSocket connections forward the deliveries addressed to them.

use serde::Serialize;

use super::duel_session::Scores;
use super::participant::ParticipantSummary;
use super::{ConnectionId, SessionId};

/// Server → client event, serialized as `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum DuelEvent {
    /// Tells a fresh connection its handle.
    Welcome {
        /// Handle assigned to the connection.
        connection_id: ConnectionId,
    },
    /// The requested display name is taken.
    NameConflict,
    /// Idle participants in registration order.
    UpdatePlayers(Vec<ParticipantSummary>),
    /// Someone wants to duel the receiving connection.
    ChallengeReceived {
        /// Handle to pass back with `acceptChallenge`.
        challenger_id: ConnectionId,
        /// Challenger display name.
        challenger_name: String,
    },
    /// A command from the receiving connection was refused, with the
    /// human-readable reason.
    Error(String),
    /// Current score of both players.
    UpdateScores(Scores),
    /// The duel has started.
    GameStart {
        /// Duel identifier to echo with answers and timeouts.
        session_id: SessionId,
    },
    /// The next round is open.
    NewQuestion {
        /// Prompt text.
        question: String,
        /// Options in display order.
        options: Vec<String>,
        /// 1-based round number.
        round: usize,
        /// Number of rounds in the duel.
        total_rounds: usize,
        /// Seconds until the round times out.
        deadline_secs: u64,
    },
    /// The round has been settled; answers are no longer accepted.
    DisableOptions,
    /// The duel is over.
    GameOver(GameOverData),
}

/// Payload of `gameOver`.
///
/// A duel that ran its course sends the JSON-encoded score map as a bare
/// string. A forfeit wraps it together with the player who left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GameOverData {
    /// Every round was played.
    Completed(String),
    /// A player disconnected mid-duel.
    Forfeited {
        /// Final scores as a JSON-encoded object.
        scores: String,
        /// Player whose disconnect ended the duel.
        #[serde(rename = "forfeitedBy")]
        forfeited_by: ConnectionId,
    },
}

impl GameOverData {
    /// JSON-encoded final scores.
    #[must_use]
    pub fn scores(&self) -> &str {
        match self {
            Self::Completed(scores) | Self::Forfeited { scores, .. } => scores,
        }
    }

    /// Player whose disconnect ended the duel, if any.
    #[must_use]
    pub const fn forfeited_by(&self) -> Option<ConnectionId> {
        match self {
            Self::Completed(_) => None,
            Self::Forfeited { forfeited_by, .. } => Some(*forfeited_by),
        }
    }
}

impl DuelEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::NameConflict => "nameConflict",
            Self::UpdatePlayers(_) => "updatePlayers",
            Self::ChallengeReceived { .. } => "challengeReceived",
            Self::Error(_) => "error",
            Self::UpdateScores(_) => "updateScores",
            Self::GameStart { .. } => "gameStart",
            Self::NewQuestion { .. } => "newQuestion",
            Self::DisableOptions => "disableOptions",
            Self::GameOver(_) => "gameOver",
        }
    }

    /// Builds a `gameOver` event, encoding the scores as a JSON string.
    #[must_use]
    pub fn game_over(scores: &Scores, forfeited_by: Option<ConnectionId>) -> Self {
        let scores = serde_json::to_string(scores).unwrap_or_else(|_| "{}".to_string());
        Self::GameOver(match forfeited_by {
            Some(forfeited_by) => GameOverData::Forfeited {
                scores,
                forfeited_by,
            },
            None => GameOverData::Completed(scores),
        })
    }
}

/// Who receives a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// A single connection.
    Connection(ConnectionId),
    /// Both players of a duel (the session scope).
    Session(SessionId),
    /// Every open connection.
    All,
}

/// Item carried on the event bus.
///
/// Scope membership changes travel on the same channel as deliveries, so a
/// connection always joins a session scope before it sees that scope's
/// first event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusMessage {
    /// Send an event to an audience.
    Deliver {
        /// Recipients.
        audience: Audience,
        /// Event to send.
        event: DuelEvent,
    },
    /// Add a connection to a session scope.
    JoinScope {
        /// Connection joining.
        connection: ConnectionId,
        /// Scope joined.
        session_id: SessionId,
    },
    /// Remove a connection from a session scope.
    LeaveScope {
        /// Connection leaving.
        connection: ConnectionId,
        /// Scope left.
        session_id: SessionId,
    },
}
