//! WebSocket message types: envelope, inbound commands and frame builders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ConnectionId, DuelEvent, SessionId};
use crate::error::DuelError;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for commands; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type", default = "default_msg_type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

fn default_msg_type() -> WsMessageType {
    WsMessageType::Command
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands a client can send, as `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientCommand {
    /// Enter the lobby under a display name.
    Join {
        /// Display name; surrounding whitespace is ignored.
        name: String,
    },
    /// Invite an idle participant to a duel.
    Challenge {
        /// Handle of the participant to challenge.
        target_id: ConnectionId,
    },
    /// Accept a received challenge.
    AcceptChallenge {
        /// Handle from the `challengeReceived` event.
        challenger_id: ConnectionId,
    },
    /// Answer the current question.
    SubmitAnswer {
        /// Chosen option text.
        answer: String,
        /// Duel the answer belongs to.
        session_id: SessionId,
    },
    /// The client's countdown for the current round ran out.
    Timeout {
        /// Duel whose round timed out.
        session_id: SessionId,
    },
    /// Ask for a fresh `updatePlayers` broadcast.
    RequestPlayerListUpdate,
}

impl ClientCommand {
    /// Returns the wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Challenge { .. } => "challenge",
            Self::AcceptChallenge { .. } => "acceptChallenge",
            Self::SubmitAnswer { .. } => "submitAnswer",
            Self::Timeout { .. } => "timeout",
            Self::RequestPlayerListUpdate => "requestPlayerListUpdate",
        }
    }
}

/// Parses an inbound text frame into a command.
///
/// # Errors
///
/// Returns [`DuelError::InvalidRequest`] if the frame is not a JSON envelope
/// or its payload is not a known command.
pub fn parse_command(text: &str) -> Result<(String, ClientCommand), DuelError> {
    let msg = serde_json::from_str::<WsMessage>(text)
        .map_err(|_| DuelError::InvalidRequest("malformed JSON".to_string()))?;
    let command = serde_json::from_value::<ClientCommand>(msg.payload)
        .map_err(|err| DuelError::InvalidRequest(format!("unknown command: {err}")))?;
    Ok((msg.id, command))
}

/// Wraps an outbound event in an envelope and encodes it.
#[must_use]
pub fn event_frame(event: &DuelEvent) -> Option<String> {
    let msg_type = match event {
        DuelEvent::Error(_) => WsMessageType::Error,
        _ => WsMessageType::Event,
    };
    let msg = WsMessage {
        id: uuid::Uuid::new_v4().to_string(),
        msg_type,
        timestamp: Utc::now(),
        payload: serde_json::to_value(event).unwrap_or_default(),
    };
    serde_json::to_string(&msg).ok()
}

/// Encodes an immediate error reply to a command that could not be parsed.
#[must_use]
pub fn error_frame(request_id: &str, err: &DuelError) -> Option<String> {
    let msg = WsMessage {
        id: request_id.to_string(),
        msg_type: WsMessageType::Error,
        timestamp: Utc::now(),
        payload: serde_json::to_value(DuelEvent::Error(err.to_string())).unwrap_or_default(),
    };
    serde_json::to_string(&msg).ok()
}
