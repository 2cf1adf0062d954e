//! Lobby and duel listing DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ParticipantSummary, SessionSummary};

/// Response body for `GET /players`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerListResponse {
    /// Idle participants in registration order.
    pub data: Vec<ParticipantSummary>,
    /// Number of idle participants.
    pub count: usize,
}

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    /// Live duels.
    pub data: Vec<SessionSummary>,
    /// Number of live duels.
    pub count: usize,
}
