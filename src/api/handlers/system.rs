//! Liveness probe with a snapshot of lobby occupancy.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Server clock at the time of the probe.
    pub checked_at: DateTime<Utc>,
    /// Lobby occupancy.
    pub lobby: LobbyCounters,
}

/// Occupancy counters reported by the health probe.
#[derive(Debug, Serialize, ToSchema)]
pub struct LobbyCounters {
    /// Open WebSocket connections, joined or not.
    pub connections: usize,
    /// Connections that registered a name.
    pub participants: usize,
    /// Registered participants not in a duel.
    pub idle: usize,
    /// Duels in progress.
    pub live_sessions: usize,
}

/// `GET /health`
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Liveness probe",
    description = "Reports that the server is up, together with connection, participant and duel counts.",
    responses(
        (status = 200, description = "Server is up", body = HealthReport),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    let service = &state.duel_service;
    let lobby = LobbyCounters {
        connections: state.event_bus.receiver_count(),
        participants: service.participant_count().await,
        idle: service.idle_players().await.len(),
        live_sessions: service.sessions().len().await,
    };
    Json(HealthReport {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        checked_at: Utc::now(),
        lobby,
    })
}

/// Routes served outside `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
