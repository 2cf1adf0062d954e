//! Read-only lobby views: idle players, live duels, quiz overview.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{PlayerListResponse, SessionListResponse};
use crate::app_state::AppState;
use crate::service::QuizOverview;

/// `GET /players` — Idle participants.
#[utoipa::path(
    get,
    path = "/api/v1/players",
    tag = "Lobby",
    summary = "List idle players",
    description = "Returns the participants who are connected and not playing, in the order they joined. This is the same list pushed over WebSocket as `updatePlayers`.",
    responses(
        (status = 200, description = "Idle players", body = PlayerListResponse),
    )
)]
pub async fn list_players(State(state): State<AppState>) -> impl IntoResponse {
    let data = state.duel_service.idle_players().await;
    let count = data.len();
    Json(PlayerListResponse { data, count })
}

/// `GET /sessions` — Live duels.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Lobby",
    summary = "List live duels",
    description = "Returns every running duel with its players, scores, round number and round phase.",
    responses(
        (status = 200, description = "Live duels", body = SessionListResponse),
    )
)]
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let data = state.duel_service.live_sessions().await;
    let count = data.len();
    Json(SessionListResponse { data, count })
}

/// `GET /quiz` — Question bank overview.
#[utoipa::path(
    get,
    path = "/api/v1/quiz",
    tag = "Lobby",
    summary = "Describe the question bank",
    description = "Returns the number of rounds per duel, the answer deadline and the option count of each round. Questions and answers are not exposed.",
    responses(
        (status = 200, description = "Quiz overview", body = QuizOverview),
    )
)]
pub async fn quiz_overview(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.duel_service.quiz_overview())
}

/// Lobby routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/players", get(list_players))
        .route("/sessions", get(list_sessions))
        .route("/quiz", get(quiz_overview))
}
