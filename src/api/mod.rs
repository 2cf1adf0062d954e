//! REST API layer: route handlers, DTOs, router composition and OpenAPI.
//!
//! Resource endpoints are mounted under `/api/v1`; the health check lives
//! at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "duel-gateway", description = "Lobby and duel inspection API"),
    paths(
        handlers::system::health_handler,
        handlers::lobby::list_players,
        handlers::lobby::list_sessions,
        handlers::lobby::quiz_overview,
    ),
    tags(
        (name = "Lobby", description = "Idle players, live duels and the question bank"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}
