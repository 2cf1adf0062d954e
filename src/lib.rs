//! # duel-gateway
//!
//! Real-time lobby and head-to-head quiz duel server.
//!
//! Players connect over WebSocket, register a display name, challenge an
//! idle opponent and race through a fixed bank of multiple-choice
//! questions. The first answer settles each round; an unanswered round
//! times out after the deadline. A small REST surface exposes the lobby
//! for inspection.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler (ws/)          REST Handlers (api/)
//!     │
//!     ├── DuelService (service/)
//!     │     ├── MatchmakingCoordinator
//!     │     └── RoundScheduler (timers)
//!     │
//!     ├── LobbyRegistry / SessionTable (domain/)
//!     └── EventBus ──► per-connection SessionScopes
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the full application router: REST endpoints, the `/ws`
/// upgrade endpoint and, with the `swagger-ui` feature, the interactive
/// API docs at `/swagger-ui`.
pub fn build_app(app_state: AppState) -> Router {
    let router = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws::handler::ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
