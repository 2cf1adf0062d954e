//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::ConnectionId;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// The connection subscribes to the event bus before it is assigned a
/// handle, so it cannot miss its own `welcome`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let bus_rx = state.event_bus.subscribe();
    let duel_service = std::sync::Arc::clone(&state.duel_service);
    let connection_id = ConnectionId::new();

    ws.on_upgrade(move |socket| run_connection(socket, bus_rx, duel_service, connection_id))
}
