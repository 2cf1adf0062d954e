//! WebSocket connection loop.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands to the [`DuelService`] and forwarding the
//! bus deliveries addressed to this connection.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{ClientCommand, error_frame, event_frame, parse_command};
use super::subscription::SessionScopes;
use crate::domain::{BusMessage, ConnectionId};
use crate::error::DuelError;
use crate::service::DuelService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching deliveries from the [`broadcast::Receiver`].
/// - Removes the participant from the lobby when the socket closes.
pub async fn run_connection(
    socket: WebSocket,
    mut bus_rx: broadcast::Receiver<BusMessage>,
    service: Arc<DuelService>,
    connection_id: ConnectionId,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut scopes = SessionScopes::new(connection_id);

    tracing::debug!(%connection_id, "ws connection opened");
    service.connect(connection_id);

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_text_message(&service, connection_id, &text).await
                            && ws_tx.send(Message::text(reply)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%connection_id, error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Delivery from the EventBus
            received = bus_rx.recv() => {
                match bus_step(received, &mut scopes) {
                    BusStep::Forward(json) => {
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    BusStep::Skip => {}
                    BusStep::Close => break,
                }
            }
        }
    }

    service.leave(connection_id).await;
    tracing::debug!(%connection_id, "ws connection closed");
}

/// What the connection does with one receive from the event bus.
#[derive(Debug, PartialEq, Eq)]
enum BusStep {
    /// Send this frame to the client.
    Forward(String),
    /// Nothing for this connection.
    Skip,
    /// Stop serving the connection.
    Close,
}

/// Applies one bus receive to the connection's scopes.
///
/// A lagged receiver may have lost scope changes along with deliveries, so
/// its scopes can no longer be trusted and the connection is closed.
fn bus_step(
    received: Result<BusMessage, broadcast::error::RecvError>,
    scopes: &mut SessionScopes,
) -> BusStep {
    match received {
        Ok(message) => scopes
            .route(&message)
            .and_then(event_frame)
            .map_or(BusStep::Skip, BusStep::Forward),
        Err(broadcast::error::RecvError::Lagged(n)) => {
            tracing::warn!(
                connection_id = %scopes.connection(),
                lagged = n,
                "ws client lagged behind event bus, closing"
            );
            BusStep::Close
        }
        Err(broadcast::error::RecvError::Closed) => BusStep::Close,
    }
}

/// Handles a text frame, returning an immediate reply for unparseable input.
///
/// Results of valid commands travel over the event bus instead.
async fn handle_text_message(
    service: &DuelService,
    connection_id: ConnectionId,
    text: &str,
) -> Option<String> {
    let (request_id, command) = match parse_command(text) {
        Ok(parsed) => parsed,
        Err(err) => return error_frame("", &err),
    };
    tracing::debug!(%connection_id, %request_id, command = command.name(), "ws command");
    if let Err(err) = dispatch(service, connection_id, command).await {
        service.report_error(connection_id, &err);
    }
    None
}

/// Routes one inbound command to the lobby, matchmaking or round scheduler.
///
/// # Errors
///
/// Returns the [`DuelError`] the target operation refused the command with.
pub async fn dispatch(
    service: &DuelService,
    connection_id: ConnectionId,
    command: ClientCommand,
) -> Result<(), DuelError> {
    match command {
        ClientCommand::Join { name } => service.join(connection_id, &name).await,
        ClientCommand::Challenge { target_id } => service.challenge(connection_id, target_id).await,
        ClientCommand::AcceptChallenge { challenger_id } => service
            .accept_challenge(connection_id, challenger_id)
            .await
            .map(|_| ()),
        ClientCommand::SubmitAnswer { answer, session_id } => service
            .submit_answer(session_id, connection_id, &answer)
            .await
            .map(|_| ()),
        ClientCommand::Timeout { session_id } => {
            service.report_timeout(session_id).await.map(|_| ())
        }
        ClientCommand::RequestPlayerListUpdate => {
            service.refresh_players().await;
            Ok(())
        }
    }
}
