//! Service layer: lobby, matchmaking and round orchestration.
//!
//! [`DuelService`] is the single entry point the gateway talks to. It owns
//! the lobby and session table and delegates to the
//! [`MatchmakingCoordinator`] and [`RoundScheduler`], which publish their
//! results through the [`crate::domain::EventBus`].

pub mod duel_service;
pub mod matchmaking;
pub mod round_scheduler;

pub use duel_service::{DuelService, DuelSettings, QuizOverview};
pub use matchmaking::MatchmakingCoordinator;
pub use round_scheduler::{RoundScheduler, RoundTiming};

use crate::domain::{DuelEvent, EventBus, LobbyRegistry};

/// Sends the current idle list to every connection.
///
/// Call it while still holding the lobby lock so successive lists reach
/// clients in the order the lobby changed.
pub(crate) fn broadcast_idle(event_bus: &EventBus, lobby: &LobbyRegistry) {
    let _ = event_bus.to_all(DuelEvent::UpdatePlayers(lobby.list_idle()));
}
