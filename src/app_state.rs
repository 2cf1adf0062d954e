//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::DuelService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Duel service for all lobby and game logic.
    pub duel_service: Arc<DuelService>,
    /// Event bus each WebSocket connection subscribes to.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wraps a service, sharing its event bus.
    #[must_use]
    pub fn new(duel_service: DuelService) -> Self {
        let event_bus = duel_service.event_bus().clone();
        Self {
            duel_service: Arc::new(duel_service),
            event_bus,
        }
    }
}
