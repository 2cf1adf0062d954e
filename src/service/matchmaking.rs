//! Matchmaking: challenge issuance and acceptance.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::{RoundScheduler, broadcast_idle};
use crate::domain::{
    ConnectionId, DuelEvent, DuelSession, EventBus, LobbyRegistry, RoundPhase, SessionId,
    SessionTable,
};
use crate::error::DuelError;

/// Turns challenge/accept messages into live duels.
///
/// Challenges are advisory: nothing is reserved until a challenge is
/// accepted, so several challengers may race for the same idle player and
/// the first acceptance wins.
#[derive(Debug, Clone)]
pub struct MatchmakingCoordinator {
    lobby: Arc<RwLock<LobbyRegistry>>,
    sessions: Arc<SessionTable>,
    scheduler: RoundScheduler,
    event_bus: EventBus,
}

impl MatchmakingCoordinator {
    /// Creates a coordinator over the shared lobby and session table.
    #[must_use]
    pub fn new(
        lobby: Arc<RwLock<LobbyRegistry>>,
        sessions: Arc<SessionTable>,
        scheduler: RoundScheduler,
        event_bus: EventBus,
    ) -> Self {
        Self {
            lobby,
            sessions,
            scheduler,
            event_bus,
        }
    }

    /// Forwards a challenge from `from` to `to`.
    ///
    /// # Errors
    ///
    /// [`DuelError::InvalidChallenger`], [`DuelError::AlreadyBusy`],
    /// [`DuelError::SelfChallenge`], [`DuelError::TargetNotFound`] or
    /// [`DuelError::TargetBusy`], checked in that order.
    pub async fn challenge(&self, from: ConnectionId, to: ConnectionId) -> Result<(), DuelError> {
        let lobby = self.lobby.read().await;
        let (challenger, _) = lobby.check_pair(from, to)?;
        let _ = self.event_bus.send_to(
            to,
            DuelEvent::ChallengeReceived {
                challenger_id: from,
                challenger_name: challenger.name.clone(),
            },
        );
        tracing::info!(%from, %to, "challenge sent");
        Ok(())
    }

    /// Accepts a challenge and starts the duel.
    ///
    /// Both players are reserved atomically, so a player can never end up
    /// in two duels even if two acceptances race.
    ///
    /// # Errors
    ///
    /// [`DuelError::InvalidChallenger`] or [`DuelError::AlreadyBusy`] if the
    /// accepting connection cannot play, [`DuelError::SelfChallenge`], and
    /// [`DuelError::TargetNotFound`] or [`DuelError::TargetBusy`] if the
    /// challenger is gone or already playing.
    pub async fn accept_challenge(
        &self,
        accepter: ConnectionId,
        challenger: ConnectionId,
    ) -> Result<SessionId, DuelError> {
        let session = DuelSession::new(SessionId::new(), accepter, challenger);
        let session_id = session.session_id;
        let zeroed = session.scores().clone();

        // The duel is in the table before the lobby lock is released, so a
        // player who disconnects from here on finds it and forfeits it.
        let handle = {
            let mut lobby = self.lobby.write().await;
            lobby.reserve_pair(accepter, challenger)?;
            let _ = self.event_bus.join_scope(accepter, session_id);
            let _ = self.event_bus.join_scope(challenger, session_id);
            match self.sessions.insert(session).await {
                Ok(handle) => {
                    broadcast_idle(&self.event_bus, &lobby);
                    handle
                }
                Err(err) => {
                    lobby.release(&[accepter, challenger]);
                    let _ = self.event_bus.leave_scope(accepter, session_id);
                    let _ = self.event_bus.leave_scope(challenger, session_id);
                    return Err(err);
                }
            }
        };

        let mut session = handle.lock().await;
        if session.phase() == RoundPhase::GameOver {
            // A player left and forfeited before the first round started.
            return Ok(session_id);
        }
        let _ = self
            .event_bus
            .to_session(session_id, DuelEvent::UpdateScores(zeroed));
        self.scheduler.start_round_locked(&mut session);
        let _ = self
            .event_bus
            .to_session(session_id, DuelEvent::GameStart { session_id });
        drop(session);

        tracing::info!(%session_id, %accepter, %challenger, "duel started");
        Ok(session_id)
    }
}
