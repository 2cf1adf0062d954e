//! Round scheduler: drives every duel from question to question.
//!
//! Each transition locks the duel's mutex, applies the pure
//! [`DuelSession`] transition, re-arms the duel's single timer and publishes
//! the resulting events before the lock is released. Holding the lock while
//! publishing keeps a round's score update ahead of the next question on
//! the bus.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use super::broadcast_idle;
use crate::domain::duel_session::{Advance, AnswerOutcome, RoundPhase};
use crate::domain::{
    ConnectionId, DuelEvent, DuelSession, EventBus, LobbyRegistry, QuizBank, SessionId,
    SessionTable,
};
use crate::error::DuelError;

/// Round deadline and post-settlement grace delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTiming {
    /// Time players have to answer before the round times out.
    pub deadline: Duration,
    /// Pause between a settled round and the next question.
    pub grace: Duration,
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(10),
            grace: Duration::from_secs(1),
        }
    }
}

/// Which transition a pending timer triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Deadline,
    Grace,
}

/// Owns the round lifecycle and the per-duel timers.
#[derive(Debug, Clone)]
pub struct RoundScheduler {
    sessions: Arc<SessionTable>,
    lobby: Arc<RwLock<LobbyRegistry>>,
    bank: Arc<QuizBank>,
    event_bus: EventBus,
    timing: RoundTiming,
}

impl RoundScheduler {
    /// Creates a scheduler over the shared duel state.
    #[must_use]
    pub fn new(
        sessions: Arc<SessionTable>,
        lobby: Arc<RwLock<LobbyRegistry>>,
        bank: Arc<QuizBank>,
        event_bus: EventBus,
        timing: RoundTiming,
    ) -> Self {
        Self {
            sessions,
            lobby,
            bank,
            event_bus,
            timing,
        }
    }

    /// Starts the current round of a duel. No-op if the duel is not live.
    pub async fn start_round(&self, session_id: SessionId) {
        let Ok(handle) = self.sessions.get(session_id).await else {
            tracing::debug!(%session_id, "start_round on unknown session");
            return;
        };
        let mut session = handle.lock().await;
        self.start_round_locked(&mut session);
    }

    /// Arms the deadline, reopens the round and sends the question.
    pub(crate) fn start_round_locked(&self, session: &mut DuelSession) {
        if session.phase() == RoundPhase::GameOver {
            return;
        }
        let round = session.round_index();
        let Some(item) = self.bank.get(round) else {
            tracing::warn!(session_id = %session.session_id, round, "no quiz item for round");
            return;
        };

        self.arm(session, TimerKind::Deadline, self.timing.deadline);
        session.begin_round();

        let _ = self.event_bus.to_session(
            session.session_id,
            DuelEvent::NewQuestion {
                question: item.question.clone(),
                options: item.options.clone(),
                round: round + 1,
                total_rounds: self.bank.len(),
                deadline_secs: self.timing.deadline.as_secs(),
            },
        );
        tracing::debug!(session_id = %session.session_id, round = round + 1, "round started");
    }

    /// Scores the first answer of the current round.
    ///
    /// Returns `Ok(None)` when the answer is ignored: the round was already
    /// settled, the submitter is not playing, or the duel is over.
    ///
    /// # Errors
    ///
    /// Returns [`DuelError::SessionNotFound`] if the duel is not live.
    pub async fn submit_answer(
        &self,
        session_id: SessionId,
        submitter: ConnectionId,
        answer: &str,
    ) -> Result<Option<AnswerOutcome>, DuelError> {
        let handle = self.sessions.get(session_id).await?;
        let mut session = handle.lock().await;

        let Some(item) = self.bank.get(session.round_index()) else {
            return Ok(None);
        };
        let outcome = match session.settle_answer(submitter, answer, item) {
            Ok(outcome) => outcome,
            Err(reason) => {
                tracing::debug!(%session_id, %submitter, ?reason, "answer ignored");
                return Ok(None);
            }
        };

        let _ = session.timer.cancel();
        let _ = self
            .event_bus
            .to_session(session_id, DuelEvent::DisableOptions);
        let _ = self
            .event_bus
            .to_session(session_id, DuelEvent::UpdateScores(session.scores().clone()));
        self.arm(&mut session, TimerKind::Grace, self.timing.grace);

        tracing::info!(
            %session_id,
            %submitter,
            correct = outcome.correct,
            credited = %outcome.credited,
            points = outcome.points,
            "round settled by answer"
        );
        Ok(Some(outcome))
    }

    /// Times out the current round without awarding points.
    ///
    /// Used both by the deadline timer and by a client-reported `timeout`.
    /// Every timeout re-sends the scores and restarts the grace delay. The
    /// round is left unsettled, so an answer that arrives before the round
    /// advances is still scored. Returns `Ok(false)` only if the duel has
    /// already ended.
    ///
    /// # Errors
    ///
    /// Returns [`DuelError::SessionNotFound`] if the duel is not live.
    pub async fn handle_timeout(&self, session_id: SessionId) -> Result<bool, DuelError> {
        let handle = self.sessions.get(session_id).await?;
        let mut session = handle.lock().await;
        Ok(self.timeout_locked(&mut session))
    }

    fn timeout_locked(&self, session: &mut DuelSession) -> bool {
        if !session.settle_timeout() {
            tracing::debug!(session_id = %session.session_id, "timeout on finished duel ignored");
            return false;
        }
        let _ = session.timer.cancel();
        let _ = self.event_bus.to_session(
            session.session_id,
            DuelEvent::UpdateScores(session.scores().clone()),
        );
        self.arm(session, TimerKind::Grace, self.timing.grace);
        tracing::info!(
            session_id = %session.session_id,
            round = session.round_index() + 1,
            "round timed out"
        );
        true
    }

    async fn advance_locked(&self, session: &mut DuelSession) {
        if session.phase() == RoundPhase::GameOver {
            return;
        }
        match session.advance(self.bank.len()) {
            Advance::Next(_) => self.start_round_locked(session),
            Advance::Finished => self.end_game_locked(session, None).await,
        }
    }

    /// Ends a duel early because `leaver` disconnected.
    ///
    /// Returns the duel that was forfeited, if `leaver` was playing one.
    pub async fn forfeit(&self, leaver: ConnectionId) -> Option<SessionId> {
        for handle in self.sessions.handles().await {
            let mut session = handle.lock().await;
            if !session.contains(leaver) || session.phase() == RoundPhase::GameOver {
                continue;
            }
            let session_id = session.session_id;
            self.end_game_locked(&mut session, Some(leaver)).await;
            tracing::info!(%session_id, %leaver, "duel forfeited on disconnect");
            return Some(session_id);
        }
        None
    }

    /// Sends the final scores, deletes the duel and frees both players.
    async fn end_game_locked(&self, session: &mut DuelSession, forfeited_by: Option<ConnectionId>) {
        let session_id = session.session_id;
        let _ = session.timer.cancel();
        session.abandon();

        let _ = self.event_bus.to_session(
            session_id,
            DuelEvent::game_over(session.scores(), forfeited_by),
        );
        self.sessions.remove(session_id).await;

        let players = session.players();
        for player in players {
            let _ = self.event_bus.leave_scope(player, session_id);
        }

        let mut lobby = self.lobby.write().await;
        lobby.release(&players);
        broadcast_idle(&self.event_bus, &lobby);
        drop(lobby);

        tracing::info!(%session_id, scores = ?session.scores(), "duel finished");
    }

    /// Replaces the duel's pending timer with a new one.
    fn arm(&self, session: &mut DuelSession, kind: TimerKind, delay: Duration) {
        let ticket = session.timer.cancel();
        let session_id = session.session_id;
        let scheduler = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.on_timer(session_id, ticket, kind).await;
        });
        session.timer.attach(task.abort_handle());
    }

    async fn on_timer(&self, session_id: SessionId, ticket: u64, kind: TimerKind) {
        let Ok(handle) = self.sessions.get(session_id).await else {
            return;
        };
        let mut session = handle.lock().await;
        if !session.timer.claim(ticket) {
            tracing::trace!(%session_id, ticket, ?kind, "stale timer ignored");
            return;
        }
        match kind {
            TimerKind::Deadline => {
                let _ = self.timeout_locked(&mut session);
            }
            TimerKind::Grace => self.advance_locked(&mut session).await,
        }
    }
}
