//! Duel service: the facade the gateway dispatches inbound events to.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::{MatchmakingCoordinator, RoundScheduler, RoundTiming, broadcast_idle};
use crate::domain::duel_session::AnswerOutcome;
use crate::domain::lobby::Registration;
use crate::domain::{
    ConnectionId, DuelEvent, EventBus, LobbyRegistry, ParticipantSummary, QuizBank, SessionId,
    SessionSummary, SessionTable,
};
use crate::error::DuelError;

/// Behaviour switches for the duel lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelSettings {
    /// Round deadline and grace delay.
    pub timing: RoundTiming,
    /// End a running duel when one of its players disconnects.
    pub forfeit_on_disconnect: bool,
}

impl Default for DuelSettings {
    fn default() -> Self {
        Self {
            timing: RoundTiming::default(),
            forfeit_on_disconnect: true,
        }
    }
}

/// Public description of the question bank. Never includes answers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizOverview {
    /// Rounds per duel.
    pub total_rounds: usize,
    /// Seconds to answer each round.
    pub deadline_secs: u64,
    /// Option count of each round, in order.
    pub options_per_round: Vec<usize>,
}

/// Orchestration layer for the whole lobby.
///
/// Owns the process-wide [`LobbyRegistry`] and [`SessionTable`]; both start
/// empty and live until shutdown. Every lobby mutation is followed by an
/// `updatePlayers` broadcast published under the lobby lock.
#[derive(Debug, Clone)]
pub struct DuelService {
    lobby: Arc<RwLock<LobbyRegistry>>,
    sessions: Arc<SessionTable>,
    bank: Arc<QuizBank>,
    event_bus: EventBus,
    matchmaking: MatchmakingCoordinator,
    scheduler: RoundScheduler,
    settings: DuelSettings,
}

impl DuelService {
    /// Creates a service with an empty lobby and no duels.
    #[must_use]
    pub fn new(bank: Arc<QuizBank>, event_bus: EventBus, settings: DuelSettings) -> Self {
        let lobby = Arc::new(RwLock::new(LobbyRegistry::new()));
        let sessions = Arc::new(SessionTable::new());
        let scheduler = RoundScheduler::new(
            Arc::clone(&sessions),
            Arc::clone(&lobby),
            Arc::clone(&bank),
            event_bus.clone(),
            settings.timing,
        );
        let matchmaking = MatchmakingCoordinator::new(
            Arc::clone(&lobby),
            Arc::clone(&sessions),
            scheduler.clone(),
            event_bus.clone(),
        );
        Self {
            lobby,
            sessions,
            bank,
            event_bus,
            matchmaking,
            scheduler,
            settings,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`SessionTable`].
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    /// Returns the round scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &RoundScheduler {
        &self.scheduler
    }

    /// Greets a freshly opened connection with its handle.
    pub fn connect(&self, id: ConnectionId) {
        let _ = self
            .event_bus
            .send_to(id, DuelEvent::Welcome { connection_id: id });
    }

    /// Adds `id` to the lobby under `name`.
    ///
    /// # Errors
    ///
    /// [`DuelError::NameConflict`] if the trimmed name is taken,
    /// [`DuelError::InvalidRequest`] if it is empty.
    pub async fn join(&self, id: ConnectionId, name: &str) -> Result<(), DuelError> {
        let mut lobby = self.lobby.write().await;
        if lobby.register(name, id)? == Registration::Registered {
            broadcast_idle(&self.event_bus, &lobby);
            tracing::info!(%id, name = name.trim(), "participant joined");
        }
        Ok(())
    }

    /// Removes a closed connection from the lobby.
    ///
    /// If the connection was playing and forfeits are enabled, its duel ends
    /// at once and the opponent returns to the lobby. Otherwise the duel
    /// keeps running on its timers until the last round.
    pub async fn leave(&self, id: ConnectionId) {
        {
            let mut lobby = self.lobby.write().await;
            if let Some(participant) = lobby.unregister(id) {
                tracing::info!(%id, name = %participant.name, "participant left");
            }
            broadcast_idle(&self.event_bus, &lobby);
        }
        if self.settings.forfeit_on_disconnect {
            let _ = self.scheduler.forfeit(id).await;
        }
    }

    /// Re-sends the idle list to every connection.
    pub async fn refresh_players(&self) {
        let lobby = self.lobby.read().await;
        broadcast_idle(&self.event_bus, &lobby);
    }

    /// See [`MatchmakingCoordinator::challenge`].
    ///
    /// # Errors
    ///
    /// Propagates the coordinator's validation errors.
    pub async fn challenge(&self, from: ConnectionId, to: ConnectionId) -> Result<(), DuelError> {
        self.matchmaking.challenge(from, to).await
    }

    /// See [`MatchmakingCoordinator::accept_challenge`].
    ///
    /// # Errors
    ///
    /// Propagates the coordinator's validation errors.
    pub async fn accept_challenge(
        &self,
        accepter: ConnectionId,
        challenger: ConnectionId,
    ) -> Result<SessionId, DuelError> {
        self.matchmaking.accept_challenge(accepter, challenger).await
    }

    /// See [`RoundScheduler::submit_answer`].
    ///
    /// # Errors
    ///
    /// [`DuelError::SessionNotFound`] if the duel is not live.
    pub async fn submit_answer(
        &self,
        session_id: SessionId,
        submitter: ConnectionId,
        answer: &str,
    ) -> Result<Option<AnswerOutcome>, DuelError> {
        self.scheduler
            .submit_answer(session_id, submitter, answer)
            .await
    }

    /// A client reports that its round countdown ran out.
    ///
    /// # Errors
    ///
    /// [`DuelError::SessionNotFound`] if the duel is not live.
    pub async fn report_timeout(&self, session_id: SessionId) -> Result<bool, DuelError> {
        self.scheduler.handle_timeout(session_id).await
    }

    /// Sends a refused command back to the connection that issued it.
    ///
    /// A name conflict has its own event; everything else becomes an
    /// `error` event. Absorbed errors are only logged.
    pub fn report_error(&self, id: ConnectionId, err: &DuelError) {
        if !err.is_surfaced() {
            tracing::debug!(%id, error = %err, "command absorbed");
            return;
        }
        tracing::debug!(%id, error = %err, "command refused");
        let event = match err {
            DuelError::NameConflict => DuelEvent::NameConflict,
            other => DuelEvent::Error(other.to_string()),
        };
        let _ = self.event_bus.send_to(id, event);
    }

    /// Idle participants in registration order.
    pub async fn idle_players(&self) -> Vec<ParticipantSummary> {
        self.lobby.read().await.list_idle()
    }

    /// Number of connections that joined the lobby, busy or not.
    pub async fn participant_count(&self) -> usize {
        self.lobby.read().await.len()
    }

    /// Summaries of every live duel.
    pub async fn live_sessions(&self) -> Vec<SessionSummary> {
        self.sessions.list().await
    }

    /// Answer-free description of the question bank.
    #[must_use]
    pub fn quiz_overview(&self) -> QuizOverview {
        QuizOverview {
            total_rounds: self.bank.len(),
            deadline_secs: self.settings.timing.deadline.as_secs(),
            options_per_round: self.bank.iter().map(|item| item.options.len()).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::{Audience, Scores};
    use crate::service::testing::{
        deliveries, drain, event_names, join_pair, make_service, make_service_with, questions,
    };

    fn last_scores(messages: &[crate::domain::BusMessage]) -> Option<Scores> {
        deliveries(messages)
            .into_iter()
            .filter_map(|(_, event)| match event {
                DuelEvent::UpdateScores(scores) => Some(scores),
                _ => None,
            })
            .last()
    }

    #[tokio::test]
    async fn join_broadcasts_idle_list_to_everyone() {
        let (service, mut rx) = make_service();
        let alice = ConnectionId::new();
        assert!(service.join(alice, "Alice").await.is_ok());

        let sent = deliveries(&drain(&mut rx));
        let Some((Audience::All, DuelEvent::UpdatePlayers(players))) = sent.first() else {
            panic!("expected updatePlayers to all");
        };
        assert_eq!(players.len(), 1);
        assert_eq!(players.first().map(|p| p.name.as_str()), Some("Alice"));
    }

    #[tokio::test]
    async fn name_conflict_reaches_only_the_joiner() {
        let (service, mut rx) = make_service();
        let _ = join_pair(&service).await;
        drain(&mut rx);

        let carol = ConnectionId::new();
        let Err(err) = service.join(carol, "Alice").await else {
            panic!("duplicate name should be refused");
        };
        service.report_error(carol, &err);

        assert_eq!(
            deliveries(&drain(&mut rx)),
            vec![(Audience::Connection(carol), DuelEvent::NameConflict)]
        );
        assert_eq!(service.idle_players().await.len(), 2);
    }

    #[tokio::test]
    async fn rejoin_is_silent() {
        let (service, mut rx) = make_service();
        let (alice, _) = join_pair(&service).await;
        drain(&mut rx);
        assert!(service.join(alice, "Someone").await.is_ok());
        assert!(drain(&mut rx).is_empty());
        assert_eq!(service.participant_count().await, 2);
    }

    #[tokio::test]
    async fn refused_commands_become_error_events() {
        let (service, mut rx) = make_service();
        let id = ConnectionId::new();
        service.report_error(id, &DuelError::TargetBusy);
        service.report_error(id, &DuelError::SessionNotFound(SessionId::new()));

        let sent = deliveries(&drain(&mut rx));
        assert_eq!(sent.len(), 1);
        let Some((_, DuelEvent::Error(reason))) = sent.first() else {
            panic!("expected error event");
        };
        assert_eq!(reason, "Target player is in game");
    }

    #[tokio::test]
    async fn disconnect_updates_idle_list() {
        let (service, mut rx) = make_service();
        let (alice, bob) = join_pair(&service).await;
        drain(&mut rx);

        service.leave(alice).await;
        let sent = deliveries(&drain(&mut rx));
        let Some((_, DuelEvent::UpdatePlayers(players))) = sent.first() else {
            panic!("expected updatePlayers");
        };
        assert_eq!(players.iter().map(|p| p.id).collect::<Vec<_>>(), vec![bob]);
        assert!(service.join(ConnectionId::new(), "Alice").await.is_ok());
    }

    #[tokio::test]
    async fn connect_sends_welcome() {
        let (service, mut rx) = make_service();
        let id = ConnectionId::new();
        service.connect(id);
        assert_eq!(
            deliveries(&drain(&mut rx)),
            vec![(
                Audience::Connection(id),
                DuelEvent::Welcome { connection_id: id }
            )]
        );
    }

    #[test]
    fn quiz_overview_hides_answers() {
        let (service, _rx) = make_service();
        let overview = service.quiz_overview();
        assert_eq!(overview.total_rounds, 5);
        assert_eq!(overview.deadline_secs, 10);
        assert_eq!(overview.options_per_round, vec![4; 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn full_duel_between_alice_and_bob() {
        let (service, mut rx) = make_service();
        let (alice, bob) = join_pair(&service).await;
        let grace = Duration::from_millis(1_100);

        assert!(service.challenge(alice, bob).await.is_ok());
        let Ok(session_id) = service.accept_challenge(bob, alice).await else {
            panic!("bob should accept");
        };
        let messages = drain(&mut rx);
        assert_eq!(
            questions(&messages),
            vec![(1, "What is the capital of France?".to_string())]
        );
        assert_eq!(last_scores(&messages), Some(Scores::from([(alice, 0), (bob, 0)])));

        // Round 1: Alice answers correctly.
        let _ = service.submit_answer(session_id, alice, "Paris").await;
        let messages = drain(&mut rx);
        assert_eq!(event_names(&messages), vec!["disableOptions", "updateScores"]);
        assert_eq!(last_scores(&messages), Some(Scores::from([(alice, 2), (bob, 0)])));
        tokio::time::sleep(grace).await;
        let asked = questions(&drain(&mut rx));
        assert_eq!(asked.first().map(|q| q.0), Some(2));
        assert!(asked.first().is_some_and(|q| q.1.contains("Red Planet")));

        // Round 2: nobody answers and the deadline expires.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            last_scores(&drain(&mut rx)),
            Some(Scores::from([(alice, 2), (bob, 0)]))
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(questions(&drain(&mut rx)).first().map(|q| q.0), Some(3));

        // Round 3: Bob answers wrongly, Alice gets the point.
        let _ = service.submit_answer(session_id, bob, "Tokyo").await;
        tokio::time::sleep(grace).await;
        // Round 4: Bob answers correctly.
        let _ = service.submit_answer(session_id, bob, "Da Vinci").await;
        tokio::time::sleep(grace).await;
        // Round 5: Alice answers correctly.
        let _ = service.submit_answer(session_id, alice, "Au").await;
        drain(&mut rx);
        tokio::time::sleep(grace).await;

        let sent = deliveries(&drain(&mut rx));
        let final_scores = sent.iter().find_map(|(audience, event)| match event {
            DuelEvent::GameOver(data) if *audience == Audience::Session(session_id) => {
                assert_eq!(data.forfeited_by(), None);
                serde_json::from_str::<serde_json::Value>(data.scores()).ok()
            }
            _ => None,
        });
        let Some(final_scores) = final_scores else {
            panic!("expected gameOver");
        };
        assert_eq!(final_scores[alice.to_string()], 5);
        assert_eq!(final_scores[bob.to_string()], 2);

        assert!(!service.sessions().contains(session_id).await);
        let idle: Vec<_> = service.idle_players().await.into_iter().map(|p| p.id).collect();
        assert_eq!(idle, vec![alice, bob]);
        assert!(sent.iter().any(|(audience, event)| *audience == Audience::All
            && matches!(event, DuelEvent::UpdatePlayers(players) if players.len() == 2)));

        // No timer survives the duel.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn without_forfeit_the_duel_runs_out_on_timeouts() {
        let settings = DuelSettings {
            forfeit_on_disconnect: false,
            ..DuelSettings::default()
        };
        let (service, mut rx) = make_service_with(settings);
        let (alice, bob) = join_pair(&service).await;
        let Ok(session_id) = service.accept_challenge(bob, alice).await else {
            panic!("bob should accept");
        };

        service.leave(alice).await;
        assert!(service.sessions().contains(session_id).await);

        // Five rounds of deadline plus grace.
        tokio::time::sleep(Duration::from_secs(56)).await;
        assert!(!service.sessions().contains(session_id).await);
        assert!(event_names(&drain(&mut rx)).contains(&"gameOver"));
        let idle: Vec<_> = service.idle_players().await.into_iter().map(|p| p.id).collect();
        assert_eq!(idle, vec![bob]);
    }
}
