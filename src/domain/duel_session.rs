//! Per-duel round state machine.
//!
//! A [`DuelSession`] moves through `AwaitingAnswer` → `Settled` for every
//! round and ends in `GameOver` once the round index reaches the number of
//! quiz items. All transitions here are pure: they mutate the session and
//! report what happened, and the round scheduler turns that into timers and
//! broadcasts.
//!
//! The `settled` flag is the only record of whether the current round has
//! been credited. Timers are never consulted for that. A timeout does not
//! set it, so the first answer that arrives before the round advances is
//! still scored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::AbortHandle;
use utoipa::ToSchema;

use super::quiz::QuizItem;
use super::{ConnectionId, SessionId};

/// Points awarded to a player who answers correctly.
pub const CORRECT_ANSWER_POINTS: u32 = 2;

/// Points awarded to the opponent of a player who answers wrongly.
pub const WRONG_ANSWER_POINTS: u32 = 1;

/// Score per participant handle.
pub type Scores = BTreeMap<ConnectionId, u32>;

/// Where a duel is within its current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Question is out and the deadline is running.
    AwaitingAnswer,
    /// The round was credited by an answer and the grace delay is running.
    Settled,
    /// Every item has been played.
    GameOver,
}

/// How an accepted answer was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Who received the points.
    pub credited: ConnectionId,
    /// How many points they received.
    pub points: u32,
    /// Whether the submitted answer was the correct option.
    pub correct: bool,
}

/// Why an answer was not scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerRejected {
    /// The round was already credited or timed out.
    AlreadySettled,
    /// The submitter is not one of the two players.
    NotParticipant,
    /// The duel has no round left.
    GameOver,
}

/// Result of moving past a settled round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Play the round with this 0-based index next.
    Next(usize),
    /// Every item has been played.
    Finished,
}

/// The single pending timer of a session.
///
/// Every arm bumps `ticket`. A timer task remembers the ticket it was armed
/// with and must present it before it may touch the session, so a task that
/// was superseded, or that woke up just as it was aborted, finds a stale
/// ticket and does nothing.
#[derive(Debug, Default)]
pub struct TimerSlot {
    ticket: u64,
    handle: Option<AbortHandle>,
}

impl TimerSlot {
    /// Aborts the pending timer, if any, and invalidates its ticket.
    ///
    /// Returns the ticket the next timer must be armed with.
    pub fn cancel(&mut self) -> u64 {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.ticket = self.ticket.wrapping_add(1);
        self.ticket
    }

    /// Records the task armed with the ticket returned by [`TimerSlot::cancel`].
    pub fn attach(&mut self, handle: AbortHandle) {
        self.handle = Some(handle);
    }

    /// Claims the slot for a timer that just fired.
    ///
    /// Returns `false` if `ticket` is stale. On success the handle is
    /// released without aborting it, since the caller is that task.
    pub fn claim(&mut self, ticket: u64) -> bool {
        if ticket != self.ticket {
            return false;
        }
        self.handle = None;
        true
    }
}

/// State of one live two-player duel.
#[derive(Debug)]
pub struct DuelSession {
    /// Generated identifier, also the broadcast scope of the duel.
    pub session_id: SessionId,
    players: [ConnectionId; 2],
    scores: Scores,
    round: usize,
    settled: bool,
    finished: bool,
    /// Deadline or grace timer currently pending for this duel.
    pub timer: TimerSlot,
    /// When the duel was created.
    pub started_at: DateTime<Utc>,
}

impl DuelSession {
    /// Creates a duel at round 0 with both scores at zero.
    ///
    /// `first` is the accepting player and `second` the challenger.
    #[must_use]
    pub fn new(session_id: SessionId, first: ConnectionId, second: ConnectionId) -> Self {
        let scores = Scores::from([(first, 0), (second, 0)]);
        Self {
            session_id,
            players: [first, second],
            scores,
            round: 0,
            settled: false,
            finished: false,
            timer: TimerSlot::default(),
            started_at: Utc::now(),
        }
    }

    /// Both players, in creation order.
    #[must_use]
    pub const fn players(&self) -> [ConnectionId; 2] {
        self.players
    }

    /// Returns `true` if `id` is one of the two players.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.players.contains(&id)
    }

    /// The other player of the pair, or `None` if `id` is not playing.
    #[must_use]
    pub fn opponent_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        match self.players {
            [a, b] if a == id => Some(b),
            [a, b] if b == id => Some(a),
            _ => None,
        }
    }

    /// Current scores.
    #[must_use]
    pub fn scores(&self) -> &Scores {
        &self.scores
    }

    /// 0-based index of the round being played.
    #[must_use]
    pub const fn round_index(&self) -> usize {
        self.round
    }

    /// Whether the current round has already been credited or timed out.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.settled
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        if self.finished {
            RoundPhase::GameOver
        } else if self.settled {
            RoundPhase::Settled
        } else {
            RoundPhase::AwaitingAnswer
        }
    }

    /// Opens the current round for answers.
    pub fn begin_round(&mut self) {
        self.settled = false;
    }

    /// Scores the first answer of the round.
    ///
    /// A correct answer earns the submitter [`CORRECT_ANSWER_POINTS`]; a
    /// wrong one earns the opponent [`WRONG_ANSWER_POINTS`].
    ///
    /// # Errors
    ///
    /// Returns an [`AnswerRejected`] reason and leaves the scores untouched
    /// if the duel is over, the submitter is not playing, or the round is
    /// already settled.
    pub fn settle_answer(
        &mut self,
        submitter: ConnectionId,
        answer: &str,
        item: &QuizItem,
    ) -> Result<AnswerOutcome, AnswerRejected> {
        if self.finished {
            return Err(AnswerRejected::GameOver);
        }
        let opponent = self
            .opponent_of(submitter)
            .ok_or(AnswerRejected::NotParticipant)?;
        if self.settled {
            return Err(AnswerRejected::AlreadySettled);
        }
        self.settled = true;

        let outcome = if item.is_correct(answer) {
            AnswerOutcome {
                credited: submitter,
                points: CORRECT_ANSWER_POINTS,
                correct: true,
            }
        } else {
            AnswerOutcome {
                credited: opponent,
                points: WRONG_ANSWER_POINTS,
                correct: false,
            }
        };
        let score = self.scores.entry(outcome.credited).or_insert(0);
        *score = score.saturating_add(outcome.points);
        Ok(outcome)
    }

    /// Records a timeout for the current round without awarding points.
    ///
    /// The round stays open: an answer that arrives before the round
    /// advances is still scored once. Returns `false` only if the duel is
    /// over.
    pub fn settle_timeout(&mut self) -> bool {
        if self.finished {
            return false;
        }
        for id in self.players {
            self.scores.entry(id).or_insert(0);
        }
        true
    }

    /// Moves to the next round, or finishes once `total_rounds` is reached.
    ///
    /// The round index never passes `total_rounds`.
    pub fn advance(&mut self, total_rounds: usize) -> Advance {
        if self.round < total_rounds {
            self.round += 1;
        }
        if self.round >= total_rounds {
            self.finished = true;
            Advance::Finished
        } else {
            Advance::Next(self.round)
        }
    }

    /// Marks the duel as over before all rounds were played.
    pub fn abandon(&mut self) {
        self.finished = true;
        self.settled = true;
    }

    /// Read-only view for listings.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            players: self.players.to_vec(),
            scores: self.scores.clone(),
            round: self.round.saturating_add(1),
            phase: self.phase(),
            started_at: self.started_at,
        }
    }
}

/// Snapshot of a live duel for `GET /api/v1/sessions`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Duel identifier.
    pub session_id: SessionId,
    /// Both player handles.
    pub players: Vec<ConnectionId>,
    /// Score per player handle.
    #[schema(value_type = Object)]
    pub scores: Scores,
    /// 1-based round number.
    pub round: usize,
    /// Phase of the current round.
    pub phase: RoundPhase,
    /// Creation timestamp.
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn item() -> QuizItem {
        QuizItem::new("What is the capital of France?", &["London", "Paris"], "Paris")
    }

    fn duel() -> (DuelSession, ConnectionId, ConnectionId) {
        let bob = ConnectionId::new();
        let alice = ConnectionId::new();
        (DuelSession::new(SessionId::new(), bob, alice), alice, bob)
    }

    fn score(session: &DuelSession, id: ConnectionId) -> u32 {
        session.scores().get(&id).copied().unwrap_or_default()
    }

    #[test]
    fn new_session_has_two_zero_scores() {
        let (session, alice, bob) = duel();
        assert_eq!(session.scores().len(), 2);
        assert_eq!(score(&session, alice), 0);
        assert_eq!(score(&session, bob), 0);
        assert_eq!(session.round_index(), 0);
        assert_eq!(session.phase(), RoundPhase::AwaitingAnswer);
    }

    #[test]
    fn opponent_lookup_preserves_pairing() {
        let (session, alice, bob) = duel();
        assert_eq!(session.opponent_of(alice), Some(bob));
        assert_eq!(session.opponent_of(bob), Some(alice));
        assert_eq!(session.opponent_of(ConnectionId::new()), None);
    }

    #[test]
    fn correct_answer_credits_submitter_two() {
        let (mut session, alice, bob) = duel();
        let Ok(outcome) = session.settle_answer(alice, "Paris", &item()) else {
            panic!("answer should be accepted");
        };
        assert!(outcome.correct);
        assert_eq!(outcome.credited, alice);
        assert_eq!(score(&session, alice), 2);
        assert_eq!(score(&session, bob), 0);
        assert_eq!(session.phase(), RoundPhase::Settled);
    }

    #[test]
    fn wrong_answer_credits_opponent_one() {
        let (mut session, alice, bob) = duel();
        let Ok(outcome) = session.settle_answer(alice, "London", &item()) else {
            panic!("answer should be accepted");
        };
        assert!(!outcome.correct);
        assert_eq!(outcome.credited, bob);
        assert_eq!(score(&session, alice), 0);
        assert_eq!(score(&session, bob), 1);
    }

    #[test]
    fn second_answer_never_scores() {
        let (mut session, alice, bob) = duel();
        assert!(session.settle_answer(alice, "London", &item()).is_ok());
        assert_eq!(
            session.settle_answer(bob, "Paris", &item()),
            Err(AnswerRejected::AlreadySettled)
        );
        assert_eq!(
            session.settle_answer(alice, "Paris", &item()),
            Err(AnswerRejected::AlreadySettled)
        );
        assert_eq!(score(&session, alice), 0);
        assert_eq!(score(&session, bob), 1);
    }

    #[test]
    fn outsider_answer_is_rejected() {
        let (mut session, _, _) = duel();
        assert_eq!(
            session.settle_answer(ConnectionId::new(), "Paris", &item()),
            Err(AnswerRejected::NotParticipant)
        );
        assert!(!session.is_settled());
    }

    #[test]
    fn timeout_awards_nothing_and_keeps_round_open() {
        let (mut session, alice, bob) = duel();
        assert!(session.settle_answer(alice, "Paris", &item()).is_ok());
        session.advance(5);
        session.begin_round();

        assert!(session.settle_timeout());
        assert!(session.settle_timeout());
        assert_eq!(score(&session, alice), 2);
        assert_eq!(score(&session, bob), 0);
        assert!(!session.is_settled());

        // The first answer after a timeout still counts, exactly once.
        assert!(session.settle_answer(bob, "Paris", &item()).is_ok());
        assert_eq!(
            session.settle_answer(alice, "Paris", &item()),
            Err(AnswerRejected::AlreadySettled)
        );
        assert_eq!(score(&session, bob), 2);
        // A timeout on a settled round leaves the scores alone.
        assert!(session.settle_timeout());
        assert_eq!(score(&session, alice), 2);
        assert_eq!(score(&session, bob), 2);
    }

    #[test]
    fn answer_after_begin_round_is_accepted_again() {
        let (mut session, alice, _) = duel();
        assert!(session.settle_answer(alice, "Paris", &item()).is_ok());
        assert_eq!(session.advance(3), Advance::Next(1));
        session.begin_round();
        assert!(session.settle_answer(alice, "Paris", &item()).is_ok());
        assert_eq!(score(&session, alice), 4);
    }

    #[test]
    fn advance_is_monotonic_and_stops_at_total() {
        let (mut session, _, _) = duel();
        assert_eq!(session.advance(3), Advance::Next(1));
        assert_eq!(session.advance(3), Advance::Next(2));
        assert_eq!(session.advance(3), Advance::Finished);
        assert_eq!(session.round_index(), 3);
        assert_eq!(session.advance(3), Advance::Finished);
        assert_eq!(session.round_index(), 3);
        assert_eq!(session.phase(), RoundPhase::GameOver);
    }

    #[test]
    fn finished_session_rejects_everything() {
        let (mut session, alice, _) = duel();
        session.abandon();
        assert_eq!(
            session.settle_answer(alice, "Paris", &item()),
            Err(AnswerRejected::GameOver)
        );
        assert!(!session.settle_timeout());
    }

    #[test]
    fn timer_slot_rejects_stale_ticket() {
        let mut slot = TimerSlot::default();
        let first = slot.cancel();
        let second = slot.cancel();
        assert_ne!(first, second);
        assert!(!slot.claim(first));
        assert!(slot.claim(second));
        assert!(slot.handle.is_none());
    }

    #[test]
    fn summary_reports_one_based_round() {
        let (session, alice, bob) = duel();
        let summary = session.summary();
        assert_eq!(summary.round, 1);
        assert!(summary.players.contains(&alice));
        assert!(summary.players.contains(&bob));
    }
}
