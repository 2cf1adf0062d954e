//! Domain layer: identifiers, lobby, duel state machine and event system.
//!
//! Everything here is transport-agnostic. The lobby and duel sessions
//! expose pure transitions that report what changed; publishing the
//! resulting events is left to the service layer.

pub mod connection_id;
pub mod duel_event;
pub mod duel_session;
pub mod event_bus;
pub mod lobby;
pub mod participant;
pub mod quiz;
pub mod session_id;
pub mod session_table;

pub use connection_id::ConnectionId;
pub use duel_event::{Audience, BusMessage, DuelEvent, GameOverData};
pub use duel_session::{DuelSession, RoundPhase, Scores, SessionSummary};
pub use event_bus::EventBus;
pub use lobby::LobbyRegistry;
pub use participant::{Participant, ParticipantSummary};
pub use quiz::{QuizBank, QuizItem};
pub use session_id::SessionId;
pub use session_table::SessionTable;
