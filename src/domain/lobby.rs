//! Lobby registry: who is connected and who is free to duel.
//!
//! [`LobbyRegistry`] is a plain, synchronous structure. The service layer
//! owns it behind a single `RwLock` and publishes the idle list after every
//! mutation; the registry itself never talks to the event bus.

use super::participant::{Participant, ParticipantSummary};
use super::ConnectionId;
use crate::error::DuelError;

/// Result of a successful [`LobbyRegistry::register`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The participant was added.
    Registered,
    /// The handle had already joined; nothing changed.
    AlreadyRegistered,
}

/// Registered participants in registration order.
#[derive(Debug, Default)]
pub struct LobbyRegistry {
    participants: Vec<Participant>,
}

impl LobbyRegistry {
    /// Creates an empty lobby.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a participant under the trimmed `name`.
    ///
    /// A repeated join from an already registered handle is accepted
    /// without changing anything.
    ///
    /// # Errors
    ///
    /// Returns [`DuelError::InvalidRequest`] if the trimmed name is empty and
    /// [`DuelError::NameConflict`] if any registered participant, busy or
    /// idle, already uses it.
    pub fn register(&mut self, name: &str, id: ConnectionId) -> Result<Registration, DuelError> {
        if self.get(id).is_some() {
            return Ok(Registration::AlreadyRegistered);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(DuelError::InvalidRequest("name must not be empty".into()));
        }
        if self.participants.iter().any(|p| p.name == name) {
            return Err(DuelError::NameConflict);
        }
        self.participants
            .push(Participant::new(id, name.to_string()));
        Ok(Registration::Registered)
    }

    /// Removes a participant, returning it if it was registered.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Participant> {
        let pos = self.participants.iter().position(|p| p.id == id)?;
        Some(self.participants.remove(pos))
    }

    /// Sets the busy flag. Returns `false` if the handle is unknown.
    pub fn set_busy(&mut self, id: ConnectionId, busy: bool) -> bool {
        match self.participants.iter_mut().find(|p| p.id == id) {
            Some(p) => {
                p.busy = busy;
                true
            }
            None => false,
        }
    }

    /// Looks up a participant by handle.
    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Snapshot of idle participants in registration order.
    #[must_use]
    pub fn list_idle(&self) -> Vec<ParticipantSummary> {
        self.participants
            .iter()
            .filter(|p| !p.busy)
            .map(ParticipantSummary::from)
            .collect()
    }

    /// Checks that `from` may duel `to` right now.
    ///
    /// Checks run in order and stop at the first failure: `from` is
    /// registered, `from` is idle, `from` is not `to`, `to` is registered,
    /// `to` is idle.
    ///
    /// # Errors
    ///
    /// [`DuelError::InvalidChallenger`], [`DuelError::AlreadyBusy`],
    /// [`DuelError::SelfChallenge`], [`DuelError::TargetNotFound`] or
    /// [`DuelError::TargetBusy`].
    pub fn check_pair(
        &self,
        from: ConnectionId,
        to: ConnectionId,
    ) -> Result<(&Participant, &Participant), DuelError> {
        let challenger = self.get(from).ok_or(DuelError::InvalidChallenger)?;
        if challenger.busy {
            return Err(DuelError::AlreadyBusy);
        }
        if from == to {
            return Err(DuelError::SelfChallenge);
        }
        let target = self.get(to).ok_or(DuelError::TargetNotFound)?;
        if target.busy {
            return Err(DuelError::TargetBusy);
        }
        Ok((challenger, target))
    }

    /// Validates the pair and marks both participants busy in one step.
    ///
    /// # Errors
    ///
    /// Same as [`LobbyRegistry::check_pair`]; nothing is mutated on error.
    pub fn reserve_pair(&mut self, from: ConnectionId, to: ConnectionId) -> Result<(), DuelError> {
        self.check_pair(from, to)?;
        self.set_busy(from, true);
        self.set_busy(to, true);
        Ok(())
    }

    /// Clears the busy flag of every listed handle that is still registered.
    pub fn release(&mut self, ids: &[ConnectionId]) {
        for id in ids {
            self.set_busy(*id, false);
        }
    }

    /// Number of registered participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Returns `true` if nobody has joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
