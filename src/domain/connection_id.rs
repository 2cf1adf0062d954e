//! Ephemeral per-connection participant handle.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Handle identifying one WebSocket connection for its whole lifetime.
///
/// Assigned by the gateway when the socket is upgraded and announced to the
/// client in the `welcome` event. It is the only identity a participant has;
/// scores and busy flags are always looked up through it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random handle.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for ConnectionId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}
