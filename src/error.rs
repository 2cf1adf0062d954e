//! Duel error types with client-facing codes and HTTP status mapping.
//!
//! [`DuelError`] is the central error type. Over WebSocket a failure is sent
//! back to the originating connection as an `error` event carrying the code
//! and message; over REST it becomes a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::SessionId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "Target player not found"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Every way a lobby, matchmaking or round operation can be refused.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status               |
/// |-----------|---------------------|---------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request           |
/// | 2000–2999 | Lobby / matchmaking | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server              | 500 Internal Server Error |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DuelError {
    /// The trimmed display name is already held by a connected participant.
    #[error("Name already taken")]
    NameConflict,

    /// The challenging connection has not joined the lobby.
    #[error("Invalid challenger session")]
    InvalidChallenger,

    /// The challenging connection is already playing a duel.
    #[error("You are already in a game")]
    AlreadyBusy,

    /// The challenged handle is not registered.
    #[error("Target player not found")]
    TargetNotFound,

    /// The challenged participant is already playing a duel.
    #[error("Target player is in game")]
    TargetBusy,

    /// A participant tried to duel themselves.
    #[error("You cannot challenge yourself")]
    SelfChallenge,

    /// The referenced duel is not live. Never surfaced to clients.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Malformed command or payload.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DuelError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::SelfChallenge => 1002,
            Self::NameConflict => 2001,
            Self::InvalidChallenger => 2002,
            Self::TargetNotFound => 2003,
            Self::AlreadyBusy => 2004,
            Self::TargetBusy => 2005,
            Self::SessionNotFound(_) => 2006,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::SelfChallenge => StatusCode::BAD_REQUEST,
            Self::InvalidChallenger | Self::TargetNotFound | Self::SessionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::NameConflict | Self::AlreadyBusy | Self::TargetBusy => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure should be reported back to the client.
    ///
    /// A late `submitAnswer` or `timeout` for a duel that already ended is
    /// normal traffic and is dropped quietly.
    #[must_use]
    pub const fn is_surfaced(&self) -> bool {
        !matches!(self, Self::SessionNotFound(_))
    }

    /// Builds the client-facing error body.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for DuelError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_body(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
