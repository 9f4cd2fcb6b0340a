//! Session errors.

use super::room_code::RoomCode;
use serde::{Deserialize, Serialize};

/// A rejected room or relay request. Never mutates coordinator state.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SessionError {
    /// A room with this code is already registered.
    #[display("Room {} already exists", _0)]
    RoomExists(#[error(not(source))] RoomCode),

    /// No room is registered under this code.
    #[display("Room {} not found", _0)]
    RoomNotFound(#[error(not(source))] RoomCode),

    /// The room already has a guest.
    #[display("Room {} is full", _0)]
    RoomFull(#[error(not(source))] RoomCode),

    /// The caller may not perform this action right now.
    #[display("Not authorized: {}", _0)]
    NotAuthorized(#[error(not(source))] String),

    /// The code is empty, too long or not alphanumeric.
    #[display("Invalid room code: {:?}", _0)]
    InvalidRoomCode(#[error(not(source))] String),

    /// The caller already sits in a room.
    #[display("Already seated in room {}", _0)]
    AlreadySeated(#[error(not(source))] RoomCode),

    /// No unused room code could be generated.
    #[display("No free room code after {} attempts", _0)]
    NoFreeCode(#[error(not(source))] usize),

    /// The coordinator task has stopped.
    #[display("Session coordinator is not running")]
    CoordinatorClosed,
}

impl SessionError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomExists(_) => "room_exists",
            Self::RoomNotFound(_) => "room_not_found",
            Self::RoomFull(_) => "room_full",
            Self::NotAuthorized(_) => "not_authorized",
            Self::InvalidRoomCode(_) => "invalid_room_code",
            Self::AlreadySeated(_) => "already_seated",
            Self::NoFreeCode(_) => "no_free_code",
            Self::CoordinatorClosed => "coordinator_closed",
        }
    }

    pub(crate) fn not_authorized(reason: impl Into<String>) -> Self {
        Self::NotAuthorized(reason.into())
    }
}

impl Serialize for SessionError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ErrorBody::from(self).serialize(serializer)
    }
}

/// Wire form of a failure: a stable code plus a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code, e.g. `room_full`.
    pub code: String,
    /// Reason suitable for showing to a player.
    pub message: String,
}

impl ErrorBody {
    /// Code used for frames that could not be parsed.
    pub const MALFORMED: &'static str = "malformed";

    /// Body for an unparseable client frame.
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        Self {
            code: Self::MALFORMED.to_string(),
            message: format!("Malformed request: {}", reason),
        }
    }
}

impl From<&SessionError> for ErrorBody {
    fn from(error: &SessionError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_code_and_message() {
        let code = RoomCode::parse("ABC123").expect("valid code");
        let json = serde_json::to_value(SessionError::RoomFull(code)).expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({"code": "room_full", "message": "Room ABC123 is full"})
        );
    }
}
