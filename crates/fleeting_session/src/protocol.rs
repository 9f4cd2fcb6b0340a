//! Messages exchanged between peers and the coordinator.
//!
//! Everything travels as JSON tagged by a `type` field, e.g.
//! `{"type":"submit_move","code":"ABC123","position":{"row":0,"col":2}}`.

use super::error::{ErrorBody, SessionError};
use super::room_code::RoomCode;
use fleeting_tictactoe::{Mark, Position};
use serde::{Deserialize, Serialize};

/// Ephemeral connection identifier assigned by the coordinator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display,
)]
#[display("peer-{}", _0)]
pub struct PeerId(pub(crate) u64);

/// Seat within a room. Each seat plays a fixed mark.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Created the room; always moves first.
    Host,
    /// Joined an existing room.
    Guest,
}

impl Role {
    /// The mark this seat plays.
    pub fn mark(self) -> Mark {
        match self {
            Role::Host => Mark::X,
            Role::Guest => Mark::O,
        }
    }

    /// The seat playing `mark`.
    pub fn for_mark(mark: Mark) -> Self {
        match mark {
            Mark::X => Role::Host,
            Mark::O => Role::Guest,
        }
    }
}

/// Requests a peer can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Opens a room; a code is generated when none is given.
    CreateRoom {
        /// Desired code.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<RoomCode>,
    },
    /// Takes the guest seat.
    JoinRoom {
        /// Room to join.
        code: RoomCode,
    },
    /// Host only: starts or restarts the match.
    StartMatch {
        /// Room to start.
        code: RoomCode,
    },
    /// Relays a placement to the opponent.
    SubmitMove {
        /// Room the move belongs to.
        code: RoomCode,
        /// Where the piece goes.
        position: Position,
    },
    /// Closes the room.
    LeaveRoom {
        /// Room to leave.
        code: RoomCode,
    },
}

impl ClientRequest {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::StartMatch { .. } => "start_match",
            Self::SubmitMove { .. } => "submit_move",
            Self::LeaveRoom { .. } => "leave_room",
        }
    }
}

/// Successful result of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    /// Room registered with the caller as host.
    Created {
        /// The room code, generated or as requested.
        code: RoomCode,
        /// The caller's mark.
        mark: Mark,
    },
    /// Caller seated as guest.
    Joined {
        /// The room code.
        code: RoomCode,
        /// The caller's mark.
        mark: Mark,
    },
    /// Match started.
    Started {
        /// The room code.
        code: RoomCode,
    },
    /// Move relayed; the turn has passed.
    Moved {
        /// The room code.
        code: RoomCode,
        /// Mark now on turn.
        turn: Mark,
    },
    /// Room closed.
    Left {
        /// The room code.
        code: RoomCode,
    },
}

/// Either side of a request result, as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The request succeeded.
    Ok(Reply),
    /// The request was refused.
    Error(ErrorBody),
}

impl From<Result<Reply, SessionError>> for Outcome {
    fn from(result: Result<Reply, SessionError>) -> Self {
        match result {
            Ok(reply) => Outcome::Ok(reply),
            Err(e) => Outcome::Error(ErrorBody::from(&e)),
        }
    }
}

/// Everything the coordinator sends to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Answer to the peer's last request.
    Reply {
        /// What happened.
        result: Outcome,
    },
    /// A guest took the free seat.
    OpponentJoined,
    /// The other peer left or disconnected; the room is gone.
    OpponentLeft,
    /// The host started a match; boards reset.
    MatchStarted,
    /// Authoritative turn flag.
    TurnChanged {
        /// Mark now on turn.
        mark: Mark,
    },
    /// The other peer placed a piece.
    OpponentMove {
        /// Where it went.
        position: Position,
    },
}

impl ServerMessage {
    /// Wraps a request result.
    pub fn reply(result: Result<Reply, SessionError>) -> Self {
        ServerMessage::Reply {
            result: result.into(),
        }
    }
}
