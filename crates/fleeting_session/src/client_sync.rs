//! Client-side mirror of a networked match.
//!
//! Each peer keeps its own [`MatchState`] and applies both its own moves and
//! the relayed opponent moves to it. The coordinator only says whose turn it
//! is; [`ClientSync`] refuses input until that flag points at this peer.

use super::error::ErrorBody;
use super::protocol::{ClientRequest, Outcome, Reply, Role, ServerMessage};
use super::room_code::RoomCode;
use fleeting_tictactoe::{
    FadeTracker, Mark, MatchObserver, MatchState, MoveError, PlaceOutcome, Position, Ruleset,
    notify,
};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Where this peer is in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    /// Create or join not yet confirmed.
    Seating,
    /// Seated, waiting for an opponent.
    Waiting,
    /// Both seats taken, waiting for the host to start.
    Ready,
    /// A match is running (or just ended, awaiting a restart).
    Playing,
    /// The opponent left; the session is over.
    OpponentLeft,
    /// This peer left; the session is over.
    Left,
}

impl SessionStatus {
    /// Returns true once the room is gone for this peer.
    pub fn is_over(self) -> bool {
        matches!(self, SessionStatus::OpponentLeft | SessionStatus::Left)
    }
}

/// Why a local move was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SyncError {
    /// The create or join has not been confirmed.
    #[display("Not seated in a room yet")]
    NotSeated,
    /// The host has not started the match.
    #[display("Match has not started")]
    NotStarted,
    /// The coordinator says it is the opponent's turn.
    #[display("Waiting for the opponent")]
    NotYourTurn,
    /// The opponent left.
    #[display("Session is over")]
    SessionOver,
    /// The local match refused the placement.
    #[display("{}", _0)]
    Move(MoveError),
}

impl From<MoveError> for SyncError {
    fn from(error: MoveError) -> Self {
        SyncError::Move(error)
    }
}

/// Result of applying one server message.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncUpdate {
    /// Create or join confirmed.
    Seated,
    /// Some other request succeeded.
    Acknowledged(Reply),
    /// A request was refused; carries the reason to show.
    Refused(ErrorBody),
    /// A guest took the free seat.
    OpponentJoined,
    /// The opponent left. Terminal.
    OpponentLeft,
    /// This peer's leave was confirmed. Terminal.
    Left,
    /// Fresh board, host to move.
    MatchStarted,
    /// Authoritative turn flag changed.
    TurnChanged(Mark),
    /// The relayed move was applied locally.
    OpponentMoved(PlaceOutcome),
    /// The relayed move broke local rules and was dropped.
    Rejected(MoveError),
    /// Nothing to do.
    Ignored,
}

/// One peer's view of a networked match.
pub struct ClientSync {
    role: Role,
    code: RoomCode,
    state: MatchState,
    status: SessionStatus,
    turn: Mark,
    unsynced: Option<Position>,
    observer: Option<Box<dyn MatchObserver>>,
    fades: FadeTracker,
}

impl std::fmt::Debug for ClientSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSync")
            .field("role", &self.role)
            .field("code", &self.code)
            .field("status", &self.status)
            .field("turn", &self.turn)
            .field("unsynced", &self.unsynced)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ClientSync {
    /// Creates a mirror for `role` in room `code`.
    #[instrument]
    pub fn new(role: Role, code: RoomCode, ruleset: Ruleset) -> Self {
        Self {
            role,
            code,
            state: MatchState::new(ruleset),
            status: SessionStatus::Seating,
            turn: Role::Host.mark(),
            unsynced: None,
            observer: None,
            fades: FadeTracker::default(),
        }
    }

    /// Attaches a renderer/cue sink.
    pub fn with_observer(mut self, observer: Box<dyn MatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The request that seats this peer.
    pub fn seat_request(&self) -> ClientRequest {
        match self.role {
            Role::Host => ClientRequest::CreateRoom {
                code: Some(self.code.clone()),
            },
            Role::Guest => ClientRequest::JoinRoom {
                code: self.code.clone(),
            },
        }
    }

    /// The request that starts a match. Only meaningful for the host.
    pub fn start_request(&self) -> ClientRequest {
        ClientRequest::StartMatch {
            code: self.code.clone(),
        }
    }

    /// The request that leaves the room.
    pub fn leave_request(&self) -> ClientRequest {
        ClientRequest::LeaveRoom {
            code: self.code.clone(),
        }
    }

    /// This peer's seat.
    pub fn role(&self) -> Role {
        self.role
    }

    /// This peer's mark.
    pub fn mark(&self) -> Mark {
        self.role.mark()
    }

    /// Room code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Local match mirror.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Mark the coordinator last said is on turn.
    pub fn authoritative_turn(&self) -> Mark {
        self.turn
    }

    /// Fade animations for evicted pieces.
    pub fn fades(&self) -> &FadeTracker {
        &self.fades
    }

    /// Seat the coordinator last said may move.
    pub fn seat_on_turn(&self) -> Role {
        Role::for_mark(self.turn)
    }

    /// Local placement sent but not yet confirmed by the coordinator.
    pub fn unsynced(&self) -> Option<Position> {
        self.unsynced
    }

    /// Returns true if a local move would currently be accepted.
    pub fn is_my_turn(&self) -> bool {
        self.status == SessionStatus::Playing
            && self.seat_on_turn() == self.role
            && self.state.is_playing()
    }

    /// Applies a local move and returns the request to forward.
    ///
    /// Nothing changes when the move is refused.
    #[instrument(skip(self), fields(room = %self.code, role = %self.role))]
    pub fn request_move(&mut self, position: Position) -> Result<ClientRequest, SyncError> {
        match self.status {
            SessionStatus::OpponentLeft | SessionStatus::Left => {
                return Err(SyncError::SessionOver);
            }
            SessionStatus::Seating => return Err(SyncError::NotSeated),
            SessionStatus::Waiting | SessionStatus::Ready => return Err(SyncError::NotStarted),
            SessionStatus::Playing => {}
        }
        if self.seat_on_turn() != self.role {
            return Err(SyncError::NotYourTurn);
        }
        self.place(position, self.mark())?;
        self.unsynced = Some(position);
        debug!(%position, "Local move applied");
        Ok(ClientRequest::SubmitMove {
            code: self.code.clone(),
            position,
        })
    }

    /// Mirrors one server message.
    #[instrument(skip(self, message), fields(room = %self.code, role = %self.role))]
    pub fn apply(&mut self, message: &ServerMessage) -> SyncUpdate {
        if self.status.is_over() {
            debug!(?message, "Session over, ignoring message");
            return SyncUpdate::Ignored;
        }
        match message {
            ServerMessage::Reply { result } => self.apply_reply(result),
            ServerMessage::OpponentJoined => {
                info!("Opponent joined");
                self.status = SessionStatus::Ready;
                SyncUpdate::OpponentJoined
            }
            ServerMessage::OpponentLeft => {
                info!("Opponent left");
                self.status = SessionStatus::OpponentLeft;
                self.unsynced = None;
                self.fades.clear();
                SyncUpdate::OpponentLeft
            }
            ServerMessage::MatchStarted => {
                info!("Match started");
                self.state.reset();
                self.fades.clear();
                self.unsynced = None;
                self.turn = Role::Host.mark();
                self.status = SessionStatus::Playing;
                if let Some(sink) = self.observer.as_mut() {
                    sink.redraw(&self.state.view());
                }
                SyncUpdate::MatchStarted
            }
            ServerMessage::TurnChanged { mark } => {
                if self.state.is_playing() && self.state.turn() != *mark {
                    warn!(
                        authoritative = %mark,
                        seat = %Role::for_mark(*mark),
                        local = %self.state.turn(),
                        "Turn flag disagrees with local mirror"
                    );
                }
                self.turn = *mark;
                SyncUpdate::TurnChanged(*mark)
            }
            ServerMessage::OpponentMove { position } => {
                match self.place(*position, self.mark().opponent()) {
                    Ok(outcome) => SyncUpdate::OpponentMoved(outcome),
                    Err(e) => {
                        warn!(%position, error = %e, "Relayed move rejected locally");
                        SyncUpdate::Rejected(e)
                    }
                }
            }
        }
    }

    fn apply_reply(&mut self, result: &Outcome) -> SyncUpdate {
        match result {
            Outcome::Ok(Reply::Created { .. }) if self.status == SessionStatus::Seating => {
                self.status = SessionStatus::Waiting;
                SyncUpdate::Seated
            }
            Outcome::Ok(Reply::Joined { .. }) if self.status == SessionStatus::Seating => {
                self.status = SessionStatus::Ready;
                SyncUpdate::Seated
            }
            Outcome::Ok(Reply::Left { .. }) => {
                info!("Left the room");
                self.status = SessionStatus::Left;
                self.unsynced = None;
                self.fades.clear();
                SyncUpdate::Left
            }
            Outcome::Ok(reply) => {
                if let Reply::Moved { .. } = reply {
                    self.unsynced = None;
                }
                SyncUpdate::Acknowledged(reply.clone())
            }
            Outcome::Error(body) => {
                match self.unsynced.take() {
                    Some(position) => warn!(
                        code = %body.code,
                        message = %body.message,
                        %position,
                        "Request refused; local placement was never relayed"
                    ),
                    None => warn!(code = %body.code, message = %body.message, "Request refused"),
                }
                SyncUpdate::Refused(body.clone())
            }
        }
    }

    fn place(&mut self, position: Position, mark: Mark) -> Result<PlaceOutcome, MoveError> {
        let outcome = self.state.place(position, mark)?;
        let now = Instant::now();
        self.fades.cancel(position);
        if let Some(evicted) = outcome.evicted {
            self.fades.schedule(evicted, now);
        }
        self.fades.prune(now);
        if let Some(sink) = self.observer.as_mut() {
            notify(sink.as_mut(), &self.state, &outcome);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleeting_tictactoe::Phase;

    fn code() -> RoomCode {
        RoomCode::parse("ABC123").expect("valid code")
    }

    fn playing(role: Role) -> ClientSync {
        let mut sync = ClientSync::new(role, code(), Ruleset::compact());
        let seated = match role {
            Role::Host => Reply::Created {
                code: code(),
                mark: Mark::X,
            },
            Role::Guest => Reply::Joined {
                code: code(),
                mark: Mark::O,
            },
        };
        assert_eq!(sync.apply(&ServerMessage::reply(Ok(seated))), SyncUpdate::Seated);
        sync.apply(&ServerMessage::MatchStarted);
        sync
    }

    #[test]
    fn test_gates_before_start() {
        let mut host = ClientSync::new(Role::Host, code(), Ruleset::compact());
        assert_eq!(
            host.request_move(Position::new(0, 0)),
            Err(SyncError::NotSeated)
        );
        host.apply(&ServerMessage::reply(Ok(Reply::Created {
            code: code(),
            mark: Mark::X,
        })));
        assert_eq!(host.status(), SessionStatus::Waiting);
        assert_eq!(
            host.request_move(Position::new(0, 0)),
            Err(SyncError::NotStarted)
        );
        host.apply(&ServerMessage::OpponentJoined);
        assert_eq!(host.status(), SessionStatus::Ready);
    }

    #[test]
    fn test_host_moves_first_then_waits() {
        let mut host = playing(Role::Host);
        let request = host.request_move(Position::new(1, 1)).expect("host's turn");
        assert_eq!(
            request,
            ClientRequest::SubmitMove {
                code: code(),
                position: Position::new(1, 1)
            }
        );
        assert_eq!(host.state().board().occupant(Position::new(1, 1)), Some(Mark::X));

        // Turn flag not yet flipped by the server; local rules still refuse.
        assert_eq!(
            host.request_move(Position::new(0, 0)),
            Err(SyncError::Move(MoveError::WrongTurn(Mark::X)))
        );
        host.apply(&ServerMessage::TurnChanged { mark: Mark::O });
        assert_eq!(
            host.request_move(Position::new(0, 0)),
            Err(SyncError::NotYourTurn)
        );
    }

    #[test]
    fn test_guest_waits_for_host() {
        let mut guest = playing(Role::Guest);
        assert_eq!(
            guest.request_move(Position::new(0, 0)),
            Err(SyncError::NotYourTurn)
        );

        let update = guest.apply(&ServerMessage::OpponentMove {
            position: Position::new(0, 0),
        });
        assert!(matches!(update, SyncUpdate::OpponentMoved(_)));
        guest.apply(&ServerMessage::TurnChanged { mark: Mark::O });
        assert!(guest.is_my_turn());
        assert!(guest.request_move(Position::new(1, 1)).is_ok());
    }

    #[test]
    fn test_bad_relayed_move_is_rejected() {
        let mut guest = playing(Role::Guest);
        guest.apply(&ServerMessage::OpponentMove {
            position: Position::new(0, 0),
        });
        let update = guest.apply(&ServerMessage::OpponentMove {
            position: Position::new(0, 0),
        });
        assert_eq!(
            update,
            SyncUpdate::Rejected(MoveError::CellOccupied(Position::new(0, 0)))
        );
        assert_eq!(guest.state().queue().len(), 1);
    }

    #[test]
    fn test_match_started_resets_but_keeps_scores() {
        let mut host = playing(Role::Host);
        let moves = [(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)];
        for (i, &(row, col)) in moves.iter().enumerate() {
            let position = Position::new(row, col);
            if i % 2 == 0 {
                host.request_move(position).expect("host's turn");
                host.apply(&ServerMessage::TurnChanged { mark: Mark::O });
            } else {
                host.apply(&ServerMessage::OpponentMove { position });
                host.apply(&ServerMessage::TurnChanged { mark: Mark::X });
            }
        }
        assert_eq!(host.state().phase(), Phase::Ended);
        assert_eq!(host.state().winner(), Some(Mark::X));

        host.apply(&ServerMessage::MatchStarted);
        assert!(host.state().is_playing());
        assert_eq!(host.state().board().occupied_count(), 0);
        assert_eq!(host.state().scores().get(Mark::X), 1);
        assert_eq!(host.authoritative_turn(), Mark::X);
    }

    #[test]
    fn test_opponent_left_is_terminal() {
        let mut host = playing(Role::Host);
        assert_eq!(host.apply(&ServerMessage::OpponentLeft), SyncUpdate::OpponentLeft);
        assert_eq!(host.status(), SessionStatus::OpponentLeft);
        assert_eq!(
            host.request_move(Position::new(0, 0)),
            Err(SyncError::SessionOver)
        );
        assert_eq!(host.apply(&ServerMessage::MatchStarted), SyncUpdate::Ignored);
    }

    #[test]
    fn test_own_leave_is_terminal() {
        let mut host = playing(Role::Host);
        let update = host.apply(&ServerMessage::reply(Ok(Reply::Left { code: code() })));
        assert_eq!(update, SyncUpdate::Left);
        assert_eq!(host.status(), SessionStatus::Left);
        assert!(host.status().is_over());
        assert!(!host.is_my_turn());

        assert_eq!(
            host.request_move(Position::new(0, 0)),
            Err(SyncError::SessionOver)
        );
        assert_eq!(host.state().queue().len(), 0);
        assert_eq!(host.apply(&ServerMessage::OpponentJoined), SyncUpdate::Ignored);
    }

    #[test]
    fn test_refused_move_clears_unsynced_placement() {
        let mut host = playing(Role::Host);
        host.request_move(Position::new(1, 1)).expect("host's turn");
        assert_eq!(host.unsynced(), Some(Position::new(1, 1)));

        let update = host.apply(&ServerMessage::reply(Err(
            crate::SessionError::RoomNotFound(code()),
        )));
        assert!(matches!(update, SyncUpdate::Refused(_)));
        assert_eq!(host.unsynced(), None);
        assert_eq!(host.state().queue().len(), 1);
    }

    #[test]
    fn test_confirmed_move_clears_unsynced_placement() {
        let mut host = playing(Role::Host);
        host.request_move(Position::new(1, 1)).expect("host's turn");
        host.apply(&ServerMessage::reply(Ok(Reply::Moved {
            code: code(),
            turn: Mark::O,
        })));
        assert_eq!(host.unsynced(), None);
        host.apply(&ServerMessage::TurnChanged { mark: Mark::O });
        assert_eq!(host.seat_on_turn(), Role::Guest);
    }

    #[test]
    fn test_refusal_surfaces_reason() {
        let mut guest = ClientSync::new(Role::Guest, code(), Ruleset::compact());
        let update = guest.apply(&ServerMessage::reply(Err(
            crate::SessionError::RoomFull(code()),
        )));
        let SyncUpdate::Refused(body) = update else {
            panic!("expected a refusal");
        };
        assert_eq!(body.code, "room_full");
        assert_eq!(guest.status(), SessionStatus::Seating);
    }
}
