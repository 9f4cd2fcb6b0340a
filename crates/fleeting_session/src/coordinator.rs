//! Room lifecycle and turn authority.
//!
//! The coordinator never runs game rules. It decides who may move and
//! forwards moves; each peer validates placements against its own
//! `MatchState`.

use super::error::SessionError;
use super::protocol::{ClientRequest, PeerId, Reply, Role, ServerMessage};
use super::registry::{Room, RoomRegistry};
use super::room_code::{DEFAULT_CODE_LENGTH, RoomCode};
use fleeting_tictactoe::Position;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Random draws tried before giving up on a generated room code.
pub const MAX_CODE_ATTEMPTS: usize = 64;

/// Channel the coordinator pushes a peer's messages into.
pub type Outbox = UnboundedSender<ServerMessage>;

/// Single owner of the room registry and all peer channels.
#[derive(Debug)]
pub struct SessionCoordinator {
    registry: RoomRegistry,
    outboxes: HashMap<PeerId, Outbox>,
    seats: HashMap<PeerId, RoomCode>,
    next_peer: u64,
    code_length: usize,
    rng: StdRng,
}

impl SessionCoordinator {
    /// Creates a coordinator that generates codes of `code_length` characters.
    #[instrument]
    pub fn new(code_length: usize) -> Self {
        info!("Creating session coordinator");
        Self::with_rng(code_length, StdRng::from_os_rng())
    }

    /// Creates a coordinator with a fixed code generator.
    pub fn with_rng(code_length: usize, rng: StdRng) -> Self {
        Self {
            registry: RoomRegistry::new(),
            outboxes: HashMap::new(),
            seats: HashMap::new(),
            next_peer: 1,
            code_length,
            rng,
        }
    }

    /// The room registry.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Number of connected peers.
    pub fn peer_count(&self) -> usize {
        self.outboxes.len()
    }

    /// The room a peer sits in.
    pub fn seat_of(&self, peer: PeerId) -> Option<&RoomCode> {
        self.seats.get(&peer)
    }

    /// Registers a connection and returns its id.
    #[instrument(skip(self, outbox))]
    pub fn connect(&mut self, outbox: Outbox) -> PeerId {
        let peer = PeerId(self.next_peer);
        self.next_peer += 1;
        self.outboxes.insert(peer, outbox);
        info!(%peer, peers = self.outboxes.len(), "Peer connected");
        peer
    }

    /// Dispatches a request from `peer`.
    #[instrument(skip(self, request), fields(%peer, kind = request.kind()))]
    pub fn handle(&mut self, peer: PeerId, request: ClientRequest) -> Result<Reply, SessionError> {
        let result = match request {
            ClientRequest::CreateRoom { code } => self.create_room(peer, code),
            ClientRequest::JoinRoom { code } => self.join_room(peer, &code),
            ClientRequest::StartMatch { code } => self.start_match(peer, &code),
            ClientRequest::SubmitMove { code, position } => {
                self.submit_move(peer, &code, position)
            }
            ClientRequest::LeaveRoom { code } => self.leave_room(peer, &code),
        };
        if let Err(e) = &result {
            warn!(error = %e, "Request refused");
        }
        result
    }

    /// Opens a room with `peer` as host. Generates an unused code when none is given.
    #[instrument(skip(self))]
    pub fn create_room(
        &mut self,
        peer: PeerId,
        code: Option<RoomCode>,
    ) -> Result<Reply, SessionError> {
        self.ensure_unseated(peer)?;
        let code = match code {
            Some(code) => code,
            None => self.unused_code()?,
        };
        self.registry.create(Room::new(code.clone(), peer))?;
        self.seats.insert(peer, code.clone());
        info!(room = %code, host = %peer, "Room created");
        Ok(Reply::Created {
            code,
            mark: Role::Host.mark(),
        })
    }

    /// Seats `peer` as guest and tells the host.
    #[instrument(skip(self))]
    pub fn join_room(&mut self, peer: PeerId, code: &RoomCode) -> Result<Reply, SessionError> {
        self.ensure_unseated(peer)?;
        let room = self.registry.get_mut(code)?;
        room.seat_guest(peer)?;
        let host = room.host();
        self.seats.insert(peer, code.clone());
        info!(room = %code, guest = %peer, "Guest joined");
        self.send(host, ServerMessage::OpponentJoined);
        Ok(Reply::Joined {
            code: code.clone(),
            mark: Role::Guest.mark(),
        })
    }

    /// Starts (or restarts) the match. Host only, and only with a guest present.
    #[instrument(skip(self))]
    pub fn start_match(&mut self, peer: PeerId, code: &RoomCode) -> Result<Reply, SessionError> {
        let room = self.registry.get_mut(code)?;
        if room.host() != peer {
            return Err(SessionError::not_authorized("only the host can start the match"));
        }
        if room.guest().is_none() {
            return Err(SessionError::not_authorized("waiting for an opponent"));
        }
        room.start();
        let turn = room.turn();
        let peers: Vec<PeerId> = room.peers().collect();
        info!(room = %code, "Match started");
        for target in peers {
            self.send(target, ServerMessage::MatchStarted);
            self.send(target, ServerMessage::TurnChanged { mark: turn });
        }
        Ok(Reply::Started { code: code.clone() })
    }

    /// Checks move authority, relays the move and flips the turn.
    #[instrument(skip(self))]
    pub fn submit_move(
        &mut self,
        peer: PeerId,
        code: &RoomCode,
        position: Position,
    ) -> Result<Reply, SessionError> {
        let room = self.registry.get_mut(code)?;
        let role = room
            .role_of(peer)
            .ok_or_else(|| SessionError::not_authorized("not seated in this room"))?;
        if !room.started() {
            return Err(SessionError::not_authorized("match has not started"));
        }
        if role.mark() != room.turn() {
            return Err(SessionError::not_authorized(format!(
                "not your turn, waiting for {}",
                room.turn()
            )));
        }
        let opponent = room.other(peer);
        let turn = room.flip_turn();
        let peers: Vec<PeerId> = room.peers().collect();

        debug!(room = %code, %position, next = %turn, "Relaying move");
        if let Some(opponent) = opponent {
            self.send(opponent, ServerMessage::OpponentMove { position });
        }
        for target in peers {
            self.send(target, ServerMessage::TurnChanged { mark: turn });
        }
        Ok(Reply::Moved {
            code: code.clone(),
            turn,
        })
    }

    /// Closes the room and tells the other peer.
    #[instrument(skip(self))]
    pub fn leave_room(&mut self, peer: PeerId, code: &RoomCode) -> Result<Reply, SessionError> {
        let room = self
            .registry
            .get(code)
            .ok_or_else(|| SessionError::RoomNotFound(code.clone()))?;
        if room.role_of(peer).is_none() {
            return Err(SessionError::not_authorized("not seated in this room"));
        }
        self.close_room(code, peer);
        Ok(Reply::Left { code: code.clone() })
    }

    /// Drops a connection and closes its room, if any.
    #[instrument(skip(self))]
    pub fn disconnect(&mut self, peer: PeerId) {
        self.outboxes.remove(&peer);
        if let Some(code) = self.seats.get(&peer).cloned() {
            self.close_room(&code, peer);
        }
        info!(%peer, peers = self.outboxes.len(), "Peer disconnected");
    }

    fn close_room(&mut self, code: &RoomCode, leaver: PeerId) {
        let Some(room) = self.registry.remove(code) else {
            return;
        };
        for peer in room.peers() {
            self.seats.remove(&peer);
        }
        if let Some(other) = room.other(leaver) {
            self.send(other, ServerMessage::OpponentLeft);
        }
        info!(room = %code, %leaver, "Room closed");
    }

    fn ensure_unseated(&self, peer: PeerId) -> Result<(), SessionError> {
        match self.seats.get(&peer) {
            Some(code) => Err(SessionError::AlreadySeated(code.clone())),
            None => Ok(()),
        }
    }

    fn unused_code(&mut self) -> Result<RoomCode, SessionError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = RoomCode::generate(self.code_length, &mut self.rng);
            if !self.registry.contains(&code) {
                return Ok(code);
            }
            debug!(room = %code, attempt, "Generated code collided, retrying");
        }
        Err(SessionError::NoFreeCode(MAX_CODE_ATTEMPTS))
    }

    fn send(&self, peer: PeerId, message: ServerMessage) {
        match self.outboxes.get(&peer) {
            Some(outbox) => {
                if outbox.send(message).is_err() {
                    debug!(%peer, "Outbox closed, dropping message");
                }
            }
            None => debug!(%peer, "No outbox for peer"),
        }
    }
}

impl Default for SessionCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}
