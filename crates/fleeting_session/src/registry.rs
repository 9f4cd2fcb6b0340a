//! Room registry owned by the coordinator.

use super::error::SessionError;
use super::protocol::{PeerId, Role};
use super::room_code::RoomCode;
use derive_getters::Getters;
use derive_new::new;
use fleeting_tictactoe::Mark;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// A host, at most one guest, and the authoritative turn flag.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct Room {
    /// Room identifier.
    code: RoomCode,
    /// Creator of the room.
    #[getter(copy)]
    host: PeerId,
    /// Second peer, once joined.
    #[new(default)]
    #[getter(copy)]
    guest: Option<PeerId>,
    /// Mark allowed to move next.
    #[new(value = "Mark::X")]
    #[getter(copy)]
    turn: Mark,
    /// Whether the host has started a match.
    #[new(default)]
    #[getter(copy)]
    started: bool,
}

impl Room {
    /// The seat `peer` occupies, if any.
    pub fn role_of(&self, peer: PeerId) -> Option<Role> {
        if self.host == peer {
            Some(Role::Host)
        } else if self.guest == Some(peer) {
            Some(Role::Guest)
        } else {
            None
        }
    }

    /// The peer in the other seat.
    pub fn other(&self, peer: PeerId) -> Option<PeerId> {
        match self.role_of(peer)? {
            Role::Host => self.guest,
            Role::Guest => Some(self.host),
        }
    }

    /// Both seated peers.
    pub fn peers(&self) -> impl Iterator<Item = PeerId> {
        std::iter::once(self.host).chain(self.guest)
    }

    /// Seats a guest.
    pub(crate) fn seat_guest(&mut self, peer: PeerId) -> Result<(), SessionError> {
        if self.guest.is_some() {
            return Err(SessionError::RoomFull(self.code.clone()));
        }
        self.guest = Some(peer);
        Ok(())
    }

    /// Marks the match started with the host's mark on turn.
    pub(crate) fn start(&mut self) {
        self.started = true;
        self.turn = Role::Host.mark();
    }

    /// Hands the turn to the other mark and returns it.
    pub(crate) fn flip_turn(&mut self) -> Mark {
        self.turn = self.turn.opponent();
        self.turn
    }
}

/// Code to room map. Creation and removal are its only structural mutations.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a room; fails if the code is taken.
    #[instrument(skip(self, room), fields(code = %room.code()))]
    pub fn create(&mut self, room: Room) -> Result<(), SessionError> {
        if self.rooms.contains_key(room.code()) {
            return Err(SessionError::RoomExists(room.code().clone()));
        }
        debug!(count = self.rooms.len() + 1, "Room registered");
        self.rooms.insert(room.code().clone(), room);
        Ok(())
    }

    /// Looks up a room.
    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub(crate) fn get_mut(&mut self, code: &RoomCode) -> Result<&mut Room, SessionError> {
        self.rooms
            .get_mut(code)
            .ok_or_else(|| SessionError::RoomNotFound(code.clone()))
    }

    /// Deletes a room, returning it if it existed.
    #[instrument(skip(self), fields(room = %code))]
    pub fn remove(&mut self, code: &RoomCode) -> Option<Room> {
        let removed = self.rooms.remove(code);
        debug!(removed = removed.is_some(), count = self.rooms.len(), "Room removed");
        removed
    }

    /// Returns true if the code is registered.
    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Number of open rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns true when no rooms are open.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
