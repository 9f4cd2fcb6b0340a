//! Networked play for fleeting tic-tac-toe.
//!
//! A [`SessionCoordinator`] pairs two peers per room and enforces whose turn
//! it is. It relays moves without checking them against the board; each peer
//! runs a [`ClientSync`] that applies moves to its own `MatchState` and
//! rejects anything the rules forbid.
//!
//! # Architecture
//!
//! - **Coordinator**: one task owning the room registry, fed by an mpsc queue
//! - **Handle**: cloneable async front end returning results over oneshot
//! - **Server**: axum WebSocket transport speaking JSON
//! - **ClientSync**: per-peer mirror that gates local input on the turn flag

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client_sync;
mod config;
mod coordinator;
mod error;
mod handle;
mod protocol;
mod registry;
mod room_code;
mod server;

pub use client_sync::{ClientSync, SessionStatus, SyncError, SyncUpdate};
pub use config::{ConfigError, ServerConfig};
pub use coordinator::{MAX_CODE_ATTEMPTS, Outbox, SessionCoordinator};
pub use error::{ErrorBody, SessionError};
pub use handle::{CoordinatorHandle, spawn};
pub use protocol::{ClientRequest, Outcome, PeerId, Reply, Role, ServerMessage};
pub use registry::{Room, RoomRegistry};
pub use room_code::{DEFAULT_CODE_LENGTH, MAX_CODE_LENGTH, RoomCode};
pub use server::{router, serve};
