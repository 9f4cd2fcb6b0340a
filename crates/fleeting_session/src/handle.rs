//! Async front end for the coordinator task.
//!
//! The coordinator runs on one task and takes commands from an mpsc queue,
//! finishing each before looking at the next. Moves for a room are therefore
//! processed in arrival order without any locking.

use super::coordinator::{Outbox, SessionCoordinator};
use super::error::SessionError;
use super::protocol::{ClientRequest, PeerId, Reply};
use super::room_code::RoomCode;
use fleeting_tictactoe::Position;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

#[derive(Debug)]
enum Command {
    Connect {
        outbox: Outbox,
        respond: oneshot::Sender<PeerId>,
    },
    Request {
        peer: PeerId,
        request: ClientRequest,
        respond: oneshot::Sender<Result<Reply, SessionError>>,
    },
    Disconnect {
        peer: PeerId,
    },
}

/// Cloneable handle to a running coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
}

/// Moves `coordinator` onto its own task.
///
/// The task ends once every handle has been dropped.
#[instrument(skip(coordinator))]
pub fn spawn(coordinator: SessionCoordinator) -> (CoordinatorHandle, JoinHandle<()>) {
    let (commands, inbox) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(coordinator, inbox));
    info!("Coordinator task spawned");
    (CoordinatorHandle { commands }, task)
}

async fn run(mut coordinator: SessionCoordinator, mut inbox: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = inbox.recv().await {
        match command {
            Command::Connect { outbox, respond } => {
                let peer = coordinator.connect(outbox);
                if respond.send(peer).is_err() {
                    debug!(%peer, "Connect caller went away");
                    coordinator.disconnect(peer);
                }
            }
            Command::Request {
                peer,
                request,
                respond,
            } => {
                let result = coordinator.handle(peer, request);
                if respond.send(result).is_err() {
                    debug!(%peer, "Request caller went away");
                }
            }
            Command::Disconnect { peer } => coordinator.disconnect(peer),
        }
    }
    info!(rooms = coordinator.registry().len(), "Coordinator stopped");
}

impl CoordinatorHandle {
    /// Registers a connection whose messages go to `outbox`.
    pub async fn connect(&self, outbox: Outbox) -> Result<PeerId, SessionError> {
        let (respond, response) = oneshot::channel();
        self.commands
            .send(Command::Connect { outbox, respond })
            .map_err(|_| SessionError::CoordinatorClosed)?;
        response.await.map_err(|_| SessionError::CoordinatorClosed)
    }

    /// Sends a request on behalf of `peer` and waits for the result.
    #[instrument(skip(self, request), fields(%peer, kind = request.kind()))]
    pub async fn request(
        &self,
        peer: PeerId,
        request: ClientRequest,
    ) -> Result<Reply, SessionError> {
        let (respond, response) = oneshot::channel();
        self.commands
            .send(Command::Request {
                peer,
                request,
                respond,
            })
            .map_err(|_| SessionError::CoordinatorClosed)?;
        response.await.map_err(|_| SessionError::CoordinatorClosed)?
    }

    /// Opens a room, generating a code when `code` is `None`.
    pub async fn create_room(
        &self,
        peer: PeerId,
        code: Option<RoomCode>,
    ) -> Result<Reply, SessionError> {
        self.request(peer, ClientRequest::CreateRoom { code }).await
    }

    /// Joins a room as guest.
    pub async fn join_room(&self, peer: PeerId, code: RoomCode) -> Result<Reply, SessionError> {
        self.request(peer, ClientRequest::JoinRoom { code }).await
    }

    /// Starts the match in a room.
    pub async fn start_match(&self, peer: PeerId, code: RoomCode) -> Result<Reply, SessionError> {
        self.request(peer, ClientRequest::StartMatch { code }).await
    }

    /// Relays a move.
    pub async fn submit_move(
        &self,
        peer: PeerId,
        code: RoomCode,
        position: Position,
    ) -> Result<Reply, SessionError> {
        self.request(peer, ClientRequest::SubmitMove { code, position })
            .await
    }

    /// Leaves a room, closing it.
    pub async fn leave_room(&self, peer: PeerId, code: RoomCode) -> Result<Reply, SessionError> {
        self.request(peer, ClientRequest::LeaveRoom { code }).await
    }

    /// Drops a connection. Best effort: does nothing if the coordinator is gone.
    pub fn disconnect(&self, peer: PeerId) {
        if self.commands.send(Command::Disconnect { peer }).is_err() {
            warn!(%peer, "Coordinator gone before disconnect");
        }
    }
}
