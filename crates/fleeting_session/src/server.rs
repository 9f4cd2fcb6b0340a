//! WebSocket transport for the coordinator.

use super::config::ServerConfig;
use super::error::ErrorBody;
use super::handle::CoordinatorHandle;
use super::protocol::{ClientRequest, Outcome, ServerMessage};
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Routes: `GET /ws` for peers, `GET /health` for health checks.
pub fn router(handle: CoordinatorHandle) -> Router {
    Router::new()
        .route("/ws", get(upgrade))
        .route("/health", get(health))
        .with_state(handle)
}

/// Binds the configured address and serves until the listener fails.
#[instrument(skip_all, fields(address = %config.address()))]
pub async fn serve(config: &ServerConfig, handle: CoordinatorHandle) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    info!("Relay server listening");
    axum::serve(listener, router(handle)).await
}

async fn health() -> &'static str {
    "OK"
}

async fn upgrade(ws: WebSocketUpgrade, State(handle): State<CoordinatorHandle>) -> Response {
    ws.on_upgrade(move |socket| connection(socket, handle))
}

/// Pumps one socket: frames in become requests, outbox messages go out.
async fn connection(socket: WebSocket, handle: CoordinatorHandle) {
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut outgoing) = mpsc::unbounded_channel::<ServerMessage>();

    let peer = match handle.connect(outbox.clone()).await {
        Ok(peer) => peer,
        Err(e) => {
            warn!(error = %e, "Could not register connection");
            return;
        }
    };

    let writer = tokio::spawn(async move {
        while let Some(message) = outgoing.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(%peer, error = %e, "Socket error");
                break;
            }
        };

        let result = match serde_json::from_str::<ClientRequest>(text.as_str()) {
            Ok(request) => Outcome::from(handle.request(peer, request).await),
            Err(e) => {
                warn!(%peer, error = %e, "Malformed frame");
                Outcome::Error(ErrorBody::malformed(e))
            }
        };
        if outbox.send(ServerMessage::Reply { result }).is_err() {
            break;
        }
    }

    handle.disconnect(peer);
    drop(outbox);
    writer.abort();
    info!(%peer, "Connection closed");
}
