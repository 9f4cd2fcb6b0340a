//! End-to-end traffic over `/ws` against a live listener.

use fleeting_session::{
    ClientRequest, ErrorBody, Outcome, Reply, RoomCode, ServerMessage, SessionCoordinator, router,
    spawn,
};
use fleeting_tictactoe::{Mark, Position};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    let (handle, _task) = spawn(SessionCoordinator::default());
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let address = listener.local_addr().expect("bound address");
    tokio::spawn(async move {
        axum::serve(listener, router(handle))
            .await
            .expect("server runs");
    });
    address
}

async fn open(address: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{address}/ws"))
        .await
        .expect("websocket handshake");
    socket
}

async fn send(socket: &mut Socket, request: &ClientRequest) {
    let text = serde_json::to_string(request).expect("request encodes");
    socket
        .send(Message::Text(text.into()))
        .await
        .expect("frame sent");
}

async fn next_message(socket: &mut Socket) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("server answered in time")
            .expect("socket still open")
            .expect("frame readable");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("server message decodes");
        }
    }
}

/// Reads until `wanted` matches, skipping notifications that may arrive first.
async fn until(socket: &mut Socket, wanted: impl Fn(&ServerMessage) -> bool) -> ServerMessage {
    loop {
        let message = next_message(socket).await;
        if wanted(&message) {
            return message;
        }
    }
}

fn is_reply(message: &ServerMessage) -> bool {
    matches!(message, ServerMessage::Reply { .. })
}

fn code() -> RoomCode {
    RoomCode::parse("WS42").expect("valid code")
}

#[tokio::test]
async fn test_malformed_frame_is_answered_and_socket_survives() {
    let address = start_server().await;
    let mut socket = open(address).await;

    socket
        .send(Message::Text("{not json".into()))
        .await
        .expect("frame sent");
    match next_message(&mut socket).await {
        ServerMessage::Reply {
            result: Outcome::Error(body),
        } => assert_eq!(body.code, ErrorBody::MALFORMED),
        other => panic!("expected malformed reply, got {other:?}"),
    }

    send(&mut socket, &ClientRequest::CreateRoom { code: Some(code()) }).await;
    let reply = until(&mut socket, is_reply).await;
    assert_eq!(
        reply,
        ServerMessage::reply(Ok(Reply::Created {
            code: code(),
            mark: Mark::X,
        }))
    );
}

#[tokio::test]
async fn test_unknown_request_type_is_malformed() {
    let address = start_server().await;
    let mut socket = open(address).await;

    socket
        .send(Message::Text(r#"{"type":"resign"}"#.into()))
        .await
        .expect("frame sent");
    match next_message(&mut socket).await {
        ServerMessage::Reply {
            result: Outcome::Error(body),
        } => assert_eq!(body.code, ErrorBody::MALFORMED),
        other => panic!("expected malformed reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_moves_are_relayed_between_sockets() {
    let address = start_server().await;
    let mut host = open(address).await;
    let mut guest = open(address).await;

    send(&mut host, &ClientRequest::CreateRoom { code: Some(code()) }).await;
    until(&mut host, is_reply).await;

    send(&mut guest, &ClientRequest::JoinRoom { code: code() }).await;
    let joined = until(&mut guest, is_reply).await;
    assert_eq!(
        joined,
        ServerMessage::reply(Ok(Reply::Joined {
            code: code(),
            mark: Mark::O,
        }))
    );
    assert_eq!(next_message(&mut host).await, ServerMessage::OpponentJoined);

    send(&mut host, &ClientRequest::StartMatch { code: code() }).await;
    until(&mut host, is_reply).await;
    until(&mut guest, |m| *m == ServerMessage::MatchStarted).await;

    let position = Position::new(1, 1);
    send(
        &mut host,
        &ClientRequest::SubmitMove {
            code: code(),
            position,
        },
    )
    .await;
    let moved = until(&mut host, is_reply).await;
    assert_eq!(
        moved,
        ServerMessage::reply(Ok(Reply::Moved {
            code: code(),
            turn: Mark::O,
        }))
    );

    assert_eq!(
        until(&mut guest, |m| matches!(m, ServerMessage::OpponentMove { .. })).await,
        ServerMessage::OpponentMove { position }
    );
    assert_eq!(
        until(&mut guest, |m| matches!(m, ServerMessage::TurnChanged { .. })).await,
        ServerMessage::TurnChanged { mark: Mark::O }
    );
}

#[tokio::test]
async fn test_closing_socket_notifies_opponent_and_frees_room() {
    let address = start_server().await;
    let mut host = open(address).await;
    let mut guest = open(address).await;

    send(&mut host, &ClientRequest::CreateRoom { code: Some(code()) }).await;
    until(&mut host, is_reply).await;
    send(&mut guest, &ClientRequest::JoinRoom { code: code() }).await;
    until(&mut guest, is_reply).await;
    assert_eq!(next_message(&mut host).await, ServerMessage::OpponentJoined);

    guest.close(None).await.expect("close frame sent");
    assert_eq!(next_message(&mut host).await, ServerMessage::OpponentLeft);

    let mut late = open(address).await;
    send(&mut late, &ClientRequest::JoinRoom { code: code() }).await;
    match until(&mut late, is_reply).await {
        ServerMessage::Reply {
            result: Outcome::Error(body),
        } => assert_eq!(body.code, "room_not_found"),
        other => panic!("expected room_not_found, got {other:?}"),
    }
}
