use {
    crate::{
        domain::Room,
        infra::api::{State, error},
    },
    axum::extract::ws::{Message, WebSocket, WebSocketUpgrade},
    futures::{SinkExt, StreamExt},
    model::{
        RoomId, UserId,
        message::{ClientMessage, ServerMessage},
    },
    serde::Deserialize,
};

pub(in crate::infra::api) fn session(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/rooms/{room}/ws", axum::routing::get(route))
}

#[derive(Debug, Deserialize)]
struct Session {
    /// Identity the connection acts as. Stands in for an authenticated
    /// session.
    user: UserId,
}

async fn route(
    state: axum::extract::State<State>,
    axum::extract::Path(room): axum::extract::Path<RoomId>,
    axum::extract::Query(session): axum::extract::Query<Session>,
    upgrade: WebSocketUpgrade,
) -> Result<axum::response::Response, (axum::http::StatusCode, axum::Json<error::Error>)> {
    let room = state
        .house()
        .room(room)
        .ok_or(error::Kind::UnknownRoom)?
        .clone();
    Ok(upgrade.on_upgrade(move |socket| handle_session(socket, room, session.user)))
}

/// Runs one participant's connection: joins the room, pumps room events to
/// the socket and inbound frames to the room, and cleans up when either side
/// goes away.
async fn handle_session(socket: WebSocket, room: Room, user: UserId) {
    let (outbox, mut inbox) = room.connect(user.clone()).await;
    let (mut sink, mut stream) = socket.split();

    let forward = tokio::task::spawn(async move {
        while let Some(message) = inbox.recv().await {
            let Ok(frame) = serde_json::to_string(&message) else {
                continue;
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }
    });

    while let Some(Ok(frame)) = stream.next().await {
        let Message::Text(frame) = frame else {
            continue;
        };
        handle_frame(&room, &user, frame.as_str()).await;
    }

    forward.abort();
    room.disconnect(&user, &outbox).await;
}

/// Dispatches one inbound frame. Replies go to the sending participant only;
/// anything a bid changes reaches the whole room through its broadcasts.
async fn handle_frame(room: &Room, user: &UserId, frame: &str) {
    let reply = match serde_json::from_str(frame) {
        Ok(ClientMessage::Bid { amount }) => match room.place_bid(user, amount).await {
            Ok(()) => return,
            Err(error) => ServerMessage::BidError {
                error: error.to_string(),
            },
        },
        Ok(ClientMessage::Status) => room.auction_state().await,
        Ok(ClientMessage::Ping) => ServerMessage::Pong,
        Err(_) => ServerMessage::BidError {
            error: "unrecognized message".to_string(),
        },
    };
    room.send_to(user, reply).await;
}
