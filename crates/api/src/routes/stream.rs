use crate::auth::{Authenticated, Principal};
use crate::broadcaster::{next_update, SubscriberChannel};
use crate::server::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tracing::{debug, info, instrument, warn};

/// WebSocket handler for snapshot updates.
///
/// The credential is checked before the upgrade, so a rejected client gets a
/// plain 401 and never reaches the subscriber set.
#[instrument(skip(ws, state, principal), fields(principal = %principal.0))]
pub async fn websocket_handler(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state, principal))
}

/// Push every published update to this client until either side goes away
#[instrument(skip(socket, state), fields(principal = %principal))]
async fn handle_socket(socket: WebSocket, state: AppState, principal: Principal) {
    let (channel, mut updates) = SubscriberChannel::new();
    let subscriber = state.broadcaster.register(channel).await;

    let (mut sender, mut receiver) = socket.split();

    // OUTBOUND: latest update to the client
    let mut sender_task = tokio::spawn(async move {
        while let Some(message) = next_update(&mut updates).await {
            if let Err(e) = sender.send(Message::Text(message.to_string())).await {
                warn!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    // INBOUND: the protocol is push-only, so this just watches for closure
    let mut receiver_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Close(_) => {
                    info!("Client closed WebSocket connection");
                    break;
                }
                other => debug!("Ignoring inbound message: {:?}", other),
            }
        }
    });

    tokio::select! {
        result = &mut sender_task => {
            receiver_task.abort();
            if let Err(e) = result {
                warn!("WebSocket sender task error: {}", e);
            }
        }
        result = &mut receiver_task => {
            sender_task.abort();
            if let Err(e) = result {
                warn!("WebSocket receiver task error: {}", e);
            }
        }
    }

    state.broadcaster.unregister(subscriber).await;
    info!(subscriber = %subscriber, "WebSocket connection closed");
}
