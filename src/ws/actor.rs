use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use uuid::Uuid;

use crate::state::AppState;
use crate::ws::broadcast::{broadcast_to_all, broadcast_to_others};
use crate::ws::protocol::{ClientMessage, ServerEvent};

/// Server sends a WebSocket ping on this interval so abrupt disconnects
/// don't leak registry entries.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// If no pong arrives within this window after a ping, the connection is
/// considered dead and closed.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the actor for one WebSocket connection.
///
/// The socket splits into reader and writer halves: the writer task owns
/// the sink and drains an mpsc channel; the reader loop dispatches
/// incoming JSON frames. Cloning the channel sender is how the rest of
/// the system pushes events to this client.
pub async fn run_connection(socket: WebSocket, state: AppState, client_ip: String) {
    let connection_id = Uuid::new_v4().to_string();
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    state.connections.insert(connection_id.clone(), tx.clone());

    tracing::info!(
        connection_id = %connection_id,
        client_ip = %client_ip,
        "WebSocket actor started"
    );

    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Keepalive watchdog: ping on a timer, close if the pong goes missing.
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // Skip the immediate first tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                // Writer task has died, connection is gone
                break;
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {}
                _ => {
                    tracing::warn!("Pong timeout, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Pong timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    handle_text_message(text.as_str(), &connection_id, &client_ip, &state);
                }
                Message::Binary(_) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        "Ignoring binary frame on JSON sync socket"
                    );
                }
                Message::Pong(_) => {
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::info!(
                        connection_id = %connection_id,
                        reason = ?frame,
                        "Client initiated close"
                    );
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
            None => {
                tracing::info!(connection_id = %connection_id, "WebSocket stream ended");
                break;
            }
        }
    }

    writer_handle.abort();
    ping_handle.abort();

    state.connections.remove(&connection_id);

    // A connection that never joined leaves no presence entry and goes
    // quietly; otherwise everyone gets a fresh snapshot.
    if state.presence.leave(&connection_id) {
        broadcast_to_all(
            &state.connections,
            &ServerEvent::UsersUpdate(state.presence.snapshot()),
        );
    }

    tracing::info!(connection_id = %connection_id, "WebSocket actor stopped");
}

/// Dispatch one inbound JSON frame. Unparseable frames are dropped with a
/// debug log; a sync socket peer is not owed an error reply.
fn handle_text_message(text: &str, connection_id: &str, client_ip: &str, state: &AppState) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(
                connection_id = %connection_id,
                error = %e,
                "Unrecognized client message"
            );
            return;
        }
    };

    match message {
        ClientMessage::UserJoin(join) => {
            state
                .presence
                .join(connection_id, &join.id, &join.device_info, client_ip);

            // Presence changes always go to everyone, the joiner included.
            broadcast_to_all(
                &state.connections,
                &ServerEvent::UsersUpdate(state.presence.snapshot()),
            );
        }
        ClientMessage::SyncUpdate(payload) => {
            // The sender already applied this change locally; relay it to
            // the rest only.
            broadcast_to_others(
                &state.connections,
                connection_id,
                &ServerEvent::SyncUpdate(payload),
            );
        }
    }
}

/// Writer task: drains the mpsc channel into the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed, connection is broken
            break;
        }
    }
}
