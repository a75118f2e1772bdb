use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    response::Response,
};
use std::net::SocketAddr;

use crate::presence::normalize_client_ip;
use crate::state::AppState;
use crate::ws::actor;

/// GET /ws
/// Upgrade to the sync WebSocket and spawn an actor for the connection.
/// No handshake-time identity: presence starts only when the client sends
/// `user-join` over the open socket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    let client_ip = normalize_client_ip(addr.ip());
    ws.on_upgrade(move |socket| actor::run_connection(socket, state, client_ip))
}
