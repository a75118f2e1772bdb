//! LAN address discovery so other devices can find the board.

use axum::Json;
use std::net::{IpAddr, Ipv4Addr};

/// Best-guess LAN address of this host. Falls back to 0.0.0.0 when no
/// suitable interface is found.
pub fn local_ip() -> IpAddr {
    local_ip_address::local_ip().unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// GET /api/network/ip
pub async fn get_ip() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ip": local_ip().to_string() }))
}
