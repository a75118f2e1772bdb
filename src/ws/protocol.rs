//! JSON message surface of the sync WebSocket.
//!
//! Frames are text, shaped `{"event": "...", "data": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::presence::PresenceEntry;

/// Messages a client may send over its live connection.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Presence handshake, sent once after the socket opens.
    UserJoin(UserJoin),
    /// Opaque client-originated update, relayed verbatim to the other
    /// connections. The sender already reflects its change locally and is
    /// not echoed.
    SyncUpdate(Value),
}

#[derive(Debug, Deserialize)]
pub struct UserJoin {
    pub id: String,
    #[serde(rename = "deviceInfo")]
    pub device_info: String,
}

/// Events the server pushes to connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    SyncUpdate(Value),
    SyncDelete(String),
    SyncClear,
    /// Always a full snapshot of the presence registry, not a delta.
    UsersUpdate(Vec<PresenceEntry>),
}

impl ServerEvent {
    /// Encode as a text WebSocket frame.
    pub fn to_message(&self) -> Option<axum::extract::ws::Message> {
        match serde_json::to_string(self) {
            Ok(json) => Some(axum::extract::ws::Message::Text(json.into())),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode server event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_events_use_the_wire_shape() {
        let json = serde_json::to_string(&ServerEvent::SyncDelete("abc".to_string())).unwrap();
        assert_eq!(json, r#"{"event":"sync-delete","data":"abc"}"#);

        let json = serde_json::to_string(&ServerEvent::SyncClear).unwrap();
        assert_eq!(json, r#"{"event":"sync-clear"}"#);
    }

    #[test]
    fn user_join_parses() {
        let raw = r#"{"event":"user-join","data":{"id":"u1","deviceInfo":"tablet"}}"#;
        match serde_json::from_str::<ClientMessage>(raw).unwrap() {
            ClientMessage::UserJoin(join) => {
                assert_eq!(join.id, "u1");
                assert_eq!(join.device_info, "tablet");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn sync_update_keeps_the_payload_opaque() {
        let raw = r#"{"event":"sync-update","data":{"anything":["goes",1]}}"#;
        match serde_json::from_str::<ClientMessage>(raw).unwrap() {
            ClientMessage::SyncUpdate(value) => {
                assert_eq!(value["anything"][0], "goes");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_events_are_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"event":"mystery"}"#).is_err());
    }
}
