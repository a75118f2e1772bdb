//! Fan-out of board events to live connections.
//!
//! Delivery is best-effort and at-most-once: a send that fails because a
//! connection is tearing down is logged and skipped, and never affects
//! delivery to the remaining connections or the request that triggered
//! the event.
//!
//! Inclusion of the originator is asymmetric on purpose:
//! events triggered from the HTTP surface go to every connection, the
//! poster's own tabs included; updates arriving over a live socket go to
//! everyone except that socket, which already reflects the change
//! locally. Client UIs are written against exactly this behavior.

use crate::ws::protocol::ServerEvent;
use crate::ws::ConnectionRegistry;

/// Broadcast an event to every live connection, the originator included.
pub fn broadcast_to_all(registry: &ConnectionRegistry, event: &ServerEvent) {
    let Some(msg) = event.to_message() else {
        return;
    };
    for entry in registry.iter() {
        if entry.value().send(msg.clone()).is_err() {
            tracing::debug!(
                connection_id = %entry.key(),
                "Dropped event for closing connection"
            );
        }
    }
}

/// Broadcast an event to every live connection except the originating one.
pub fn broadcast_to_others(
    registry: &ConnectionRegistry,
    origin_connection_id: &str,
    event: &ServerEvent,
) {
    let Some(msg) = event.to_message() else {
        return;
    };
    for entry in registry.iter() {
        if entry.key() == origin_connection_id {
            continue;
        }
        if entry.value().send(msg.clone()).is_err() {
            tracing::debug!(
                connection_id = %entry.key(),
                "Dropped event for closing connection"
            );
        }
    }
}
