//! In-memory registry of currently-connected clients.
//!
//! Keyed by connection id: one entry per live WebSocket, not per logical
//! user, so a reconnect shows up as a fresh entry. An entry exists only
//! between the connection's `user-join` message and its disconnect; a
//! connection that never joins never appears in snapshots.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub user_id: String,
    pub connection_id: String,
    pub device_info: String,
    pub client_ip: String,
    pub joined_at: DateTime<Utc>,
}

/// Registry of present clients. Owned by the application state and handed
/// to connection actors by reference; no ambient global state.
#[derive(Default)]
pub struct PresenceRegistry {
    entries: DashMap<String, PresenceEntry>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert or replace the entry for a connection. Always succeeds.
    pub fn join(
        &self,
        connection_id: &str,
        user_id: &str,
        device_info: &str,
        client_ip: &str,
    ) -> PresenceEntry {
        let entry = PresenceEntry {
            user_id: user_id.to_string(),
            connection_id: connection_id.to_string(),
            device_info: device_info.to_string(),
            client_ip: client_ip.to_string(),
            joined_at: Utc::now(),
        };
        self.entries
            .insert(connection_id.to_string(), entry.clone());
        entry
    }

    /// Remove the entry if present. Idempotent; returns whether an entry
    /// existed.
    pub fn leave(&self, connection_id: &str) -> bool {
        self.entries.remove(connection_id).is_some()
    }

    /// Full copy of the current entries, order unspecified.
    pub fn snapshot(&self) -> Vec<PresenceEntry> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }
}

/// Render a peer address for presence display. IPv4-mapped IPv6 addresses
/// (`::ffff:a.b.c.d`) reduce to their IPv4 form.
pub fn normalize_client_ip(addr: IpAddr) -> String {
    match addr {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        IpAddr::V4(v4) => v4.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_then_leave_lifecycle() {
        let registry = PresenceRegistry::new();

        registry.join("conn-1", "user-1", "pixel-8", "192.168.1.5");

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].device_info, "pixel-8");
        assert_eq!(snapshot[0].connection_id, "conn-1");

        assert!(registry.leave("conn-1"));
        assert!(registry.snapshot().is_empty());

        // Leaving twice is fine
        assert!(!registry.leave("conn-1"));
    }

    #[test]
    fn rejoin_replaces_the_entry() {
        let registry = PresenceRegistry::new();

        registry.join("conn-1", "user-1", "laptop", "10.0.0.2");
        registry.join("conn-1", "user-1", "laptop-renamed", "10.0.0.2");

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].device_info, "laptop-renamed");
    }

    #[test]
    fn ipv4_mapped_addresses_are_reduced() {
        let mapped: IpAddr = "::ffff:192.168.1.5".parse().unwrap();
        assert_eq!(normalize_client_ip(mapped), "192.168.1.5");

        let v4: IpAddr = "10.1.2.3".parse().unwrap();
        assert_eq!(normalize_client_ip(v4), "10.1.2.3");

        let v6: IpAddr = "fe80::1".parse().unwrap();
        assert_eq!(normalize_client_ip(v6), "fe80::1");
    }
}
