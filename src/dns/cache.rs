//! Shared cache of addresses that successfully connected.

use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use super::Name;

/// Remembers the last address that accepted a connection for each
/// `(host, port)` pair.
///
/// Cheap to clone; clones share one concurrent map, so a single cache can be
/// handed to many requests running on different threads.
#[derive(Clone, Debug, Default)]
pub struct DnsCache {
    entries: Arc<DashMap<(Name, u16), SocketAddr>>,
}

impl DnsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, host: &str, port: u16) -> Option<SocketAddr> {
        self.entries
            .get(&(Name::from(host), port))
            .map(|entry| *entry.value())
    }

    pub fn insert(&self, host: &str, port: u16, addr: SocketAddr) {
        self.entries.insert((Name::from(host), port), addr);
    }

    pub fn remove(&self, host: &str, port: u16) -> Option<SocketAddr> {
        self.entries
            .remove(&(Name::from(host), port))
            .map(|(_, addr)| addr)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
