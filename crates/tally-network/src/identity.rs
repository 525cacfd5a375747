//! Device identity resolution.
//!
//! Maps a peer address to a best-effort stable identifier:
//! 1. Loopback peers are `LOCALHOST`, resolved synchronously
//! 2. Otherwise the neighbor cache is warmed with one ping and queried
//! 3. A hardware address found in the answer becomes the identity (`MAC`)
//! 4. Anything else falls back to the peer address itself (`IP`)
//!
//! Security limitation: this is not authentication. A peer that spoofs its
//! IP or MAC, a peer reached through a router (whose cache entry is the
//! router's), and devices that randomize their MAC per network all defeat
//! it. It only keeps honest devices on a shared LAN from voting twice.

use std::net::IpAddr;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use tally_protocol::{DeviceIdentity, IdType, IPV4_MAPPED_PREFIX, LOCALHOST_DEVICE_ID};

use crate::probe::NeighborProbe;

/// Injectable identity capability.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, address: &str) -> DeviceIdentity;
}

/// Strip the IPv4-in-IPv6 prefix a dual-stack listener reports.
pub fn normalize_address(raw: &str) -> &str {
    raw.strip_prefix(IPV4_MAPPED_PREFIX).unwrap_or(raw)
}

/// Synchronous shortcut for loopback peers.
pub fn resolve_loopback(address: &str) -> Option<DeviceIdentity> {
    match normalize_address(address) {
        "127.0.0.1" | "::1" | "localhost" => {
            Some(DeviceIdentity::new(LOCALHOST_DEVICE_ID, IdType::Localhost))
        }
        _ => None,
    }
}

fn mac_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([0-9a-fA-F]{2}[:-]){5}[0-9a-fA-F]{2}").expect("MAC pattern compiles")
    })
}

/// First hardware address in neighbor-cache output, uppercased.
pub fn extract_mac(text: &str) -> Option<String> {
    mac_pattern().find(text).map(|m| m.as_str().to_uppercase())
}

/// [`IdentityResolver`] that reads the host's neighbor cache through a
/// [`NeighborProbe`].
pub struct NeighborCacheResolver<P> {
    probe: P,
}

impl<P: NeighborProbe> NeighborCacheResolver<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl<P: NeighborProbe> IdentityResolver for NeighborCacheResolver<P> {
    async fn resolve(&self, address: &str) -> DeviceIdentity {
        if let Some(identity) = resolve_loopback(address) {
            return identity;
        }

        let address = normalize_address(address);
        let fallback = DeviceIdentity::new(address, IdType::Ip);

        // Only real IP literals ever reach an external command.
        if address.parse::<IpAddr>().is_err() {
            tracing::debug!(address, "Peer address is not an IP literal, using it verbatim");
            return fallback;
        }

        if let Err(e) = self.probe.ping(address).await {
            tracing::debug!(address, error = %e, "Reachability probe failed");
        }

        match self.probe.query_neighbors(address).await {
            Ok(text) => match extract_mac(&text) {
                Some(mac) => DeviceIdentity::new(mac, IdType::Mac),
                None => fallback,
            },
            Err(e) => {
                tracing::debug!(address, error = %e, "Neighbor cache query failed");
                fallback
            }
        }
    }
}
