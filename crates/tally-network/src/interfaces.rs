//! Addresses advertised to the host so participants know where to connect.

use std::net::{Ipv4Addr, UdpSocket};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use tally_protocol::DisplayAddress;

const LISTING_TIMEOUT: Duration = Duration::from_secs(1);

/// Fallback list used when no LAN address could be found.
pub fn localhost_only(port: u16) -> Vec<DisplayAddress> {
    vec![DisplayAddress::new("Localhost Only", "localhost", port)]
}

/// Parse `ip -o -4 addr show` output into display addresses, skipping
/// loopback interfaces.
pub fn parse_ip_addr_output(output: &str, port: u16) -> Vec<DisplayAddress> {
    let mut results = Vec::new();
    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(inet_pos) = fields.iter().position(|f| *f == "inet") else {
            continue;
        };
        if inet_pos == 0 {
            continue;
        }
        let Some(cidr) = fields.get(inet_pos + 1) else {
            continue;
        };
        let addr = cidr.split('/').next().unwrap_or(cidr);
        let Ok(ip) = addr.parse::<Ipv4Addr>() else {
            continue;
        };
        if ip.is_loopback() {
            continue;
        }
        let raw_name = fields[inet_pos - 1];
        let name = raw_name.split('@').next().unwrap_or(raw_name);
        results.push(DisplayAddress::new(name, ip.to_string(), port));
    }
    results
}

/// IPv4 address of the interface holding the default route.
///
/// Connecting a UDP socket only selects a route; nothing is sent.
fn primary_outbound_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9)).ok()?;
    match socket.local_addr().ok()?.ip() {
        std::net::IpAddr::V4(ip) if !ip.is_unspecified() && !ip.is_loopback() => Some(ip),
        _ => None,
    }
}

async fn list_linux_addresses(port: u16) -> Option<Vec<DisplayAddress>> {
    let output = Command::new("ip")
        .args(["-o", "-4", "addr", "show"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();
    let output = tokio::time::timeout(LISTING_TIMEOUT, output).await.ok()?.ok()?;
    if !output.status.success() {
        return None;
    }
    let found = parse_ip_addr_output(&String::from_utf8_lossy(&output.stdout), port);
    (!found.is_empty()).then_some(found)
}

/// All non-loopback IPv4 addresses of this machine as join URLs.
pub async fn list_display_addresses(port: u16) -> Vec<DisplayAddress> {
    if cfg!(target_os = "linux") {
        if let Some(found) = list_linux_addresses(port).await {
            return found;
        }
        tracing::debug!("Interface listing unavailable, falling back to default route");
    }

    match primary_outbound_ipv4() {
        Some(ip) => vec![DisplayAddress::new("default", ip.to_string(), port)],
        None => localhost_only(port),
    }
}
