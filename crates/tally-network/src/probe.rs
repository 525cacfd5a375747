//! Platform commands that warm and read the neighbor cache.
//!
//! - `ping` once, so the kernel has a reason to learn the peer's link
//!   address
//! - `arp` (or `ip neigh` when `arp` is missing) to read it back
//!
//! Both are bounded by timeouts and run without a shell; the address is
//! always passed as a single argument.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::NetworkError;

/// Reachability probe and neighbor-cache query for one address.
#[async_trait]
pub trait NeighborProbe: Send + Sync {
    /// Send a single reachability probe. Callers ignore the outcome.
    async fn ping(&self, address: &str) -> Result<(), NetworkError>;

    /// Raw text of the neighbor-cache entry for `address`.
    async fn query_neighbors(&self, address: &str) -> Result<String, NetworkError>;
}

/// [`NeighborProbe`] backed by the host's `ping` and `arp` tools.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    probe_timeout: Duration,
    query_timeout: Duration,
}

impl SystemProbe {
    pub fn new(probe_timeout: Duration, query_timeout: Duration) -> Self {
        Self {
            probe_timeout,
            query_timeout,
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new(Duration::from_millis(200), Duration::from_secs(1))
    }
}

fn ping_args(address: &str, timeout: Duration) -> Vec<String> {
    if cfg!(windows) {
        let ms = timeout.as_millis().max(1).to_string();
        vec!["-n".into(), "1".into(), "-w".into(), ms, address.into()]
    } else if cfg!(target_os = "macos") {
        vec!["-c".into(), "1".into(), "-t".into(), "1".into(), address.into()]
    } else {
        vec!["-c".into(), "1".into(), "-W".into(), "1".into(), address.into()]
    }
}

async fn run(program: &str, args: &[String], timeout: Duration) -> Result<String, NetworkError> {
    let command = format!("{program} {}", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, output)
        .await
        .map_err(|_| NetworkError::Timeout(command.clone()))?
        .map_err(|source| NetworkError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(NetworkError::Exit {
            command,
            status: output.status,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl NeighborProbe for SystemProbe {
    async fn ping(&self, address: &str) -> Result<(), NetworkError> {
        run("ping", &ping_args(address, self.probe_timeout), self.probe_timeout)
            .await
            .map(|_| ())
    }

    async fn query_neighbors(&self, address: &str) -> Result<String, NetworkError> {
        if cfg!(windows) {
            return run("arp", &["-a".into(), address.into()], self.query_timeout).await;
        }

        match run("arp", &["-n".into(), address.into()], self.query_timeout).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::debug!(error = %e, "arp lookup failed, trying ip neigh");
                run(
                    "ip",
                    &["neigh".into(), "show".into(), address.into()],
                    self.query_timeout,
                )
                .await
            }
        }
    }
}
