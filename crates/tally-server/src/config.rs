//! Server configuration, loaded from TOML.
//!
//! Every key is optional; a missing file section falls back to its
//! defaults. Lookup order: explicit `--config` path (must exist), then
//! `$TALLY_CONFIG`, then `<config dir>/tally/config.toml` if present.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use tally_protocol::{DEFAULT_PORT, DEFAULT_SESSION_NAME};

pub const CONFIG_ENV: &str = "TALLY_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub identity: IdentityConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Directory holding the browser frontend; autodetected when unset.
    pub web_root: Option<PathBuf>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            web_root: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Upper bound on the reachability probe before the ARP lookup.
    pub probe_timeout_ms: u64,
    pub query_timeout_ms: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 200,
            query_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session title shown before the host creates a session.
    pub name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SESSION_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tally").join("config.toml"))
    }

    /// Resolve and load the configuration, or defaults if no file applies.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Some(Path::new(&path)));
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.http.bind_addr, self.http.port)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.identity.probe_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.identity.query_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(config.probe_timeout(), Duration::from_millis(200));
        assert_eq!(config.session.name, DEFAULT_SESSION_NAME);
        assert_eq!(config.logging.level, "info");
        assert!(config.http.web_root.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nport = 8080\n\n[session]\nname = \"Science Fair\"").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.http.bind_addr, "0.0.0.0");
        assert_eq!(config.session.name, "Science Fair");
        assert_eq!(config.identity.probe_timeout_ms, 200);
    }

    #[test]
    fn test_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[http]
bind_addr = "127.0.0.1"
port = 4000
web_root = "/srv/tally"

[identity]
probe_timeout_ms = 500
query_timeout_ms = 2000

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:4000");
        assert_eq!(config.http.web_root, Some(PathBuf::from("/srv/tally")));
        assert_eq!(config.query_timeout(), Duration::from_secs(2));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\nport = ").unwrap();
        assert!(matches!(
            ServerConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            ServerConfig::load(Some(&missing)),
            Err(ConfigError::NotFound(_))
        ));
    }
}
