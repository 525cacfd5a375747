use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{0}` timed out")]
    Timeout(String),

    #[error("`{command}` exited with {status}")]
    Exit { command: String, status: ExitStatus },
}
