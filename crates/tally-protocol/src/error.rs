use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
