//! Tally Protocol - Core types and message definitions
//!
//! Every WebSocket frame exchanged between the session server and a browser
//! is a JSON object of the form `{"event": <name>, "data": <payload>}`.
//! Inbound frames decode to [`ClientIntent`], outbound frames are built from
//! [`ServerEvent`].

pub mod constants;
pub mod error;
pub mod messages;
pub mod types;

pub use constants::*;
pub use error::*;
pub use messages::*;
pub use types::*;
