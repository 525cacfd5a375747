//! Tally State - the single source of truth of a grading session.
//!
//! [`Session`] holds the rubric, the subject under vote and the vote log,
//! and only changes through its transition methods. [`SessionHub`] pairs
//! it with the [`ConnectionRegistry`] and turns every transition into a
//! full-state broadcast. [`export`] reads the vote log and never writes.

pub mod channel;
pub mod error;
pub mod export;
pub mod hub;
pub mod intake;
pub mod registry;
pub mod session;

pub use channel::Channel;
pub use error::IntakeError;
pub use hub::SessionHub;
pub use intake::Origin;
pub use registry::ConnectionRegistry;
pub use session::Session;
