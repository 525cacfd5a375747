//! Tally Network - peer identity and local address discovery.
//!
//! Nothing in this crate authenticates anyone. Identities are derived from
//! the neighbor (ARP) cache of the host machine and degrade to the raw
//! peer address whenever the cache has nothing to say.

pub mod error;
pub mod identity;
pub mod interfaces;
pub mod probe;

pub use error::NetworkError;
pub use identity::{IdentityResolver, NeighborCacheResolver};
pub use probe::{NeighborProbe, SystemProbe};
