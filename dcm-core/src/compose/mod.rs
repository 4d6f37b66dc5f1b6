//! Docker Compose file model, codec and mutations.
//!
//! This module provides a typed model of docker-compose.yml files (v2/v3
//! format), the codec that reads and writes them, and the in-place
//! operations used to add and remove services, networks and volumes.

pub mod codec;
pub mod mutate;
pub mod types;


pub use codec::ComposeCodec;
pub use types::*;
