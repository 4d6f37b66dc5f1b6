//! DCM Core Library
//!
//! Typed model, codec and mutation engine for docker-compose descriptors,
//! plus the lifecycle hook that restarts a stack from a saved descriptor.

pub mod compose;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

// Re-export commonly used items
pub use compose::{ComposeCodec, ComposeFile, Network, Service, Volume};
pub use config::Config;
pub use error::{ApplyPhase, DcmError, EntityKind, Result};
pub use lifecycle::{ComposeApplier, StackApplier};
pub use observability::init as init_observability;
