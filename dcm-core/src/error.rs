//! Error types for DCM.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for DCM operations.
pub type Result<T> = std::result::Result<T, DcmError>;

/// Kind of top-level compose entity an operation targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Service,
    Network,
    Volume,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Service => write!(f, "service"),
            EntityKind::Network => write!(f, "network"),
            EntityKind::Volume => write!(f, "volume"),
        }
    }
}

/// Phase of a stack restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyPhase {
    /// Tearing down the running stack.
    Stop,
    /// Bringing the stack back up, detached.
    Start,
}

impl fmt::Display for ApplyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyPhase::Stop => write!(f, "down"),
            ApplyPhase::Start => write!(f, "up -d"),
        }
    }
}

/// Main error type for DCM.
#[derive(Error, Debug)]
pub enum DcmError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compose format error: {reason}")]
    Format { reason: String },

    #[error("{kind} '{name}' does not exist")]
    NotFound { kind: EntityKind, name: String },

    #[error("compose {phase} failed: {output}")]
    Apply { phase: ApplyPhase, output: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl DcmError {
    pub(crate) fn not_found(kind: EntityKind, name: &str) -> Self {
        Self::NotFound { kind, name: name.to_string() }
    }

    /// True when the error reports a missing service, network or volume.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
