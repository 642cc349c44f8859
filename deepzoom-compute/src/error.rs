//! Error types for the compute layer.

use thiserror::Error;

/// Reference orbit failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrbitError {
    /// Requested iteration beyond the current orbit length. The caller must
    /// extend the orbit first.
    #[error("orbit index {requested} out of range (orbit length {len})")]
    IndexOutOfRange { requested: u64, len: u64 },

    /// High-precision extension degenerated. Fatal to the session; the
    /// orbit is never silently truncated.
    #[error("reference orbit precision exhausted at iteration {iteration}")]
    PrecisionExhausted { iteration: u64 },
}

/// Session-level failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Orbit(#[from] OrbitError),

    #[error("session cancelled")]
    Cancelled,
}
