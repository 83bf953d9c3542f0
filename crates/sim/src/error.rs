//! Error types for the fluid simulation.
//!
//! Only setup can fail. Numerical degeneracies during a step are recovered
//! locally and never surface here.

use thiserror::Error;

/// Errors that can occur while building or addressing a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// The options describe a simulation that cannot be built.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A particle index past the active particle count.
    #[error("particle index {index} out of range (count {count})")]
    ParticleIndex {
        /// Requested index.
        index: usize,
        /// Number of active particles.
        count: usize,
    },
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, SimError>;
