//! Errors surfaced by the collision core.

use std::collections::TryReserveError;

use thiserror::Error;

/// Contract violations and fatal step failures.
///
/// Numerical degeneracies (coincident centers, zero-extent boxes) are never
/// reported here; they are handled where they occur.
#[derive(Debug, Error)]
pub enum CollisionError {
    #[error("invalid body {index}: {reason}")]
    InvalidBody { index: usize, reason: &'static str },

    #[error("invalid obstacle {index}: {reason}")]
    InvalidObstacle { index: usize, reason: &'static str },

    #[error("invalid world bounds: {0}")]
    InvalidBounds(&'static str),

    #[error("invalid solver config: {0}")]
    InvalidConfig(&'static str),

    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}

pub type Result<T> = std::result::Result<T, CollisionError>;
