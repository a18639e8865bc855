//! Error types for sparse-life.

use thiserror::Error;

use crate::store::{BoardId, StoreError};

/// Errors surfaced by the engine, the detector and the coordinator.
///
/// An inconclusive final-state search is not an error; it is reported through
/// [`Outcome::Inconclusive`](crate::Outcome::Inconclusive).
#[derive(Debug, Error)]
pub enum LifeError {
    /// The board, or its anchor generation, does not exist.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    /// A negative generation number was requested.
    #[error("generation out of range: {0}")]
    OutOfRange(i64),

    /// Cancellation was observed mid-computation; no partial result exists.
    #[error("computation cancelled")]
    Cancelled,

    /// The persistence collaborator failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LifeError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BoardNotFound(_) | Self::Storage(StoreError::BoardNotFound(_))
        )
    }
}
