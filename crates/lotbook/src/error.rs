//! The portfolio's error type.

use std::path::PathBuf;

use lotbook_allocate::AllocationError;
use lotbook_booking::{BookingError, InsufficientLotError};
use lotbook_ledger::InvalidTradeError;
use thiserror::Error;

/// Errors returned by [`Portfolio`](crate::Portfolio) operations and
/// options loading.
#[derive(Debug, Error)]
pub enum Error {
    /// A trade failed validation.
    #[error(transparent)]
    InvalidTrade(#[from] InvalidTradeError),

    /// A sell could not be covered by open lots.
    #[error(transparent)]
    InsufficientLots(#[from] InsufficientLotError),

    /// The booking engine rejected an event.
    #[error(transparent)]
    Booking(BookingError),

    /// An allocation request was rejected.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A document was not valid JSON for the expected type.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<BookingError> for Error {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InsufficientLots(e) => Self::InsufficientLots(e),
            other => Self::Booking(other),
        }
    }
}

impl Error {
    /// The insufficient-lot error, if that is what this is.
    pub const fn as_insufficient_lots(&self) -> Option<&InsufficientLotError> {
        match self {
            Self::InsufficientLots(e) => Some(e),
            _ => None,
        }
    }
}
