use analytics_types::ValidationError;
use mongodb::error::{ErrorKind, WriteError, WriteFailure};

/// MongoDB server code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Unique constraint on `eventId` violated. An idempotency signal, not a failure.
    #[error("event id already reserved")]
    DuplicateKey,
    #[error("{0}")]
    Database(#[source] mongodb::error::Error),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    InvalidDocument(#[from] ValidationError),
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey)
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(error: mongodb::error::Error) -> Self {
        if is_duplicate_key(&error) {
            StoreError::DuplicateKey
        } else {
            StoreError::Database(error)
        }
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY_CODE,
            ..
        }))
    )
}
