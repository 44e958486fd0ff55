//! Persistence error types.

use crate::error::located_error;

located_error!(
    /// Persistence error with location tracking.
    pub struct PersistenceError,
    "Persistence error"
);

impl From<diesel::result::Error> for PersistenceError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(format!("Diesel error: {}", err))
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("Connection error: {}", err))
    }
}
