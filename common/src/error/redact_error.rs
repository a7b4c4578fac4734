use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when a redacted value is about to escape through serde.
#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Serialization Error: {message} {location}")]
    Serialization {
        message: String,
        location: ErrorLocation,
    },
}
