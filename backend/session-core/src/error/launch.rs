use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LaunchError {
    #[error("Malformed Uri Error: {message} {location}")]
    MalformedUri {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unsupported Action Error: {message} {location}")]
    UnsupportedAction {
        message: String,
        location: ErrorLocation,
    },

    #[error("Missing Target Error: {message} {location}")]
    MissingTarget {
        message: String,
        location: ErrorLocation,
    },
}
