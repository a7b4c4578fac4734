use common::ErrorLocation;

use session_core::error::channel::ChannelError;
use session_core::error::coordinator::CoordinatorError;

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur in the shell.
///
/// Session-core errors are flattened into the `Core` variant at the
/// boundary; the shell only ever logs them, but the structured form and
/// location tracking are kept for diagnostics.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum CitizenError {
    /// Error from this app
    #[error("Citizen Error: {message} {location}")]
    Citizen {
        message: String,
        location: ErrorLocation,
    },

    /// Error from session-core operations (channels, coordinator, roles)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ChannelError> for CitizenError {
    #[track_caller]
    fn from(error: ChannelError) -> Self {
        CitizenError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoordinatorError> for CitizenError {
    #[track_caller]
    fn from(error: CoordinatorError) -> Self {
        CitizenError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
