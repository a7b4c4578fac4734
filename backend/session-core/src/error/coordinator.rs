use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CoordinatorError {
    #[error("Dispatch Error: {message} {location}")]
    Dispatch {
        message: String,
        location: ErrorLocation,
    },

    #[error("Reply Error: {message} {location}")]
    Reply {
        message: String,
        location: ErrorLocation,
    },
}
