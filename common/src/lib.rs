//! Shared leaf types for the Citizen desktop client.
//!
//! This crate contains the small pieces every other crate depends on:
//! caller-site error locations and the redacted wrapper for secrets that
//! must never reach a log line.
//!
//! ## Architecture
//!
//! - **common** (this crate): leaf types, no business logic
//! - **session-core**: connection lifecycle coordination built on them
//! - **citizen**: the application wiring everything together
//!
//! This layered architecture keeps concerns separated and makes testing easier.

pub mod error;
pub mod redacted_payload;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_payload::RedactedPayload;

#[cfg(test)]
mod tests;
