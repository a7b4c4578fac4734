//! Secure auth payload handling with redacted Debug output.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// An authentication payload that never exposes its value in logs or debug
/// output.
///
/// Payloads arrive over the auth channel or an `accept-auth` launch URI and
/// may sit in memory until the UI is ready to take them. While parked they
/// must not leak through `Debug`, `Display`, or accidental serialization.
#[derive(Clone)]
pub struct RedactedPayload {
    inner: String,
}

impl RedactedPayload {
    /// Wrap a raw payload value.
    pub fn new(payload: String) -> Self {
        Self { inner: payload }
    }

    /// Get the actual payload value for delivery.
    ///
    /// # Security Note
    /// Only call this when actually handing the payload to the UI.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Get the payload length (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for RedactedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedPayload([REDACTED])")
    }
}

impl fmt::Display for RedactedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED AUTH PAYLOAD]")
    }
}

impl Drop for RedactedPayload {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// Prevent accidental serialization
impl serde::Serialize for RedactedPayload {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            message: String::from(
                "RedactedPayload cannot be serialized - use as_str() explicitly",
            ),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
