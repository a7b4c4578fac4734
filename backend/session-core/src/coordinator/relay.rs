//! Pending auth payload relay.
//!
//! An auth payload can arrive before the overlay is ready to take it. The
//! relay parks at most one payload; a newer one replaces an undelivered
//! older one, so only the most recent value is ever delivered.

use common::RedactedPayload;

use log::debug;

pub(crate) struct AuthRelay {
    pending: Option<RedactedPayload>,
}

impl AuthRelay {
    pub(crate) fn new() -> Self {
        Self { pending: None }
    }

    /// Park a payload until the overlay is ready. Last write wins.
    pub(crate) fn store(&mut self, payload: RedactedPayload) {
        if self.pending.is_some() {
            debug!("Replacing undelivered auth payload");
        }
        self.pending = Some(payload);
    }

    /// Take the parked payload, leaving the relay empty.
    pub(crate) fn take(&mut self) -> Option<RedactedPayload> {
        self.pending.take()
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
