//! Session interception gate.
//!
//! The engine must not swap connections while previously loaded session
//! state is mid-unload. The gate answers the engine's "may I swap now?"
//! check: either the swap proceeds immediately, or the attempt's resume
//! ticket is parked until the matching teardown event arrives. Nothing
//! here blocks; ordering is enforced purely by parking the ticket.
//!
//! Teardown and check can race in either order. A teardown observed while
//! nothing is parked is recorded in `torn_down`, so a check arriving
//! afterwards answers "proceed" without waiting for an event that already
//! happened. A session-finalized-load clears that record for the next
//! cycle.

use crate::engine::{InterceptDecision, ResumeTicket};

use std::time::Duration;

use log::debug;
use tokio::time::Instant;

enum GateState {
    Idle,
    AwaitingTeardown { resume: ResumeTicket },
}

pub(crate) struct InterceptionGate {
    state: GateState,
    torn_down: bool,
    waiting_since: Option<Instant>,
}

impl InterceptionGate {
    pub(crate) fn new() -> Self {
        Self {
            state: GateState::Idle,
            torn_down: false,
            waiting_since: None,
        }
    }

    /// Answer an interception check.
    ///
    /// `blocking` is true when live session state stands in the way (world
    /// loaded, or killed through an abnormal path). In that case, unless a
    /// teardown was already observed, the ticket is parked and the verdict
    /// is [`InterceptDecision::Wait`]. A non-blocking check clears the
    /// recorded teardown: the next cycle must observe its own.
    pub(crate) fn check(&mut self, resume: ResumeTicket, blocking: bool) -> InterceptDecision {
        if blocking {
            if !self.torn_down {
                debug!("Parking resume ticket {} until teardown", resume.0);
                self.state = GateState::AwaitingTeardown { resume };
                self.waiting_since = Some(Instant::now());
                return InterceptDecision::Wait;
            }
        } else {
            self.torn_down = false;
        }

        InterceptDecision::Proceed
    }

    /// Record a completed teardown.
    ///
    /// Returns the parked ticket if one was waiting; the caller resumes it
    /// exactly once. With nothing parked, the teardown itself is recorded
    /// for a later racily ordered check.
    pub(crate) fn on_shutdown(&mut self) -> Option<ResumeTicket> {
        match std::mem::replace(&mut self.state, GateState::Idle) {
            GateState::AwaitingTeardown { resume } => {
                self.waiting_since = None;
                Some(resume)
            }
            GateState::Idle => {
                self.torn_down = true;
                None
            }
        }
    }

    /// A session finished loading; forget any recorded teardown.
    pub(crate) fn on_finalized_load(&mut self) {
        self.torn_down = false;
    }

    /// Whether a parked ticket has waited at least `bound`.
    pub(crate) fn expired(&self, bound: Duration) -> bool {
        match self.waiting_since {
            Some(waiting_since) => waiting_since.elapsed() >= bound,
            None => false,
        }
    }

    /// Give up on a parked ticket (timeout path).
    pub(crate) fn abandon(&mut self) -> Option<ResumeTicket> {
        match std::mem::replace(&mut self.state, GateState::Idle) {
            GateState::AwaitingTeardown { resume } => {
                self.waiting_since = None;
                Some(resume)
            }
            GateState::Idle => None,
        }
    }
}
