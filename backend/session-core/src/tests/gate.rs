// Unit tests for the interception gate state machine
// The full wait-resume flow through the actor is covered in
// integration_tests/coordinator.rs

use crate::coordinator::gate::InterceptionGate;
use crate::engine::{InterceptDecision, ResumeTicket};

use std::time::Duration;

/// **VALUE**: Verifies a check with nothing in the way proceeds.
///
/// **WHY THIS MATTERS**: The very first connect of a process must never
/// wait; there is no session state to tear down yet.
///
/// **BUG THIS CATCHES**: Would catch the gate defaulting to parking, which
/// would hang every cold connect until the teardown timeout.
#[test]
fn given_idle_gate_when_nothing_blocking_then_proceed() {
    // GIVEN: A fresh gate
    let mut gate = InterceptionGate::new();

    // WHEN: A non-blocking check arrives
    let decision = gate.check(ResumeTicket(1), false);

    // THEN: The connect proceeds immediately
    assert_eq!(decision, InterceptDecision::Proceed);
}

/// **VALUE**: Verifies a blocked check parks its ticket and the matching
/// teardown releases exactly that ticket.
///
/// **WHY THIS MATTERS**: Swapping connections under live session state
/// corrupts the engine; the parked ticket is how the attempt survives the
/// wait.
///
/// **BUG THIS CATCHES**: Would catch the parked ticket being dropped on
/// teardown, leaving the user stuck on the waiting screen forever.
#[test]
fn given_blocking_state_when_checked_then_waits_until_shutdown() {
    // GIVEN: A gate with live session state in the way
    let mut gate = InterceptionGate::new();

    // WHEN: The check arrives and teardown completes afterwards
    let decision = gate.check(ResumeTicket(7), true);
    let released = gate.on_shutdown();

    // THEN: The check waited and the same ticket is released once
    assert_eq!(decision, InterceptDecision::Wait);
    assert_eq!(released, Some(ResumeTicket(7)));
    assert_eq!(
        gate.on_shutdown(),
        None,
        "A second teardown must not release the ticket again"
    );
}

/// **VALUE**: Verifies a teardown observed before the check lets the
/// check proceed without waiting.
///
/// **WHY THIS MATTERS**: Teardown and the engine's check race in either
/// order. If an already-completed teardown did not count, the connect
/// would wait for an event that will never fire again.
///
/// **BUG THIS CATCHES**: Would catch the recorded-teardown flag being
/// consulted after parking instead of before.
#[test]
fn given_recorded_teardown_when_blocking_check_then_proceeds() {
    // GIVEN: A teardown that arrived while nothing was parked
    let mut gate = InterceptionGate::new();
    assert_eq!(gate.on_shutdown(), None);

    // WHEN: A blocking check arrives afterwards
    let decision = gate.check(ResumeTicket(3), true);

    // THEN: The check proceeds; the teardown already happened
    assert_eq!(decision, InterceptDecision::Proceed);
}

/// **VALUE**: Verifies a finalized load clears the recorded teardown.
///
/// **WHY THIS MATTERS**: The teardown record belongs to the previous
/// session cycle. Once a new world is loaded, the next swap must wait for
/// its own teardown.
///
/// **BUG THIS CATCHES**: Would catch the record leaking across cycles and
/// letting a swap through under a freshly loaded world.
#[test]
fn given_finalized_load_when_blocking_check_then_waits_again() {
    // GIVEN: A recorded teardown followed by a finished load
    let mut gate = InterceptionGate::new();
    assert_eq!(gate.on_shutdown(), None);
    gate.on_finalized_load();

    // WHEN: A blocking check arrives
    let decision = gate.check(ResumeTicket(4), true);

    // THEN: The stale record is gone and the check waits
    assert_eq!(decision, InterceptDecision::Wait);
}

/// **VALUE**: Verifies a non-blocking check consumes the recorded
/// teardown.
///
/// **WHY THIS MATTERS**: Once a connect passes the gate, the previous
/// cycle is over; its teardown must not also satisfy the next cycle.
///
/// **BUG THIS CATCHES**: Would catch one teardown being spent twice.
#[test]
fn given_non_blocking_check_then_recorded_teardown_cleared() {
    // GIVEN: A recorded teardown
    let mut gate = InterceptionGate::new();
    assert_eq!(gate.on_shutdown(), None);

    // WHEN: A non-blocking check passes, then live state blocks again
    assert_eq!(gate.check(ResumeTicket(5), false), InterceptDecision::Proceed);
    let decision = gate.check(ResumeTicket(6), true);

    // THEN: The second check waits; the record was consumed
    assert_eq!(decision, InterceptDecision::Wait);
}

/// **VALUE**: Verifies abandoning a parked ticket empties the gate.
///
/// **WHY THIS MATTERS**: The timeout path must leave the gate in a state
/// where a much later teardown releases nothing; that attempt was already
/// reported as failed.
///
/// **BUG THIS CATCHES**: Would catch a late teardown resuming a connect
/// the user already saw fail.
#[test]
fn given_parked_ticket_when_abandoned_then_shutdown_releases_nothing() {
    // GIVEN: A parked ticket
    let mut gate = InterceptionGate::new();
    assert_eq!(gate.check(ResumeTicket(9), true), InterceptDecision::Wait);

    // WHEN: The wait is abandoned and teardown completes later
    let abandoned = gate.abandon();
    let released = gate.on_shutdown();

    // THEN: Abandon returned the ticket; the teardown releases nothing
    assert_eq!(abandoned, Some(ResumeTicket(9)));
    assert_eq!(released, None);
}

/// **VALUE**: Verifies expiry only reports for a parked ticket.
///
/// **WHY THIS MATTERS**: The poller asks every tick; spurious expiry on
/// an idle gate would cancel connects that never waited.
///
/// **BUG THIS CATCHES**: Would catch the wait clock not being cleared on
/// release.
#[test]
fn given_idle_gate_then_never_expired() {
    // GIVEN: A gate that parked and already released a ticket
    let mut gate = InterceptionGate::new();
    assert!(!gate.expired(Duration::ZERO), "Fresh gate cannot expire");
    gate.check(ResumeTicket(2), true);
    gate.on_shutdown();

    // WHEN: Asking for expiry with a zero bound
    let expired = gate.expired(Duration::ZERO);

    // THEN: Nothing is waiting, so nothing expires
    assert!(!expired, "Released gate should not report expiry");
}

/// **VALUE**: Verifies a parked ticket reports expiry once the bound
/// passes.
///
/// **WHY THIS MATTERS**: This is the only thing standing between a lost
/// teardown event and an eternal waiting screen.
///
/// **BUG THIS CATCHES**: Would catch the comparison being inverted or the
/// clock starting at the wrong moment.
#[test]
fn given_parked_ticket_when_bound_elapsed_then_expired() {
    // GIVEN: A parked ticket
    let mut gate = InterceptionGate::new();
    gate.check(ResumeTicket(8), true);

    // WHEN: Asking for expiry with a zero bound
    let expired = gate.expired(Duration::ZERO);

    // THEN: Any elapsed time satisfies a zero bound
    assert!(expired, "Parked ticket should expire under a zero bound");
    assert!(
        !gate.expired(Duration::from_secs(3600)),
        "A generous bound has not elapsed yet"
    );
}
