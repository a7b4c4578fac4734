// Unit tests for logger module initialization logic
// One test owns the process-global guards end to end, so the outcomes
// stay deterministic regardless of test ordering

use crate::logger::initialize;

use std::path::PathBuf;

use tempfile::tempdir;

/// **VALUE**: Verifies the whole initialization contract in one pass: an
/// unwritable directory fails cleanly, and every later call returns Ok.
///
/// **WHY THIS MATTERS**: Initialization races a process-global Once and
/// AtomicBool; split across tests, whichever ran first would decide what
/// the others observe. A failed first attempt must report its error
/// instead of panicking, and repeat calls from other code paths must
/// never error during startup.
///
/// **BUG THIS CATCHES**: Would catch `fern::log_file()` panicking instead
/// of returning a Result, and would catch the guards being removed, which
/// makes fern panic on the second global-logger install.
#[test]
fn given_failed_first_attempt_when_initialized_again_then_later_calls_return_ok() {
    // GIVEN: A directory that cannot hold a log file
    let invalid_dir = PathBuf::from("/dev/null/citizen-logs");

    // WHEN: The first initialization attempt runs against it
    let first = initialize(&invalid_dir);

    // THEN: It reports the failure instead of panicking
    assert!(
        first.is_err(),
        "Unwritable log directory should fail initialization"
    );

    // WHEN: Later calls run against a valid directory
    let dir = tempdir().unwrap();
    let second = initialize(dir.path());
    let third = initialize(dir.path());

    // THEN: The one-shot guard makes them no-ops that return Ok
    assert!(second.is_ok(), "Repeat initialization should return Ok");
    assert!(third.is_ok(), "Repeat initialization should stay Ok");
}
