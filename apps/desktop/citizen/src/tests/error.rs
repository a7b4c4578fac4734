// Unit tests for error module
// Tests error serialization and the core-error boundary conversion

use crate::error::CitizenError;

use session_core::error::coordinator::CoordinatorError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that errors serialize to tagged JSON.
///
/// **WHY THIS MATTERS**: A packaged build forwards shell errors to the
/// embedded overlay as tagged JSON. If serialization breaks, the overlay
/// receives opaque errors.
///
/// **BUG THIS CATCHES**: Would catch if someone removes the
/// `#[derive(Serialize)]` or adds a non-serializable field to a variant.
#[test]
fn given_citizen_error_when_serialized_then_succeeds() {
    // GIVEN: A CitizenError
    let err = CitizenError::Citizen {
        message: String::from("Test"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let result = serde_json::to_string(&err);

    // THEN: Should succeed
    assert!(result.is_ok(), "Error should be serializable");

    // AND: Should contain the error data
    let json = result.unwrap();
    assert!(
        json.contains("Citizen"),
        "JSON should contain variant name"
    );
    assert!(json.contains("Test"), "JSON should contain message");
}

/// **VALUE**: Verifies core errors flatten into the `Core` variant with
/// their message intact.
///
/// **WHY THIS MATTERS**: The shell logs every failure through this one
/// conversion; if the source message were lost, logs would say only that
/// something core-side failed.
///
/// **BUG THIS CATCHES**: Would catch the From impl discarding the source
/// error's text, e.g. by formatting the wrong field.
#[test]
fn given_coordinator_error_when_converted_then_core_variant_keeps_message() {
    // GIVEN: A coordinator-side failure
    let source = CoordinatorError::Dispatch {
        message: String::from("event queue closed"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Converting at the shell boundary
    let err = CitizenError::from(source);

    // THEN: It lands in the Core variant with the message preserved
    assert!(
        matches!(err, CitizenError::Core { .. }),
        "Core-side errors should map to CitizenError::Core"
    );
    let rendered = err.to_string();
    assert!(
        rendered.starts_with("Core Error:"),
        "Display should carry the Core prefix, got {rendered:?}"
    );
    assert!(
        rendered.contains("event queue closed"),
        "Display should keep the source message, got {rendered:?}"
    );
}
