// Unit tests for target normalization
// The actor's event handling is covered in integration_tests/coordinator.rs

use crate::coordinator::normalize_target;

/// **VALUE**: Verifies the join-code shorthand expands to the join URL.
///
/// **WHY THIS MATTERS**: Users paste `-ABCDEF` codes straight from the
/// forums; the engine only understands the expanded join URL.
///
/// **BUG THIS CATCHES**: Would catch the prefix being glued on without
/// stripping the dash, producing `cfx.re/join/-ABCDEF`.
#[test]
fn given_join_shorthand_when_normalized_then_expands_to_join_url() {
    // GIVEN: A shorthand join code
    let target = "-ABCD12";

    // WHEN: Normalizing it
    let normalized = normalize_target(target);

    // THEN: The code is appended to the join URL prefix
    assert_eq!(normalized, "cfx.re/join/ABCD12");
}

/// **VALUE**: Verifies plain addresses pass through untouched.
///
/// **WHY THIS MATTERS**: Most targets are host:port pairs; normalization
/// must be a no-op for them.
///
/// **BUG THIS CATCHES**: Would catch an over-eager rewrite that mangles
/// ordinary addresses.
#[test]
fn given_plain_address_when_normalized_then_unchanged() {
    // GIVEN: An ordinary address
    let target = "myserver.example:30120";

    // WHEN: Normalizing it
    let normalized = normalize_target(target);

    // THEN: It comes back unchanged
    assert_eq!(normalized, target);
}

/// **VALUE**: Verifies a dash inside a hostname is not treated as the
/// shorthand marker.
///
/// **WHY THIS MATTERS**: Hostnames legitimately contain dashes; only a
/// leading dash marks a join code.
///
/// **BUG THIS CATCHES**: Would catch a `contains`-style check replacing
/// the prefix check.
#[test]
fn given_dash_inside_target_when_normalized_then_unchanged() {
    // GIVEN: An address with an interior dash
    let target = "my-server.example:30120";

    // WHEN: Normalizing it
    let normalized = normalize_target(target);

    // THEN: It comes back unchanged
    assert_eq!(normalized, target);
}

/// **VALUE**: Verifies a bare dash degrades to the bare prefix rather
/// than panicking.
///
/// **WHY THIS MATTERS**: The target comes from user input and forwarded
/// messages; a lone dash must not take the coordinator down.
///
/// **BUG THIS CATCHES**: Would catch indexing past the dash instead of
/// slicing.
#[test]
fn given_bare_dash_when_normalized_then_prefix_only() {
    // GIVEN: A dash with no code after it
    let target = "-";

    // WHEN: Normalizing it
    let normalized = normalize_target(target);

    // THEN: The result is the prefix with an empty code
    assert_eq!(normalized, "cfx.re/join/");
}
