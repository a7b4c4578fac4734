// Unit tests for the probe engine
// The async tests wire a real coordinator; probes run against loopback
// sockets owned by the test

use crate::engine::{ProbeEngine, is_join_target, probe_address};
use crate::host::{ForegroundBroker, LogLauncher};
use crate::overlay::ShellOverlay;

use session_core::config::CoreConfig;
use session_core::coordinator::{self, CoordinatorHandle, ShellRequest};
use session_core::engine::SessionEngine;

use std::net::TcpListener;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

fn spawn_engine() -> (
    ProbeEngine,
    CoordinatorHandle,
    mpsc::Receiver<ShellRequest>,
) {
    let engine = ProbeEngine::new();
    let (handle, shell_rx) = coordinator::spawn(
        engine.clone(),
        ShellOverlay::new(),
        LogLauncher,
        ForegroundBroker,
        None,
        &CoreConfig::default(),
    );
    engine.attach(handle.clone());
    (engine, handle, shell_rx)
}

/// Poll until the in-flight flag drops; bounded so a hang fails the test
/// instead of wedging the suite.
async fn wait_until_idle(handle: &CoordinatorHandle) -> bool {
    for _ in 0..200 {
        if !handle.is_connecting().await.unwrap() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}

/// **VALUE**: Verifies a probe against a listening socket completes the
/// whole connect pipeline.
///
/// **WHY THIS MATTERS**: This is the one place the real engine, not a
/// test double, runs the contract end to end: intercept check, probe,
/// progress callbacks, success callback.
///
/// **BUG THIS CATCHES**: Would catch the engine never reporting success
/// back, which would leave the in-flight flag stuck and block every
/// later connect as a duplicate.
#[tokio::test]
async fn given_listening_server_when_connected_then_connection_becomes_active() {
    // GIVEN: A coordinator-wired engine and a listening loopback socket
    let (engine, handle, _shell_rx) = spawn_engine();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();

    // WHEN: Connecting to it
    handle.connect_to(address).await.unwrap();
    assert!(
        handle.is_connecting().await.unwrap(),
        "Accepted connect should raise the in-flight flag"
    );

    // THEN: The attempt settles with an active connection
    assert!(
        wait_until_idle(&handle).await,
        "Probe against a listening socket should settle"
    );
    assert!(
        engine.is_connection_active(),
        "Successful probe should record the active connection"
    );
}

/// **VALUE**: Verifies a refused probe fails the attempt cleanly.
///
/// **WHY THIS MATTERS**: Dead servers are the common case; the attempt
/// must end in an error callback that clears the in-flight flag, not in
/// a half-open state.
///
/// **BUG THIS CATCHES**: Would catch the refusal path forgetting the
/// error callback, leaving the coordinator connecting forever.
#[tokio::test]
async fn given_unreachable_address_when_connected_then_attempt_fails() {
    let (engine, handle, _shell_rx) = spawn_engine();

    // GIVEN: A port that was just released, so nothing listens on it
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    // WHEN: Connecting to it
    handle.connect_to(address).await.unwrap();
    assert!(
        handle.is_connecting().await.unwrap(),
        "Accepted connect should raise the in-flight flag"
    );

    // THEN: The attempt settles with no active connection
    assert!(wait_until_idle(&handle).await, "Refused probe should settle");
    assert!(
        !engine.is_connection_active(),
        "Failed probe should leave no active connection"
    );
}

/// **VALUE**: Verifies join-link shorthand is expanded and then rejected
/// without touching the network.
///
/// **WHY THIS MATTERS**: Join links resolve through the online service,
/// which the probe engine does not speak; treating "cfx.re/join/x" as a
/// hostname would dial a web server and hang out the probe timeout.
///
/// **BUG THIS CATCHES**: Would catch the join-link check running after
/// address expansion instead of before the dial.
#[tokio::test]
async fn given_join_shorthand_when_connected_then_rejected_without_dialing() {
    let (engine, handle, _shell_rx) = spawn_engine();

    // WHEN: Connecting through the "-code" shorthand
    handle.connect_to("-citizen").await.unwrap();
    assert!(
        handle.is_connecting().await.unwrap(),
        "Accepted connect should raise the in-flight flag"
    );

    // THEN: The expanded join link is rejected immediately
    assert!(wait_until_idle(&handle).await, "Rejection should settle");
    assert!(
        !engine.is_connection_active(),
        "Join links should never produce a connection"
    );
}

/// **VALUE**: Verifies bare hosts get the conventional server port.
///
/// **WHY THIS MATTERS**: Players type plain IPs; every one of those
/// would otherwise fail to parse as a socket address.
///
/// **BUG THIS CATCHES**: Would catch the default port changing or being
/// appended to addresses that already carry one.
#[test]
fn given_bare_host_when_expanded_then_default_port_appended() {
    // GIVEN / WHEN / THEN: A host without a port gains the default
    assert_eq!(probe_address("203.0.113.7"), "203.0.113.7:30120");

    // AND: An explicit port is left alone
    assert_eq!(probe_address("203.0.113.7:30500"), "203.0.113.7:30500");
    assert_eq!(
        probe_address("server.example.net:30120"),
        "server.example.net:30120"
    );
}

/// **VALUE**: Verifies join links are told apart from direct addresses.
///
/// **WHY THIS MATTERS**: The two take different paths through the
/// engine; misclassifying a join link dials it as a hostname.
///
/// **BUG THIS CATCHES**: Would catch the classifier matching on the
/// bare host instead of the full join prefix, which would misroute any
/// server actually named after the service's domain.
#[test]
fn given_join_link_when_classified_then_recognized() {
    // GIVEN / WHEN / THEN: The join prefix marks a join link
    assert!(is_join_target("cfx.re/join/abcdef"));

    // AND: Direct addresses are not join links
    assert!(!is_join_target("203.0.113.7:30120"));
    assert!(!is_join_target("cfx.example.net:30120"));
}
