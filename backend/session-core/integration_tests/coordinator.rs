use crate::helpers::{
    EngineCall, LauncherCall, spawn_rig, synchronize, test_config,
};

use session_core::coordinator::ShellRequest;
use session_core::engine::{InterceptDecision, ResumeTicket};
use session_core::overlay::{CardPrompt, ConnectProgress, OverlayMessage};

use std::time::Duration;

use serde_json::json;

/// **VALUE**: Verifies the complete accept path of a connect request.
///
/// **WHY THIS MATTERS**: Every connect, regardless of origin, flows
/// through this path: the overlay must flip to the connecting screen and
/// the engine must receive the target.
///
/// **BUG THIS CATCHES**: Would catch the overlay being notified after the
/// engine instead of before, or the in-flight flag not being set.
#[tokio::test]
async fn given_connect_request_when_accepted_then_engine_and_overlay_driven() {
    // GIVEN: An idle coordinator
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));

    // WHEN: A connect request arrives
    rig.handle
        .connect_to("myserver.example:30120")
        .await
        .unwrap();
    synchronize(&rig.handle).await;

    // THEN: The overlay shows connecting, the engine gets the target, and
    // the attempt is marked in flight
    assert_eq!(rig.overlay.posts(), vec![OverlayMessage::Connecting]);
    assert_eq!(
        rig.engine.calls(),
        vec![EngineCall::Connect("myserver.example:30120".to_string())]
    );
    assert!(rig.handle.is_connecting().await.unwrap());
}

/// **VALUE**: Verifies the duplicate-connect guard.
///
/// **WHY THIS MATTERS**: Double-clicks and repeated URI activations are
/// routine. A second attempt racing the first would interleave two engine
/// state machines over one connection.
///
/// **BUG THIS CATCHES**: Would catch the in-flight flag being checked
/// after the engine call instead of before.
#[tokio::test]
async fn given_connect_in_flight_when_second_requested_then_ignored() {
    // GIVEN: A connect already in flight
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle.connect_to("first.example:30120").await.unwrap();

    // WHEN: A second request arrives before the first resolves
    rig.handle.connect_to("second.example:30120").await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: Only the first request reached the engine and the overlay
    assert_eq!(
        rig.engine.calls(),
        vec![EngineCall::Connect("first.example:30120".to_string())]
    );
    assert_eq!(rig.overlay.posts(), vec![OverlayMessage::Connecting]);
}

/// **VALUE**: Verifies shorthand expansion happens on the way to the
/// engine.
///
/// **WHY THIS MATTERS**: The engine has no notion of join codes; if the
/// shorthand leaked through, address resolution would try to resolve a
/// hostname starting with a dash.
///
/// **BUG THIS CATCHES**: Would catch normalization being applied to the
/// stored target instead of the engine-bound one.
#[tokio::test]
async fn given_join_shorthand_when_connected_then_engine_sees_join_url() {
    // GIVEN: An idle coordinator
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));

    // WHEN: Connecting with a join shorthand
    rig.handle.connect_to("-ABC123").await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: The engine receives the expanded join URL
    assert_eq!(
        rig.engine.calls(),
        vec![EngineCall::Connect("cfx.re/join/ABC123".to_string())]
    );
}

/// **VALUE**: Verifies a build-mismatch failure turns into a shell
/// relaunch request carrying the raw target.
///
/// **WHY THIS MATTERS**: The replacement process re-enters the connect
/// flow from the top and performs its own normalization; handing it the
/// already-normalized target would re-normalize a join URL. The user must
/// also never see this failure as an error, only as a restart.
///
/// **BUG THIS CATCHES**: Would catch the normalized target being stored,
/// the failure leaking to the overlay, or the in-flight flag being reset
/// while the process is being replaced.
#[tokio::test]
async fn given_build_mismatch_error_then_shell_switches_build_with_raw_target() {
    // GIVEN: A connect to a shorthand target in flight
    let mut rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle.connect_to("-ABC123").await.unwrap();

    // WHEN: The server reports a build mismatch
    rig.handle
        .connection_error(
            "This server requires a different game build (2189). Restart to switch.",
        )
        .await
        .unwrap();

    // THEN: The shell is asked to switch builds against the raw target
    let request = rig.shell_rx.recv().await;
    assert_eq!(
        request,
        Some(ShellRequest::SwitchBuild {
            target: "-ABC123".to_string()
        })
    );

    // THEN: No failure surfaced anywhere and the attempt stays in flight
    assert!(
        !rig.overlay
            .posts()
            .iter()
            .any(|message| matches!(message, OverlayMessage::ConnectFailed { .. })),
        "Mismatch must not surface as a connect failure"
    );
    assert!(
        !rig.launcher
            .calls()
            .iter()
            .any(|call| matches!(call, LauncherCall::ConnectionError { .. })),
        "Mismatch must not reach the launcher as an error"
    );
    assert!(
        rig.handle.is_connecting().await.unwrap(),
        "The attempt must stay in flight while the process is replaced"
    );
}

/// **VALUE**: Verifies a mismatch report with no recorded target degrades
/// to an ordinary failure.
///
/// **WHY THIS MATTERS**: A relaunch request without a target would spawn
/// a process with nowhere to connect. Surfacing the failure is the only
/// honest fallback.
///
/// **BUG THIS CATCHES**: Would catch the mismatch arm unwrapping the
/// stored target.
#[tokio::test]
async fn given_build_mismatch_without_prior_target_then_surfaced_as_failure() {
    // GIVEN: A coordinator that never saw a connect
    let mut rig = spawn_rig(None, &test_config(&std::env::temp_dir()));

    // WHEN: A mismatch failure arrives out of nowhere
    rig.handle
        .connection_error("This server requires a different game build (2189).")
        .await
        .unwrap();
    synchronize(&rig.handle).await;

    // THEN: No relaunch is requested and the failure is surfaced
    assert!(
        rig.shell_rx.try_recv().is_err(),
        "No target means no relaunch request"
    );
    assert!(
        rig.overlay
            .posts()
            .iter()
            .any(|message| matches!(message, OverlayMessage::ConnectFailed { .. })),
        "The failure should be surfaced normally"
    );
}

/// **VALUE**: Verifies an ordinary failure reaches the overlay and the
/// launcher with the message intact.
///
/// **WHY THIS MATTERS**: The server's failure text is the only clue the
/// user gets; paraphrasing or truncating it here destroys information.
///
/// **BUG THIS CATCHES**: Would catch the message being rewritten, or the
/// in-flight flag surviving a failure and blocking every later attempt.
#[tokio::test]
async fn given_connection_error_then_failure_surfaced_to_overlay_and_launcher() {
    // GIVEN: A connect in flight
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle
        .connect_to("myserver.example:30120")
        .await
        .unwrap();

    // WHEN: The attempt fails
    rig.handle
        .connection_error("Connection refused by server")
        .await
        .unwrap();
    synchronize(&rig.handle).await;

    // THEN: Both surfaces carry the verbatim message
    assert!(rig.overlay.posts().contains(&OverlayMessage::ConnectFailed {
        message: "Connection refused by server".to_string()
    }));
    assert!(rig.launcher.calls().contains(&LauncherCall::ConnectionError {
        target: "myserver.example:30120".to_string(),
        message: "Connection refused by server".to_string()
    }));

    // THEN: The slot is free for the next attempt
    assert!(!rig.handle.is_connecting().await.unwrap());
}

/// **VALUE**: Verifies success clears the in-flight flag and publishes
/// the resolved address.
///
/// **WHY THIS MATTERS**: The address drives the overlay's server display,
/// and the cleared flag is what allows the next connect after this
/// session ends.
///
/// **BUG THIS CATCHES**: Would catch success leaving the flag set, which
/// would silently ignore every later connect.
#[tokio::test]
async fn given_connection_success_then_address_posted_and_flag_cleared() {
    // GIVEN: A connect in flight
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle
        .connect_to("myserver.example:30120")
        .await
        .unwrap();

    // WHEN: The attempt succeeds
    rig.handle
        .connection_success("203.0.113.9:30120")
        .await
        .unwrap();
    synchronize(&rig.handle).await;

    // THEN: The address is posted and the flag is cleared
    assert!(rig.overlay.posts().contains(&OverlayMessage::SetServerAddress {
        data: "203.0.113.9:30120".to_string()
    }));
    assert!(!rig.handle.is_connecting().await.unwrap());
}

/// **VALUE**: Verifies progress updates fan out to both surfaces.
///
/// **WHY THIS MATTERS**: The overlay progress bar and the launcher's
/// status display are fed from the same callback; losing either leaves a
/// frozen UI during long downloads.
///
/// **BUG THIS CATCHES**: Would catch the counts being swapped between
/// `count` and `total`.
#[tokio::test]
async fn given_connection_progress_then_both_surfaces_updated() {
    // GIVEN: A connect in flight
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle
        .connect_to("myserver.example:30120")
        .await
        .unwrap();

    // WHEN: Progress arrives
    rig.handle
        .connection_progress("Downloading content", 3, 10)
        .await
        .unwrap();
    synchronize(&rig.handle).await;

    // THEN: Overlay and launcher both carry the update
    assert!(rig.overlay.posts().contains(&OverlayMessage::ConnectStatus {
        data: ConnectProgress {
            message: "Downloading content".to_string(),
            count: 3,
            total: 10
        }
    }));
    assert!(rig.launcher.calls().contains(&LauncherCall::Progress {
        message: "Downloading content".to_string(),
        current: 3,
        total: 10
    }));
}

/// **VALUE**: Verifies an auth payload is delivered straight through when
/// the overlay is up.
///
/// **WHY THIS MATTERS**: This is the common case of the sign-in handoff;
/// any detour through the parking slot would add a UI round-trip.
///
/// **BUG THIS CATCHES**: Would catch payloads being parked even though
/// the overlay could take them.
#[tokio::test]
async fn given_overlay_present_when_auth_payload_then_delivered_immediately() {
    // GIVEN: A coordinator with the overlay present
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));

    // WHEN: An auth payload arrives
    rig.handle.handle_auth_payload("token=abc").await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: The overlay receives it immediately
    assert_eq!(
        rig.overlay.posts(),
        vec![OverlayMessage::AuthPayload {
            data: "token=abc".to_string()
        }]
    );
}

/// **VALUE**: Verifies a payload arriving before the overlay is ready is
/// parked and flushed on readiness.
///
/// **WHY THIS MATTERS**: Auth activations race the first window paint on
/// cold starts. Dropping the payload would strand the user on the sign-in
/// page of their browser with nothing happening in the launcher.
///
/// **BUG THIS CATCHES**: Would catch the ui-ready hook forgetting to
/// flush, or flushing into an overlay that is still absent.
#[tokio::test]
async fn given_overlay_absent_when_auth_payload_then_parked_until_ui_ready() {
    // GIVEN: A coordinator whose overlay is not up yet
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.overlay.set_present(false);

    // WHEN: The payload arrives early
    rig.handle.handle_auth_payload("token=abc").await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: Nothing is posted yet
    assert!(rig.overlay.posts().is_empty(), "Payload should be parked");

    // WHEN: The overlay comes up
    rig.overlay.set_present(true);
    rig.handle.ui_ready().await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: The parked payload is delivered
    assert_eq!(
        rig.overlay.posts(),
        vec![OverlayMessage::AuthPayload {
            data: "token=abc".to_string()
        }]
    );
}

/// **VALUE**: Verifies that of two parked payloads only the newest is
/// ever delivered.
///
/// **WHY THIS MATTERS**: Restarting sign-in invalidates the earlier
/// credential; delivering it anyway would fail the handoff with an
/// expired-credential error right as the UI appears.
///
/// **BUG THIS CATCHES**: Would catch the parking slot queueing instead of
/// replacing.
#[tokio::test]
async fn given_two_parked_payloads_when_ui_ready_then_latest_delivered_once() {
    // GIVEN: Two payloads parked while the overlay is down
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.overlay.set_present(false);
    rig.handle.handle_auth_payload("token=first").await.unwrap();
    rig.handle.handle_auth_payload("token=second").await.unwrap();
    synchronize(&rig.handle).await;

    // WHEN: The overlay comes up
    rig.overlay.set_present(true);
    rig.handle.ui_ready().await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: Exactly one delivery, carrying the newest payload
    assert_eq!(
        rig.overlay.posts(),
        vec![OverlayMessage::AuthPayload {
            data: "token=second".to_string()
        }]
    );
}

/// **VALUE**: Verifies the wait-then-resume cycle around session
/// teardown, and that the resume fires exactly once.
///
/// **WHY THIS MATTERS**: This ordering is the contract that stops a new
/// connection from being built on top of a half-unloaded world. Resuming
/// twice would double-drive the engine's connect state machine.
///
/// **BUG THIS CATCHES**: Would catch the parked ticket surviving its
/// release and being resumed again on the next teardown.
#[tokio::test]
async fn given_world_loaded_when_intercept_checked_then_waits_and_resumes_once() {
    // GIVEN: A session fully up after a successful connect
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle.connect_to("first.example:30120").await.unwrap();
    rig.handle
        .connection_success("first.example:30120")
        .await
        .unwrap();
    rig.handle.session_finalized_load().await.unwrap();

    // WHEN: A new connect is checked against the gate
    rig.handle.connect_to("second.example:30120").await.unwrap();
    let decision = rig
        .handle
        .intercept_check("second.example:30120", ResumeTicket(7))
        .await
        .unwrap();

    // THEN: The attempt waits and the user sees why
    assert_eq!(decision, InterceptDecision::Wait);
    assert!(rig.overlay.posts().contains(&OverlayMessage::ConnectStatus {
        data: ConnectProgress {
            message: "Waiting for game to shut down...".to_string(),
            count: 0,
            total: 100
        }
    }));

    // WHEN: Teardown completes, twice
    rig.handle.shutdown_session().await.unwrap();
    rig.handle.shutdown_session().await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: The parked attempt resumes exactly once
    let resumes = rig
        .engine
        .calls()
        .iter()
        .filter(|call| matches!(call, EngineCall::Resume(_)))
        .count();
    assert_eq!(resumes, 1, "The ticket must resume exactly once");
    assert!(rig.engine.calls().contains(&EngineCall::Resume(ResumeTicket(7))));
}

/// **VALUE**: Verifies a teardown that completes before the gate check
/// lets the connect proceed without waiting.
///
/// **WHY THIS MATTERS**: After an abnormal kill the teardown and the new
/// attempt race. Waiting for a teardown that already happened would park
/// the attempt until the timeout abandons it.
///
/// **BUG THIS CATCHES**: Would catch the completed-teardown record being
/// lost between the kill and the check.
#[tokio::test]
async fn given_early_network_kill_then_teardown_then_connect_proceeds() {
    // GIVEN: A connect whose network died before the world loaded
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle.connect_to("first.example:30120").await.unwrap();
    rig.handle.network_killed("Server shutting down").await.unwrap();
    rig.handle.shutdown_session().await.unwrap();

    // WHEN: The next attempt is checked against the gate
    rig.handle.connect_to("second.example:30120").await.unwrap();
    let decision = rig
        .handle
        .intercept_check("second.example:30120", ResumeTicket(2))
        .await
        .unwrap();

    // THEN: It proceeds; the teardown already happened
    assert_eq!(decision, InterceptDecision::Proceed);
    assert!(
        !rig.engine
            .calls()
            .iter()
            .any(|call| matches!(call, EngineCall::Resume(_))),
        "A proceeding attempt is never resumed"
    );
}

/// **VALUE**: Verifies a parked attempt is abandoned when teardown never
/// completes.
///
/// **WHY THIS MATTERS**: A teardown event can be lost when the engine
/// wedges. Without the timeout the user stares at the waiting screen
/// forever with no way out short of killing the process.
///
/// **BUG THIS CATCHES**: Would catch the timeout not cancelling the
/// deferred attempt, or a later teardown resuming an attempt the user
/// already saw fail.
#[tokio::test(start_paused = true)]
async fn given_parked_connect_when_timeout_elapses_then_attempt_abandoned() {
    // GIVEN: A parked connect under a short teardown bound
    let mut config = test_config(&std::env::temp_dir());
    config.teardown_timeout = Duration::from_secs(5);
    let rig = spawn_rig(None, &config);

    rig.handle.connect_to("first.example:30120").await.unwrap();
    rig.handle
        .connection_success("first.example:30120")
        .await
        .unwrap();
    rig.handle.session_finalized_load().await.unwrap();
    rig.handle.connect_to("second.example:30120").await.unwrap();
    let decision = rig
        .handle
        .intercept_check("second.example:30120", ResumeTicket(3))
        .await
        .unwrap();
    assert_eq!(decision, InterceptDecision::Wait);

    // WHEN: The bound elapses and the next tick runs housekeeping
    tokio::time::advance(Duration::from_secs(6)).await;
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: The attempt is cancelled and the failure surfaced
    assert!(rig.engine.calls().contains(&EngineCall::CancelDeferred));
    assert!(rig.overlay.posts().contains(&OverlayMessage::ConnectFailed {
        message: "Timed out waiting for the current session to shut down.".to_string()
    }));
    assert!(!rig.handle.is_connecting().await.unwrap());

    // THEN: A teardown arriving after the timeout resumes nothing
    rig.handle.shutdown_session().await.unwrap();
    synchronize(&rig.handle).await;
    assert!(
        !rig.engine
            .calls()
            .iter()
            .any(|call| matches!(call, EngineCall::Resume(_))),
        "An abandoned attempt must not resume"
    );
}

/// **VALUE**: Verifies an abnormal network kill resets the attempt and
/// warns the user.
///
/// **WHY THIS MATTERS**: Kills arrive at any moment. The in-flight flag
/// must not survive them, and the reason is the user's only explanation
/// for landing back on the main screen.
///
/// **BUG THIS CATCHES**: Would catch the warning being swallowed or the
/// flag staying set after a kill.
#[tokio::test]
async fn given_abnormal_network_kill_then_warning_posted_and_flag_cleared() {
    // GIVEN: A connect in flight
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle
        .connect_to("myserver.example:30120")
        .await
        .unwrap();

    // WHEN: The network dies abnormally
    rig.handle
        .network_killed("Connection to the server was lost.")
        .await
        .unwrap();
    synchronize(&rig.handle).await;

    // THEN: The user is warned and the slot is free again
    assert!(rig.overlay.posts().contains(&OverlayMessage::SetWarningMessage {
        message: "Connection to the server was lost.".to_string()
    }));
    assert!(!rig.handle.is_connecting().await.unwrap());
}

/// **VALUE**: Verifies a user-initiated disconnect does not warn.
///
/// **WHY THIS MATTERS**: The disconnect path kills the network with a
/// sentinel reason; surfacing that as a warning would scold the user for
/// their own click.
///
/// **BUG THIS CATCHES**: Would catch the sentinel comparison being
/// dropped, which shows a spurious warning after every disconnect.
#[tokio::test]
async fn given_user_disconnect_reason_when_network_killed_then_no_warning() {
    // GIVEN: An idle coordinator
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));

    // WHEN: The kill carries the user-disconnect sentinel
    rig.handle.network_killed("Disconnected.").await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: No warning reaches the overlay
    assert!(
        !rig.overlay
            .posts()
            .iter()
            .any(|message| matches!(message, OverlayMessage::SetWarningMessage { .. })),
        "A user disconnect must not warn"
    );
}

/// **VALUE**: Verifies the disconnect path tears the session down and
/// returns the UI home.
///
/// **WHY THIS MATTERS**: This is the only path that kills an active
/// session on purpose; the launcher and the overlay both need to know the
/// session ended.
///
/// **BUG THIS CATCHES**: Would catch the kill reason drifting from the
/// sentinel, which would make the kill warn the user.
#[tokio::test]
async fn given_active_connection_when_disconnect_then_killed_and_ui_restored() {
    // GIVEN: An active connection
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.engine.set_active(true);

    // WHEN: The user disconnects
    rig.handle.disconnect().await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: The network is killed with the sentinel and the UI returns
    assert_eq!(
        rig.engine.calls(),
        vec![EngineCall::KillNetwork("Disconnected.".to_string())]
    );
    assert!(rig.launcher.calls().contains(&LauncherCall::Disconnected));
    assert_eq!(rig.overlay.main_ui_shows(), 1);
}

/// **VALUE**: Verifies disconnect is a no-op with nothing connected.
///
/// **WHY THIS MATTERS**: The disconnect control stays clickable on the
/// main screen; killing an idle engine would tear down state that does
/// not exist.
///
/// **BUG THIS CATCHES**: Would catch the active check being skipped.
#[tokio::test]
async fn given_idle_engine_when_disconnect_then_nothing_happens() {
    // GIVEN: No active connection
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));

    // WHEN: A disconnect arrives anyway
    rig.handle.disconnect().await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: Nothing was killed and nothing was notified
    assert!(rig.engine.calls().is_empty());
    assert!(!rig.launcher.calls().contains(&LauncherCall::Disconnected));
    assert_eq!(rig.overlay.main_ui_shows(), 0);
}

/// **VALUE**: Verifies the card round trip: prompt out, response in,
/// token attached.
///
/// **WHY THIS MATTERS**: Card servers correlate the response by token; a
/// response under the wrong token is silently discarded server-side and
/// the connect hangs.
///
/// **BUG THIS CATCHES**: Would catch the response being forwarded with
/// the whole submitted document instead of its `data` member.
#[tokio::test]
async fn given_card_presented_then_prompt_posted_and_response_routed() {
    // GIVEN: A connect in flight
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle
        .connect_to("myserver.example:30120")
        .await
        .unwrap();

    // WHEN: The server presents a card
    rig.handle
        .card_presented(r#"{"type":"AdaptiveCard","version":"1.0"}"#, "tok-1")
        .await
        .unwrap();
    synchronize(&rig.handle).await;

    // THEN: The prompt reaches the overlay with the document embedded
    assert!(rig.overlay.posts().contains(&OverlayMessage::ConnectCard {
        data: CardPrompt {
            card: json!({ "type": "AdaptiveCard", "version": "1.0" })
        }
    }));

    // WHEN: The user answers
    rig.handle
        .submit_card_response(r#"{"data":{"choice":"ok"}}"#)
        .await
        .unwrap();
    synchronize(&rig.handle).await;

    // THEN: The engine receives the inner data under the card's token
    assert!(rig.engine.calls().contains(&EngineCall::SubmitCard {
        data: r#"{"choice":"ok"}"#.to_string(),
        token: "tok-1".to_string()
    }));
}

/// **VALUE**: Verifies malformed card traffic is dropped at the
/// coordinator.
///
/// **WHY THIS MATTERS**: Card documents and responses are
/// attacker-adjacent input (they originate from arbitrary servers and the
/// embedded UI). Anything unparsable must die here, not inside the
/// engine.
///
/// **BUG THIS CATCHES**: Would catch a response being forwarded without a
/// presented card, which would hand the engine a response with no token.
#[tokio::test]
async fn given_malformed_card_data_then_dropped() {
    // GIVEN: A connect in flight
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle
        .connect_to("myserver.example:30120")
        .await
        .unwrap();

    // WHEN: A response arrives before any card
    rig.handle
        .submit_card_response(r#"{"data":{"choice":"ok"}}"#)
        .await
        .unwrap();

    // WHEN: An unparsable card is presented
    rig.handle.card_presented("not a card", "tok-1").await.unwrap();

    // WHEN: A valid card is followed by unparsable responses
    rig.handle
        .card_presented(r#"{"type":"AdaptiveCard"}"#, "tok-2")
        .await
        .unwrap();
    rig.handle.submit_card_response("not json").await.unwrap();
    rig.handle
        .submit_card_response(r#"{"other":1}"#)
        .await
        .unwrap();
    synchronize(&rig.handle).await;

    // THEN: The unparsable card never reached the overlay
    let card_posts = rig
        .overlay
        .posts()
        .iter()
        .filter(|message| matches!(message, OverlayMessage::ConnectCard { .. }))
        .count();
    assert_eq!(card_posts, 1, "Only the valid card should be posted");

    // THEN: Nothing reached the engine as a response
    assert!(
        !rig.engine
            .calls()
            .iter()
            .any(|call| matches!(call, EngineCall::SubmitCard { .. })),
        "Malformed responses must not reach the engine"
    );
}

/// **VALUE**: Verifies cancelling a connect tells the engine and frees
/// the slot.
///
/// **WHY THIS MATTERS**: The cancel button is the user's escape hatch
/// from the waiting screen; it must both stop the engine and allow a
/// fresh attempt.
///
/// **BUG THIS CATCHES**: Would catch cancel clearing the flag without
/// telling the engine, leaving a deferred attempt parked in the gate.
#[tokio::test]
async fn given_cancel_when_connect_in_flight_then_engine_told_and_flag_cleared() {
    // GIVEN: A connect in flight
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));
    rig.handle
        .connect_to("myserver.example:30120")
        .await
        .unwrap();

    // WHEN: The user cancels
    rig.handle.cancel_connect().await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: The engine is told and the slot is free
    assert!(rig.engine.calls().contains(&EngineCall::CancelDeferred));
    assert!(!rig.handle.is_connecting().await.unwrap());
}

/// **VALUE**: Verifies the exit intent reaches the shell.
///
/// **WHY THIS MATTERS**: The coordinator cannot terminate the process
/// itself; if the request is lost, quit buttons silently do nothing.
///
/// **BUG THIS CATCHES**: Would catch the exit arm being dropped in the
/// event dispatch.
#[tokio::test]
async fn given_exit_request_then_shell_receives_exit() {
    // GIVEN: An idle coordinator
    let mut rig = spawn_rig(None, &test_config(&std::env::temp_dir()));

    // WHEN: Exit is requested
    rig.handle.exit().await.unwrap();

    // THEN: The shell receives the request
    assert_eq!(rig.shell_rx.recv().await, Some(ShellRequest::Exit));
}

/// **VALUE**: Verifies the host's load hook notifies the launcher.
///
/// **WHY THIS MATTERS**: The companion launcher shows a loading state
/// while the world streams in; this hook is its only trigger.
///
/// **BUG THIS CATCHES**: Would catch the hook being wired to the wrong
/// launcher endpoint.
#[tokio::test]
async fn given_game_request_load_then_launcher_notified() {
    // GIVEN: An idle coordinator
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));

    // WHEN: The host starts loading a world
    rig.handle.game_request_load().await.unwrap();
    synchronize(&rig.handle).await;

    // THEN: The launcher hears about it
    assert!(rig.launcher.calls().contains(&LauncherCall::Loading));
}
