use crate::helpers::{EngineCall, LauncherCall, spawn_rig, synchronize, test_config};

use session_core::channel::{MessageChannel, MessageChannels, MessageKind};
use session_core::overlay::OverlayMessage;

use tempfile::tempdir;

/// **VALUE**: Verifies a forwarded connect message starts a connect and
/// pulls the window to the foreground.
///
/// **WHY THIS MATTERS**: This is the satellite-to-primary path behind
/// every "join server" click in a browser while the launcher is already
/// running. The user clicked somewhere else, so the window must also come
/// to the front.
///
/// **BUG THIS CATCHES**: Would catch the drain starting a connect without
/// claiming the foreground, leaving the launcher buried behind the
/// browser.
#[tokio::test]
async fn given_forwarded_connect_message_then_connect_started_and_foreground_claimed() {
    // GIVEN: A primary with bound channels
    let dir = tempdir().unwrap();
    let channels = MessageChannels::bind(dir.path()).unwrap();
    let rig = spawn_rig(Some(channels), &test_config(dir.path()));

    // WHEN: A satellite forwards a connect target and a tick drains it
    MessageChannel::send(dir.path(), MessageKind::Connect, b"myserver.example:30120").unwrap();
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: The connect started and the window was claimed
    assert!(rig
        .engine
        .calls()
        .contains(&EngineCall::Connect("myserver.example:30120".to_string())));
    assert_eq!(rig.handoff.claims(), 1);
}

/// **VALUE**: Verifies forwarded join shorthands are normalized like any
/// other connect.
///
/// **WHY THIS MATTERS**: Shorthand codes arrive over the channel exactly
/// as the satellite received them; the primary owns normalization.
///
/// **BUG THIS CATCHES**: Would catch the channel path bypassing the
/// normal connect entry point.
#[tokio::test]
async fn given_forwarded_join_code_then_normalized_before_engine() {
    // GIVEN: A primary with bound channels
    let dir = tempdir().unwrap();
    let channels = MessageChannels::bind(dir.path()).unwrap();
    let rig = spawn_rig(Some(channels), &test_config(dir.path()));

    // WHEN: A shorthand code is forwarded and drained
    MessageChannel::send(dir.path(), MessageKind::Connect, b"-JOINCODE").unwrap();
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: The engine sees the expanded join URL
    assert!(rig
        .engine
        .calls()
        .contains(&EngineCall::Connect("cfx.re/join/JOINCODE".to_string())));
}

/// **VALUE**: Verifies a forwarded auth payload reaches the overlay.
///
/// **WHY THIS MATTERS**: Sign-in completes in a browser and re-enters
/// through a satellite; this drain is the last hop of that round trip.
///
/// **BUG THIS CATCHES**: Would catch the auth queue being drained into
/// the connect path.
#[tokio::test]
async fn given_forwarded_auth_message_then_relayed_to_overlay() {
    // GIVEN: A primary with bound channels and a present overlay
    let dir = tempdir().unwrap();
    let channels = MessageChannels::bind(dir.path()).unwrap();
    let rig = spawn_rig(Some(channels), &test_config(dir.path()));

    // WHEN: A payload is forwarded and drained
    MessageChannel::send(dir.path(), MessageKind::Auth, b"token=abc").unwrap();
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: The overlay receives it and the window was claimed
    assert!(rig.overlay.posts().contains(&OverlayMessage::AuthPayload {
        data: "token=abc".to_string()
    }));
    assert_eq!(rig.handoff.claims(), 1);
}

/// **VALUE**: Verifies draining pauses while a world is loaded and picks
/// the queued message up after teardown.
///
/// **WHY THIS MATTERS**: With a world up, connects go through the
/// interception gate driven by the engine's own callbacks; the drain
/// injecting them mid-session would bypass that ordering. The message is
/// paused, not dropped.
///
/// **BUG THIS CATCHES**: Would catch the queued message being discarded
/// instead of deferred, losing the user's click.
#[tokio::test]
async fn given_world_loaded_then_drain_pauses_until_teardown() {
    // GIVEN: A loaded world and a queued connect message
    let dir = tempdir().unwrap();
    let channels = MessageChannels::bind(dir.path()).unwrap();
    let rig = spawn_rig(Some(channels), &test_config(dir.path()));
    rig.handle.session_finalized_load().await.unwrap();
    MessageChannel::send(dir.path(), MessageKind::Connect, b"queued.example:30120").unwrap();

    // WHEN: Ticks run while the world is up
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: The message stays queued
    assert!(
        rig.engine.calls().is_empty(),
        "No drain while a world is loaded"
    );

    // WHEN: The session tears down and the next tick runs
    rig.handle.shutdown_session().await.unwrap();
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: The queued message is finally drained
    assert!(rig
        .engine
        .calls()
        .contains(&EngineCall::Connect("queued.example:30120".to_string())));
}

/// **VALUE**: Verifies malformed bytes on the channel are dropped without
/// taking the poller down.
///
/// **WHY THIS MATTERS**: Anything on the machine can write to the
/// socket. One garbage datagram must not wedge the drain for the
/// messages behind it.
///
/// **BUG THIS CATCHES**: Would catch a UTF-8 unwrap in the drain path.
#[tokio::test]
async fn given_malformed_bytes_then_dropped_and_poller_survives() {
    // GIVEN: Garbage ahead of a valid message
    let dir = tempdir().unwrap();
    let channels = MessageChannels::bind(dir.path()).unwrap();
    let rig = spawn_rig(Some(channels), &test_config(dir.path()));
    MessageChannel::send(dir.path(), MessageKind::Connect, &[0xff, 0xfe, 0xfd]).unwrap();
    MessageChannel::send(dir.path(), MessageKind::Connect, b"valid.example:30120").unwrap();

    // WHEN: Two ticks drain the queue
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: The garbage vanished and the valid message connected
    assert_eq!(
        rig.engine.calls(),
        vec![EngineCall::Connect("valid.example:30120".to_string())]
    );
}

/// **VALUE**: Verifies the one-time launcher greeting fires on the first
/// tick only.
///
/// **WHY THIS MATTERS**: The companion launcher uses the greeting to
/// learn the game process came up; repeating it would reset the
/// launcher's state machine mid-session.
///
/// **BUG THIS CATCHES**: Would catch the greeting being sent per tick.
#[tokio::test]
async fn given_many_ticks_then_launcher_greeted_once() {
    // GIVEN: A coordinator with no channels
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));

    // WHEN: Several ticks pass
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;
    rig.handle.frame_tick();
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: Exactly one greeting went out
    let greets = rig
        .launcher
        .calls()
        .iter()
        .filter(|call| matches!(call, LauncherCall::Greet))
        .count();
    assert_eq!(greets, 1, "The greeting is one-time");
}

/// **VALUE**: Verifies the drain takes at most one message per queue per
/// tick.
///
/// **WHY THIS MATTERS**: The tick runs on the frame cadence; draining
/// whole backlogs in one tick would burst engine work into a single
/// frame. One per tick keeps the cost bounded and the order stable.
///
/// **BUG THIS CATCHES**: Would catch the drain looping until empty.
#[tokio::test]
async fn given_two_queued_payloads_then_one_drained_per_tick() {
    // GIVEN: Two auth payloads queued
    let dir = tempdir().unwrap();
    let channels = MessageChannels::bind(dir.path()).unwrap();
    let rig = spawn_rig(Some(channels), &test_config(dir.path()));
    MessageChannel::send(dir.path(), MessageKind::Auth, b"token=first").unwrap();
    MessageChannel::send(dir.path(), MessageKind::Auth, b"token=second").unwrap();

    // WHEN: One tick runs
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: Only the first payload was delivered
    assert_eq!(
        rig.overlay.posts(),
        vec![OverlayMessage::AuthPayload {
            data: "token=first".to_string()
        }]
    );

    // WHEN: A second tick runs
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: The second payload follows in order
    assert_eq!(
        rig.overlay.posts(),
        vec![
            OverlayMessage::AuthPayload {
                data: "token=first".to_string()
            },
            OverlayMessage::AuthPayload {
                data: "token=second".to_string()
            }
        ]
    );
}

/// **VALUE**: Verifies ticking without channels is harmless.
///
/// **WHY THIS MATTERS**: Build-switch relaunches run without rebinding
/// the channels when the previous owner has not released them yet; the
/// poller must degrade to housekeeping only.
///
/// **BUG THIS CATCHES**: Would catch the drain unwrapping the optional
/// channels.
#[tokio::test]
async fn given_no_channels_then_tick_only_does_housekeeping() {
    // GIVEN: A coordinator without channels
    let rig = spawn_rig(None, &test_config(&std::env::temp_dir()));

    // WHEN: Ticks run
    rig.handle.frame_tick();
    synchronize(&rig.handle).await;

    // THEN: Nothing but the greeting happened
    assert!(rig.engine.calls().is_empty());
    assert!(rig.overlay.posts().is_empty());
    assert_eq!(rig.launcher.calls(), vec![LauncherCall::Greet]);
}
