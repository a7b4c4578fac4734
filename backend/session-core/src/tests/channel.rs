// Unit tests for the message channel transport
// Coordinator-level draining is covered in integration_tests/poller.rs

use crate::channel::{MAX_MESSAGE_BYTES, MessageChannel, MessageKind};
use crate::error::channel::ChannelError;

use std::os::unix::net::UnixDatagram;

use tempfile::tempdir;

/// **VALUE**: Verifies the basic send-then-receive path through a bound
/// channel.
///
/// **WHY THIS MATTERS**: Every forwarded launch request rides this path.
/// If bytes arrive truncated or reordered the primary acts on garbage.
///
/// **BUG THIS CATCHES**: Would catch a receive buffer sized below the
/// send limit, which would silently truncate long join URLs.
#[test]
fn given_bound_channel_when_message_sent_then_try_receive_returns_it() {
    // GIVEN: A bound connect channel
    let dir = tempdir().unwrap();
    let channel = MessageChannel::bind(dir.path(), MessageKind::Connect).unwrap();

    // WHEN: A satellite-side send delivers a target
    MessageChannel::send(dir.path(), MessageKind::Connect, b"myserver.example:30120").unwrap();

    // THEN: The exact bytes come back out
    let received = channel.try_receive().unwrap();
    assert_eq!(
        received.as_deref(),
        Some(b"myserver.example:30120".as_slice()),
        "Received bytes should match what was sent"
    );
}

/// **VALUE**: Verifies that an empty queue reports empty instead of
/// blocking.
///
/// **WHY THIS MATTERS**: The poller drains channels on the frame tick; a
/// blocking receive would stall the whole coordinator actor.
///
/// **BUG THIS CATCHES**: Would catch a bind path that forgets to put the
/// socket into non-blocking mode.
#[test]
fn given_empty_queue_when_try_receive_called_then_returns_none() {
    // GIVEN: A bound channel nobody has sent to
    let dir = tempdir().unwrap();
    let channel = MessageChannel::bind(dir.path(), MessageKind::Auth).unwrap();

    // WHEN: Receiving from the empty queue
    let received = channel.try_receive().unwrap();

    // THEN: Nothing is returned and the call did not block
    assert!(received.is_none(), "Empty queue should report None");
}

/// **VALUE**: Verifies the datagram size limit is enforced on the send
/// side.
///
/// **WHY THIS MATTERS**: The receive buffer is bounded; an unchecked send
/// above it would be truncated by the kernel and the primary would act on
/// a cut-off payload.
///
/// **BUG THIS CATCHES**: Would catch the limit check being removed or
/// compared with the wrong constant.
#[test]
fn given_oversized_message_when_sent_then_returns_oversized_error() {
    // GIVEN: A payload one byte over the limit
    let dir = tempdir().unwrap();
    let oversized = vec![b'x'; MAX_MESSAGE_BYTES + 1];

    // WHEN: Sending it
    let result = MessageChannel::send(dir.path(), MessageKind::Auth, &oversized);

    // THEN: The send is rejected before it reaches the socket
    assert!(
        matches!(result, Err(ChannelError::Oversized { .. })),
        "Oversized send should be rejected, got {result:?}"
    );
}

/// **VALUE**: Verifies that sending with no listener is not an error.
///
/// **WHY THIS MATTERS**: A satellite only exists because a primary was
/// seen running; if that primary exited in between there is nobody left
/// to act on the request, and the satellite must still exit cleanly.
///
/// **BUG THIS CATCHES**: Would catch connection-refused being propagated
/// as a hard failure.
#[test]
fn given_no_listener_when_message_sent_then_send_succeeds() {
    // GIVEN: A runtime dir where no channel was ever bound
    let dir = tempdir().unwrap();

    // WHEN: Sending into the void
    let result = MessageChannel::send(dir.path(), MessageKind::Connect, b"lost:30120");

    // THEN: The send reports success; fire-and-forget
    assert!(result.is_ok(), "Missing listener should not be an error");
}

/// **VALUE**: Verifies that a socket file left by a crashed primary does
/// not permanently block the channel name.
///
/// **WHY THIS MATTERS**: A crash skips `Drop`, leaving the socket file
/// behind. The next primary must recover the name or the channels would
/// be dead until someone deletes the file by hand.
///
/// **BUG THIS CATCHES**: Would catch the liveness probe treating a dead
/// socket as an owner.
#[test]
fn given_stale_socket_file_when_bound_then_stale_file_is_replaced() {
    // GIVEN: A socket file whose owner is gone
    let dir = tempdir().unwrap();
    let stale = UnixDatagram::bind(dir.path().join("fivem_connect.sock")).unwrap();
    drop(stale);
    assert!(dir.path().join("fivem_connect.sock").exists());

    // WHEN: Binding the connect channel over it
    let channel = MessageChannel::bind(dir.path(), MessageKind::Connect);

    // THEN: The bind succeeds and the channel works
    let channel = channel.unwrap();
    MessageChannel::send(dir.path(), MessageKind::Connect, b"after-recovery").unwrap();
    assert_eq!(
        channel.try_receive().unwrap().as_deref(),
        Some(b"after-recovery".as_slice()),
        "Recovered channel should deliver messages"
    );
}

/// **VALUE**: Verifies that a live channel owner keeps the name.
///
/// **WHY THIS MATTERS**: Role resolution can race; if a second process
/// could steal a live socket, forwarded requests would be split between
/// two listeners.
///
/// **BUG THIS CATCHES**: Would catch the stale-socket recovery deleting a
/// socket that still has a reader.
#[test]
fn given_live_channel_when_second_bind_attempted_then_already_bound_error() {
    // GIVEN: A channel held by a live owner (this test)
    let dir = tempdir().unwrap();
    let _holder = MessageChannel::bind(dir.path(), MessageKind::Connect).unwrap();

    // WHEN: A second bind is attempted on the same name
    let second = MessageChannel::bind(dir.path(), MessageKind::Connect);

    // THEN: The second bind is refused
    assert!(
        matches!(second, Err(ChannelError::AlreadyBound { .. })),
        "Live socket should refuse a second bind, got {:?}",
        second.err()
    );
}

/// **VALUE**: Verifies that zero-length liveness probes are invisible to
/// the receiver.
///
/// **WHY THIS MATTERS**: Bind-time probing sends empty datagrams into
/// live sockets. If those surfaced as messages, the coordinator would see
/// phantom empty connect targets.
///
/// **BUG THIS CATCHES**: Would catch `try_receive` returning `Some(vec![])`
/// for a probe instead of skipping it.
#[test]
fn given_probe_before_message_when_received_then_probe_is_skipped() {
    // GIVEN: A probe datagram queued ahead of a real message
    let dir = tempdir().unwrap();
    let channel = MessageChannel::bind(dir.path(), MessageKind::Auth).unwrap();
    let prober = UnixDatagram::unbound().unwrap();
    prober
        .send_to(&[], dir.path().join("fivem_auth.sock"))
        .unwrap();
    MessageChannel::send(dir.path(), MessageKind::Auth, b"payload").unwrap();

    // WHEN: Receiving once
    let received = channel.try_receive().unwrap();

    // THEN: The real message comes out; the probe never surfaces
    assert_eq!(
        received.as_deref(),
        Some(b"payload".as_slice()),
        "Probe should be skipped, real message delivered"
    );
}

/// **VALUE**: Verifies the socket file is removed when the channel is
/// dropped.
///
/// **WHY THIS MATTERS**: A clean exit must not leave socket files for the
/// next primary to mistake for a crash.
///
/// **BUG THIS CATCHES**: Would catch the drop cleanup being lost in a
/// refactor.
#[test]
fn given_dropped_channel_then_socket_file_removed() {
    // GIVEN: A bound channel whose file exists
    let dir = tempdir().unwrap();
    let channel = MessageChannel::bind(dir.path(), MessageKind::Connect).unwrap();
    let socket_path = dir.path().join("fivem_connect.sock");
    assert!(socket_path.exists(), "Bind should create the socket file");
    assert_eq!(channel.kind(), MessageKind::Connect);

    // WHEN: Dropping the channel
    drop(channel);

    // THEN: The file is gone
    assert!(
        !socket_path.exists(),
        "Drop should remove the socket file"
    );
}
