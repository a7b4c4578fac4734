//! Connection lifecycle coordinator.
//!
//! One actor owns every piece of per-process connection state: the
//! in-flight flag, the interception gate, the pending auth payload, and
//! the last requested target. Producers enqueue [`Event`]s through a
//! [`CoordinatorHandle`]; a dedicated task processes them one at a time to
//! completion, so no state needs a lock and no callback can observe a
//! half-applied transition.
//!
//! # Architecture
//!
//! - Commands are sent via an mpsc channel
//! - A dedicated task processes events sequentially
//! - Decisions the shell must act on (relaunch, exit) flow back on a
//!   separate [`ShellRequest`] channel
//!
//! The coordinator never touches the process or the window system
//! directly; it drives its collaborators ([`SessionEngine`],
//! [`OverlayFrame`], [`LauncherLink`], [`WindowHandoff`]) and leaves
//! process-level actions to the shell.

pub mod event;
pub mod handle;

pub(crate) mod gate;
pub(crate) mod relay;

pub use event::{Event, ShellRequest};
pub use handle::CoordinatorHandle;

use crate::JOIN_URL_PREFIX;
use crate::channel::{MessageChannels, MessageKind};
use crate::config::CoreConfig;
use crate::engine::{InterceptDecision, ResumeTicket, SessionEngine};
use crate::host::{LauncherLink, WindowHandoff};
use crate::overlay::{CardPrompt, ConnectProgress, OverlayFrame, OverlayMessage};

use gate::InterceptionGate;
use relay::AuthRelay;

use common::RedactedPayload;

use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};

/// Marker text a server sends when it requires a different game build.
/// Detecting it turns a connect failure into a build-switch relaunch.
pub const BUILD_MISMATCH_MARKER: &str = "This server requires a different game build";

/// Reason recorded when the user explicitly disconnects.
pub const DISCONNECT_REASON: &str = "Disconnected.";

const TEARDOWN_WAIT_MESSAGE: &str = "Waiting for game to shut down...";
const TEARDOWN_TIMEOUT_MESSAGE: &str =
    "Timed out waiting for the current session to shut down.";

/// Shorthand marker expanding to the join-URL prefix.
const JOIN_SHORTHAND_PREFIX: char = '-';

const EVENT_QUEUE_DEPTH: usize = 100;
const SHELL_QUEUE_DEPTH: usize = 8;

/// Expand the join-code shorthand; any other target passes through
/// unchanged.
///
/// `-ABCDEF` becomes `cfx.re/join/ABCDEF`; `host:30120` stays as it is.
pub fn normalize_target(target: &str) -> String {
    match target.strip_prefix(JOIN_SHORTHAND_PREFIX) {
        Some(code) => format!("{JOIN_URL_PREFIX}{code}"),
        None => target.to_string(),
    }
}

/// Start the coordinator actor.
///
/// `channels` is `None` in contexts with no message queues to drain (the
/// poller then only runs housekeeping). Returns the producer handle and
/// the shell-request receiver; the actor stops when every handle clone is
/// dropped.
pub fn spawn<E, O, L, W>(
    engine: E,
    overlay: O,
    launcher: L,
    handoff: W,
    channels: Option<MessageChannels>,
    config: &CoreConfig,
) -> (CoordinatorHandle, mpsc::Receiver<ShellRequest>)
where
    E: SessionEngine,
    O: OverlayFrame,
    L: LauncherLink,
    W: WindowHandoff,
{
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (shell_tx, shell_rx) = mpsc::channel(SHELL_QUEUE_DEPTH);

    let coordinator = Coordinator {
        engine,
        overlay,
        launcher,
        handoff,
        shell_tx,
        channels,
        teardown_timeout: config.teardown_timeout,
        connecting: false,
        last_target: None,
        card_token: None,
        world_loaded: false,
        killed_early: false,
        greeted: false,
        gate: InterceptionGate::new(),
        relay: AuthRelay::new(),
    };

    tokio::spawn(coordinator.run(event_rx));

    (CoordinatorHandle::new(event_tx), shell_rx)
}

struct Coordinator<E, O, L, W> {
    engine: E,
    overlay: O,
    launcher: L,
    handoff: W,
    shell_tx: mpsc::Sender<ShellRequest>,
    channels: Option<MessageChannels>,
    teardown_timeout: Duration,

    /// True from connect acceptance until success, failure, cancel, or
    /// kill.
    connecting: bool,

    /// The raw last requested target, before normalization. A build
    /// switch relaunches against this value.
    last_target: Option<String>,

    /// Token of the currently presented connection card.
    card_token: Option<String>,

    /// A session world is fully loaded.
    world_loaded: bool,

    /// The network died before a world finished loading; teardown of the
    /// partial state must still be awaited.
    killed_early: bool,

    /// The one-time launcher greeting has been sent.
    greeted: bool,

    gate: InterceptionGate,
    relay: AuthRelay,
}

impl<E, O, L, W> Coordinator<E, O, L, W>
where
    E: SessionEngine,
    O: OverlayFrame,
    L: LauncherLink,
    W: WindowHandoff,
{
    async fn run(mut self, mut event_rx: mpsc::Receiver<Event>) {
        info!("Session coordinator actor started");

        while let Some(event) = event_rx.recv().await {
            self.handle_event(event).await;
        }

        warn!("Session coordinator actor stopped - this should not happen during normal operation");
    }

    async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Connect { target } => self.connect_to(target),
            Event::CancelConnect => self.cancel_connect(),
            Event::Disconnect => self.disconnect(),
            Event::SubmitCardResponse { data } => self.submit_card_response(&data),
            Event::AuthPayload { payload } => self.handle_auth_payload(payload),
            Event::UiReady => self.ui_ready(),
            Event::FrameTick => self.frame_tick(),
            Event::Exit => self.request_exit().await,
            Event::ConnectionSuccess { address } => self.connection_success(address),
            Event::ConnectionError { message } => self.connection_error(message).await,
            Event::ConnectionProgress {
                message,
                current,
                total,
            } => self.post_progress(&message, current, total),
            Event::CardPresented { card, token } => self.card_presented(&card, token),
            Event::InterceptCheck {
                target,
                ticket,
                reply,
            } => self.intercept_check(&target, ticket, reply),
            Event::SessionFinalizedLoad => self.session_finalized_load(),
            Event::ShutdownSession => self.shutdown_session(),
            Event::GameRequestLoad => self.game_request_load(),
            Event::NetworkKilled { reason } => self.network_killed(&reason),
            Event::QueryConnecting { reply } => {
                if reply.send(self.connecting).is_err() {
                    debug!("Connecting query reply dropped");
                }
            }
        }
    }

    /// Accept a connect request unless one is already in flight.
    ///
    /// The raw target is recorded before normalization; a build-switch
    /// relaunch must repeat the original request, not the expanded one.
    fn connect_to(&mut self, target: String) {
        if self.connecting {
            info!("Connect to {target} ignored, another attempt is in flight");
            return;
        }

        self.connecting = true;
        self.overlay.post(&OverlayMessage::Connecting);
        self.last_target = Some(target.clone());

        let normalized = normalize_target(&target);
        info!("Connecting to {normalized}");
        self.engine.connect(&normalized);
    }

    fn cancel_connect(&mut self) {
        info!("Cancelling deferred connection");
        self.engine.cancel_deferred_connection();
        self.reset_connection();
    }

    fn disconnect(&mut self) {
        if !self.engine.is_connection_active() {
            debug!("Disconnect requested with no active connection");
            return;
        }

        info!("Disconnecting from the current server");
        self.engine.kill_network(DISCONNECT_REASON);
        self.reset_connection();
        self.launcher.disconnected();
        self.overlay.show_main_ui();
    }

    /// Forward the user's card response to the engine.
    ///
    /// The submitted document must parse and carry a `data` member;
    /// anything else is logged and dropped.
    fn submit_card_response(&mut self, data: &str) {
        let Some(token) = self.card_token.clone() else {
            warn!("Card response submitted with no card pending, dropped");
            return;
        };

        match serde_json::from_str::<serde_json::Value>(data) {
            Ok(document) => match document.get("data") {
                Some(inner) => self.engine.submit_card_response(&inner.to_string(), &token),
                None => warn!("Card response has no data member, dropped"),
            },
            Err(error) => warn!("Card response failed to parse, dropped: {error}"),
        }
    }

    /// Deliver an auth payload now, or park it until the overlay is
    /// ready. A parked payload is replaced by any newer one.
    fn handle_auth_payload(&mut self, payload: String) {
        let payload = RedactedPayload::new(payload);

        if self.overlay.is_present() {
            self.deliver_auth_payload(payload);
        } else {
            debug!("Overlay not ready, parking auth payload ({} bytes)", payload.len());
            self.relay.store(payload);
        }
    }

    fn deliver_auth_payload(&self, payload: RedactedPayload) {
        self.overlay.post(&OverlayMessage::AuthPayload {
            data: payload.as_str().to_string(),
        });
    }

    fn ui_ready(&mut self) {
        if !self.relay.has_pending() {
            return;
        }

        if let Some(payload) = self.relay.take() {
            if self.overlay.is_present() {
                debug!("Delivering parked auth payload");
                self.deliver_auth_payload(payload);
            } else {
                self.relay.store(payload);
            }
        }
    }

    /// One host tick: one-time greeting, gate timeout housekeeping, then
    /// a bounded drain of both channels while no world is loaded.
    fn frame_tick(&mut self) {
        if !self.greeted {
            self.greeted = true;
            self.launcher.greet();
        }

        self.expire_gate_wait();

        if self.world_loaded {
            return;
        }

        if let Some(bytes) = self.drain_channel(MessageKind::Connect) {
            match String::from_utf8(bytes) {
                Ok(target) => {
                    self.connect_to(target);
                    self.handoff.claim_foreground();
                }
                Err(error) => warn!("Dropping malformed connect message: {error}"),
            }
        }

        if let Some(bytes) = self.drain_channel(MessageKind::Auth) {
            match String::from_utf8(bytes) {
                Ok(payload) => {
                    self.handle_auth_payload(payload);
                    self.handoff.claim_foreground();
                }
                Err(error) => warn!("Dropping malformed auth message: {error}"),
            }
        }
    }

    fn drain_channel(&mut self, kind: MessageKind) -> Option<Vec<u8>> {
        let channels = self.channels.as_ref()?;
        let channel = match kind {
            MessageKind::Connect => &channels.connect,
            MessageKind::Auth => &channels.auth,
        };

        match channel.try_receive() {
            Ok(message) => message,
            Err(error) => {
                warn!("Receive on {} channel failed: {error}", kind.as_str());
                None
            }
        }
    }

    /// Abandon a deferred connect whose teardown never arrived.
    fn expire_gate_wait(&mut self) {
        if !self.gate.expired(self.teardown_timeout) {
            return;
        }

        if self.gate.abandon().is_some() {
            warn!(
                "Session teardown did not complete within {:?}, abandoning deferred connect",
                self.teardown_timeout
            );
            self.engine.cancel_deferred_connection();
            self.reset_connection();
            self.overlay.post(&OverlayMessage::ConnectFailed {
                message: TEARDOWN_TIMEOUT_MESSAGE.to_string(),
            });
        }
    }

    async fn request_exit(&mut self) {
        info!("Exit requested");
        if let Err(error) = self.shell_tx.send(ShellRequest::Exit).await {
            error!("Shell request channel closed: {error}");
        }
    }

    fn connection_success(&mut self, address: String) {
        info!("Connected to {address}");
        self.reset_connection();
        self.overlay
            .post(&OverlayMessage::SetServerAddress { data: address });
    }

    /// Surface a connect failure, or turn a build mismatch into a
    /// relaunch request.
    ///
    /// On mismatch the shell replaces the whole process, so `connecting`
    /// stays set; resetting it would let a racing request start a second
    /// attempt in a process that is about to die.
    async fn connection_error(&mut self, message: String) {
        if message.contains(BUILD_MISMATCH_MARKER) {
            if let Some(target) = self.last_target.clone() {
                info!("Server requires a different game build, requesting relaunch");
                if let Err(error) = self
                    .shell_tx
                    .send(ShellRequest::SwitchBuild { target })
                    .await
                {
                    error!("Shell request channel closed: {error}");
                }
                return;
            }
            warn!("Build mismatch reported with no recorded target");
        }

        warn!("Connection failed: {message}");
        self.reset_connection();
        self.overlay.post(&OverlayMessage::ConnectFailed {
            message: message.clone(),
        });
        self.launcher
            .connection_error(self.last_target.as_deref().unwrap_or(""), &message);
    }

    fn post_progress(&self, message: &str, current: u32, total: u32) {
        self.overlay.post(&OverlayMessage::ConnectStatus {
            data: ConnectProgress {
                message: message.to_string(),
                count: current,
                total,
            },
        });
        self.launcher.connection_progress(message, current, total);
    }

    /// Present a connection card and remember its token for the
    /// response.
    fn card_presented(&mut self, card: &str, token: String) {
        match serde_json::from_str::<serde_json::Value>(card) {
            Ok(card) => {
                self.card_token = Some(token);
                self.overlay
                    .post(&OverlayMessage::ConnectCard {
                        data: CardPrompt { card },
                    });
            }
            Err(error) => warn!("Presented card failed to parse, dropped: {error}"),
        }
    }

    /// Answer the engine's interception check.
    ///
    /// Blocking means live session state is in the way: a loaded world,
    /// or partial state from a network kill that happened before the
    /// world finished loading.
    fn intercept_check(
        &mut self,
        target: &str,
        ticket: ResumeTicket,
        reply: oneshot::Sender<InterceptDecision>,
    ) {
        let blocking = self.world_loaded || self.killed_early;
        let decision = self.gate.check(ticket, blocking);

        if decision == InterceptDecision::Wait {
            info!("Deferring connect to {target} until session teardown completes");
            self.post_progress(TEARDOWN_WAIT_MESSAGE, 0, 100);
        } else {
            debug!("Connect to {target} may proceed");
        }

        if reply.send(decision).is_err() {
            warn!("Intercept decision dropped, engine went away");
        }
    }

    fn session_finalized_load(&mut self) {
        debug!("Session world finished loading");
        self.world_loaded = true;
        self.killed_early = false;
        self.gate.on_finalized_load();
    }

    fn shutdown_session(&mut self) {
        debug!("Session state fully torn down");
        self.world_loaded = false;

        if let Some(ticket) = self.gate.on_shutdown() {
            info!("Resuming deferred connect after teardown");
            self.engine.resume_connect(ticket);
        }
    }

    fn game_request_load(&mut self) {
        debug!("Host is loading a session world");
        self.launcher.loading();
    }

    fn network_killed(&mut self, reason: &str) {
        info!("Network killed: {reason}");

        if !self.world_loaded {
            self.killed_early = true;
        }
        self.reset_connection();

        if !reason.is_empty() && reason != DISCONNECT_REASON {
            self.overlay.post(&OverlayMessage::SetWarningMessage {
                message: reason.to_string(),
            });
        }
    }

    fn reset_connection(&mut self) {
        self.connecting = false;
        self.card_token = None;
    }
}
