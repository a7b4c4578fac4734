//! Events feeding the coordinator actor and requests it sends back to the
//! process shell.

use crate::engine::{InterceptDecision, ResumeTicket};

use tokio::sync::oneshot;

/// Everything the coordinator reacts to, from every producer: UI intents,
/// engine callbacks, host lifecycle hooks, and the frame ticker.
#[derive(Debug)]
pub enum Event {
    /// A connect request from the UI, console, launch arguments, or a
    /// forwarded satellite message.
    Connect { target: String },

    /// Abort a connect attempt that has not completed.
    CancelConnect,

    /// Tear down the active session at the user's request.
    Disconnect,

    /// The user answered a presented connection card.
    SubmitCardResponse { data: String },

    /// An auth payload from a launch URI or a forwarded message.
    AuthPayload { payload: String },

    /// The overlay finished loading and can take messages.
    UiReady,

    /// One host tick: drain channels, run housekeeping.
    FrameTick,

    /// Explicit user exit.
    Exit,

    /// Engine callback: the connection was established.
    ConnectionSuccess { address: String },

    /// Engine callback: the attempt failed.
    ConnectionError { message: String },

    /// Engine callback: progress for the current attempt.
    ConnectionProgress {
        message: String,
        current: u32,
        total: u32,
    },

    /// Engine callback: the server presented a connection card.
    CardPresented { card: String, token: String },

    /// Engine callback: may the connection be swapped now?
    InterceptCheck {
        target: String,
        ticket: ResumeTicket,
        reply: oneshot::Sender<InterceptDecision>,
    },

    /// Host lifecycle: a session world finished loading.
    SessionFinalizedLoad,

    /// Host lifecycle: previously loaded session state is fully torn down.
    ShutdownSession,

    /// Host lifecycle: the host started loading a session world.
    GameRequestLoad,

    /// Host lifecycle: the network layer was killed.
    NetworkKilled { reason: String },

    /// Query the in-flight connect flag.
    QueryConnecting { reply: oneshot::Sender<bool> },
}

/// Actions only the process shell can perform on the coordinator's
/// behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRequest {
    /// Relaunch this executable against the alternate build channel and
    /// reconnect to `target` (the raw value as originally requested).
    SwitchBuild { target: String },

    /// Terminate the process.
    Exit,
}
