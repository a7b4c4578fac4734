//! Session engine seam.
//!
//! The network transport lives outside this crate. The coordinator drives
//! it through [`SessionEngine`] and the engine reports back through the
//! coordinator handle's callback methods. The interception handshake runs
//! on opaque [`ResumeTicket`]s: the engine mints one per connect attempt,
//! asks the coordinator whether it may proceed, and receives the same
//! ticket back once a blocking teardown completes.

/// Opaque token identifying one deferred connect attempt.
///
/// The engine keeps the attempt's parameters in its own side table keyed
/// by this ticket; the coordinator only parks and returns the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResumeTicket(pub u64);

/// Verdict of the coordinator's interception gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptDecision {
    /// No live session stands in the way; swap the connection now.
    Proceed,

    /// A session is still tearing down; hold the attempt until the
    /// ticket comes back through `resume_connect`.
    Wait,
}

/// Operations the coordinator invokes on the transport.
///
/// Implementations are expected to be cheap handles (the shell's engine is
/// an `Arc` around its state) and to do real work on their own tasks;
/// every method here is called from the coordinator's event loop and must
/// not block it.
pub trait SessionEngine: Send + 'static {
    /// Begin connecting to a normalized target.
    fn connect(&self, target: &str);

    /// Discard any attempt deferred behind the interception gate.
    fn cancel_deferred_connection(&self);

    /// Resume the deferred attempt identified by `ticket`.
    fn resume_connect(&self, ticket: ResumeTicket);

    /// Forward the user's response to a presented connection card.
    fn submit_card_response(&self, data: &str, token: &str);

    /// Whether a session connection is currently established.
    fn is_connection_active(&self) -> bool;

    /// Tear down the active connection, citing `reason`.
    fn kill_network(&self, reason: &str);
}
