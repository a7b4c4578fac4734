//! Host process seams: launcher notifications and window focus.

/// Fire-and-forget notifications to the companion launcher process.
///
/// The launcher tracks coarse lifecycle transitions for its own UI; none
/// of these calls may fail the operation that triggered them.
pub trait LauncherLink: Send + 'static {
    /// One-time greeting once the primary's event loop is running.
    fn greet(&self);

    /// The host started loading a session world.
    fn loading(&self);

    /// The user explicitly disconnected.
    fn disconnected(&self);

    /// A connect attempt failed.
    fn connection_error(&self, target: &str, message: &str);

    /// Progress for the current attempt.
    fn connection_progress(&self, message: &str, current: u32, total: u32);
}

/// Best-effort foreground-window coordination between instances.
pub trait WindowHandoff: Send + 'static {
    /// Satellite side: allow the primary to take the foreground before
    /// this process exits.
    fn yield_to_primary(&self);

    /// Primary side: bring the interactive window to the foreground after
    /// consuming a forwarded request.
    fn claim_foreground(&self);
}
