//! Overlay seam and the structured messages posted to it.
//!
//! The embedded UI overlay receives tagged JSON messages; the tag names
//! and payload shapes are a wire contract with the frontend and must not
//! drift.

use serde::Serialize;

/// Structured message for the UI overlay.
///
/// Serializes as `{"type": "<tag>", ...fields}` with camelCase tags, e.g.
/// `{"type":"connectFailed","message":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OverlayMessage {
    /// A connect attempt was accepted and is underway.
    Connecting,

    /// The attempt failed; `message` is shown verbatim.
    ConnectFailed { message: String },

    /// Progress update for the current attempt.
    ConnectStatus { data: ConnectProgress },

    /// The server presented an interactive card to complete the connect.
    ConnectCard { data: CardPrompt },

    /// An authentication payload for the overlay to consume.
    AuthPayload { data: String },

    /// The resolved address of the server we ended up on.
    SetServerAddress { data: String },

    /// Out-of-band warning, e.g. an abnormal network kill.
    SetWarningMessage { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectProgress {
    pub message: String,
    pub count: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardPrompt {
    /// The card document as given by the server.
    pub card: serde_json::Value,
}

/// The in-process UI overlay as the coordinator sees it.
pub trait OverlayFrame: Send + 'static {
    /// Whether the overlay has loaded far enough to take messages.
    fn is_present(&self) -> bool;

    /// Post one structured message. Best-effort; the overlay may not be
    /// present yet.
    fn post(&self, message: &OverlayMessage);

    /// Return the overlay to the main UI after a disconnect.
    fn show_main_ui(&self);
}
