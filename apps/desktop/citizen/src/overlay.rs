//! Shell-side overlay stand-in.
//!
//! A packaged build embeds a web overlay; the shell serializes the same
//! messages to the log so the whole UI contract stays observable from a
//! terminal.

use session_core::overlay::{OverlayFrame, OverlayMessage};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

/// Overlay that logs every message the embedded UI would receive.
#[derive(Clone, Default)]
pub struct ShellOverlay {
    ready: Arc<AtomicBool>,
}

impl ShellOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the overlay able to take messages.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl OverlayFrame for ShellOverlay {
    fn is_present(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn post(&self, message: &OverlayMessage) {
        match serde_json::to_string(message) {
            Ok(json) => info!("UI message: {json}"),
            Err(error) => warn!("Failed to serialize UI message: {error}"),
        }
    }

    fn show_main_ui(&self) {
        info!("UI returned to the main screen");
    }
}
