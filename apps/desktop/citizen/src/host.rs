//! Launcher and window seams for the shell.
//!
//! A packaged build talks to the companion launcher over its wire
//! protocol and moves real windows; the shell logs the same calls with
//! the same endpoint names.

use session_core::host::{LauncherLink, WindowHandoff};

use log::{debug, info};

/// Logs each notification the launcher wire protocol would carry.
pub struct LogLauncher;

impl LauncherLink for LogLauncher {
    fn greet(&self) {
        info!("Launcher notified: hi");
    }

    fn loading(&self) {
        info!("Launcher notified: loading");
    }

    fn disconnected(&self) {
        info!("Launcher notified: disconnected");
    }

    fn connection_error(&self, target: &str, message: &str) {
        info!("Launcher notified: connectionError target={target} message={message}");
    }

    fn connection_progress(&self, message: &str, current: u32, total: u32) {
        debug!("Launcher notified: connectionProgress {current}/{total} {message}");
    }
}

/// Foreground-window coordination between instances.
pub struct ForegroundBroker;

impl WindowHandoff for ForegroundBroker {
    fn yield_to_primary(&self) {
        info!("Yielding the foreground to the primary instance");
    }

    fn claim_foreground(&self) {
        info!("Bringing the window to the foreground");
    }
}
