//! Primary-instance shell.
//!
//! Owns everything with process-wide scope: the engine, the overlay, the
//! console, and the frame ticker, all wired to one coordinator. Runs until
//! the coordinator asks for an action only the process itself can take.

use crate::console;
use crate::engine::ProbeEngine;
use crate::host::{ForegroundBroker, LogLauncher};
use crate::overlay::ShellOverlay;

use session_core::channel::MessageChannels;
use session_core::config::CoreConfig;
use session_core::coordinator::{self, CoordinatorHandle, ShellRequest};
use session_core::launch::LaunchRequest;

use std::time::Duration;

use log::{info, warn};
use tokio::time::interval;

/// Why the primary shell stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutcome {
    /// Plain exit.
    Exit,

    /// Relaunch against the alternate build channel and reconnect to
    /// `target`.
    SwitchBuild { target: String },
}

/// Run the primary instance to completion.
///
/// `initial` is the launch request this process was started with, if any;
/// it is delivered before the console gets a chance to speak.
pub async fn run_primary(
    channels: MessageChannels,
    config: &CoreConfig,
    initial: Option<LaunchRequest>,
) -> ShellOutcome {
    let engine = ProbeEngine::new();
    let overlay = ShellOverlay::new();

    let (handle, mut shell_rx) = coordinator::spawn(
        engine.clone(),
        overlay.clone(),
        LogLauncher,
        ForegroundBroker,
        Some(channels),
        config,
    );
    engine.attach(handle.clone());

    // The console is the UI here; it is ready as soon as it exists.
    overlay.set_ready(true);
    if let Err(error) = handle.ui_ready().await {
        warn!("UI-ready notification failed: {error}");
    }

    if let Some(request) = initial {
        deliver_initial(&handle, request).await;
    }

    let console = tokio::spawn(console::run(handle.clone()));
    let ticker = tokio::spawn(run_frame_ticker(handle, config.frame_interval));

    info!("Primary instance running");
    let outcome = match shell_rx.recv().await {
        Some(ShellRequest::SwitchBuild { target }) => ShellOutcome::SwitchBuild { target },
        Some(ShellRequest::Exit) | None => ShellOutcome::Exit,
    };

    ticker.abort();
    console.abort();
    outcome
}

async fn deliver_initial(handle: &CoordinatorHandle, request: LaunchRequest) {
    let result = match request {
        LaunchRequest::Connect { target } => {
            info!("Launch request: connect to {target}");
            handle.connect_to(target).await
        }
        LaunchRequest::AuthPayload { payload } => {
            info!("Launch request: auth payload");
            handle.handle_auth_payload(payload).await
        }
    };
    if let Err(error) = result {
        warn!("Launch request delivery failed: {error}");
    }
}

/// Drive the coordinator's per-frame housekeeping at the configured
/// cadence, standing in for the game's main-loop hook.
async fn run_frame_ticker(handle: CoordinatorHandle, period: Duration) {
    let mut ticker = interval(period);
    loop {
        ticker.tick().await;
        handle.frame_tick();
    }
}
