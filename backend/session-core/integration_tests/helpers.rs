//! Test helpers for coordinator integration tests.
//!
//! This module provides recording doubles for every coordinator seam:
//! - Engine calls (connect, resume, cancel, kill)
//! - Overlay messages and presence
//! - Launcher notifications
//! - Foreground handoff
//!
//! plus a rig that wires them into a spawned coordinator.

use session_core::channel::MessageChannels;
use session_core::config::CoreConfig;
use session_core::coordinator::{self, CoordinatorHandle, ShellRequest};
use session_core::engine::{ResumeTicket, SessionEngine};
use session_core::host::{LauncherLink, WindowHandoff};
use session_core::overlay::{OverlayFrame, OverlayMessage};

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

/// One recorded call into the engine seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Connect(String),
    CancelDeferred,
    Resume(ResumeTicket),
    SubmitCard { data: String, token: String },
    KillNetwork(String),
}

/// Engine double that records every call.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    active: Arc<AtomicBool>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("engine calls lock").clone()
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().expect("engine calls lock").push(call);
    }
}

impl SessionEngine for RecordingEngine {
    fn connect(&self, target: &str) {
        self.record(EngineCall::Connect(target.to_string()));
    }

    fn cancel_deferred_connection(&self) {
        self.record(EngineCall::CancelDeferred);
    }

    fn resume_connect(&self, ticket: ResumeTicket) {
        self.record(EngineCall::Resume(ticket));
    }

    fn submit_card_response(&self, data: &str, token: &str) {
        self.record(EngineCall::SubmitCard {
            data: data.to_string(),
            token: token.to_string(),
        });
    }

    fn is_connection_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn kill_network(&self, reason: &str) {
        self.record(EngineCall::KillNetwork(reason.to_string()));
    }
}

/// Overlay double that records posted messages and toggles presence.
#[derive(Clone)]
pub struct RecordingOverlay {
    present: Arc<AtomicBool>,
    posts: Arc<Mutex<Vec<OverlayMessage>>>,
    main_ui_shows: Arc<AtomicUsize>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self {
            present: Arc::new(AtomicBool::new(true)),
            posts: Arc::new(Mutex::new(Vec::new())),
            main_ui_shows: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_present(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }

    pub fn posts(&self) -> Vec<OverlayMessage> {
        self.posts.lock().expect("overlay posts lock").clone()
    }

    pub fn main_ui_shows(&self) -> usize {
        self.main_ui_shows.load(Ordering::SeqCst)
    }
}

impl OverlayFrame for RecordingOverlay {
    fn is_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    fn post(&self, message: &OverlayMessage) {
        self.posts
            .lock()
            .expect("overlay posts lock")
            .push(message.clone());
    }

    fn show_main_ui(&self) {
        self.main_ui_shows.fetch_add(1, Ordering::SeqCst);
    }
}

/// One recorded launcher notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherCall {
    Greet,
    Loading,
    Disconnected,
    ConnectionError {
        target: String,
        message: String,
    },
    Progress {
        message: String,
        current: u32,
        total: u32,
    },
}

/// Launcher double that records every notification.
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    calls: Arc<Mutex<Vec<LauncherCall>>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LauncherCall> {
        self.calls.lock().expect("launcher calls lock").clone()
    }

    fn record(&self, call: LauncherCall) {
        self.calls.lock().expect("launcher calls lock").push(call);
    }
}

impl LauncherLink for RecordingLauncher {
    fn greet(&self) {
        self.record(LauncherCall::Greet);
    }

    fn loading(&self) {
        self.record(LauncherCall::Loading);
    }

    fn disconnected(&self) {
        self.record(LauncherCall::Disconnected);
    }

    fn connection_error(&self, target: &str, message: &str) {
        self.record(LauncherCall::ConnectionError {
            target: target.to_string(),
            message: message.to_string(),
        });
    }

    fn connection_progress(&self, message: &str, current: u32, total: u32) {
        self.record(LauncherCall::Progress {
            message: message.to_string(),
            current,
            total,
        });
    }
}

/// Handoff double that counts foreground claims and yields.
#[derive(Clone, Default)]
pub struct RecordingHandoff {
    claims: Arc<AtomicUsize>,
    yields: Arc<AtomicUsize>,
}

impl RecordingHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

impl WindowHandoff for RecordingHandoff {
    fn yield_to_primary(&self) {
        self.yields.fetch_add(1, Ordering::SeqCst);
    }

    fn claim_foreground(&self) {
        self.claims.fetch_add(1, Ordering::SeqCst);
    }
}

/// A spawned coordinator with every seam replaced by a recorder.
pub struct TestRig {
    pub handle: CoordinatorHandle,
    pub shell_rx: mpsc::Receiver<ShellRequest>,
    pub engine: RecordingEngine,
    pub overlay: RecordingOverlay,
    pub launcher: RecordingLauncher,
    pub handoff: RecordingHandoff,
}

/// Test config pointing at `runtime_dir`, with the production defaults
/// for everything else.
pub fn test_config(runtime_dir: &Path) -> CoreConfig {
    CoreConfig {
        runtime_dir: runtime_dir.to_path_buf(),
        update_channel: "production".to_string(),
        teardown_timeout: Duration::from_secs(30),
        frame_interval: Duration::from_millis(16),
    }
}

/// Spawn a coordinator wired to fresh recorders.
pub fn spawn_rig(channels: Option<MessageChannels>, config: &CoreConfig) -> TestRig {
    let engine = RecordingEngine::new();
    let overlay = RecordingOverlay::new();
    let launcher = RecordingLauncher::new();
    let handoff = RecordingHandoff::new();

    let (handle, shell_rx) = coordinator::spawn(
        engine.clone(),
        overlay.clone(),
        launcher.clone(),
        handoff.clone(),
        channels,
        config,
    );

    TestRig {
        handle,
        shell_rx,
        engine,
        overlay,
        launcher,
        handoff,
    }
}

/// Wait until every event sent on `handle` so far has been processed.
///
/// Events are handled in order, so the reply to this query proves the
/// queue ahead of it is drained.
pub async fn synchronize(handle: &CoordinatorHandle) {
    handle
        .is_connecting()
        .await
        .expect("coordinator should be alive");
}
