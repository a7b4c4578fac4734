//! Probe-based session engine.
//!
//! Stands in for a full game network stack: a connect is a TCP
//! reachability probe against the target. What matters is the contract
//! with the coordinator, which is the same one a real engine follows:
//! every connect asks the interception gate before proceeding, deferred
//! attempts resume by ticket, and kills are reported back as engine
//! callbacks.

use session_core::JOIN_URL_PREFIX;
use session_core::coordinator::CoordinatorHandle;
use session_core::engine::{InterceptDecision, ResumeTicket, SessionEngine};
use session_core::error::coordinator::CoordinatorError;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Port assumed when the target does not name one.
const DEFAULT_SERVER_PORT: u16 = 30120;

/// Upper bound on one reachability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Progress steps reported per attempt.
const PROBE_STEPS: u32 = 3;

/// Session engine backed by TCP reachability probes.
///
/// Cheap to clone; all clones share the same connection state.
#[derive(Clone, Default)]
pub struct ProbeEngine {
    inner: Arc<EngineInner>,
}

#[derive(Default)]
struct EngineInner {
    handle: OnceLock<CoordinatorHandle>,
    next_ticket: AtomicU64,

    /// Connect attempts parked behind the interception gate, by ticket.
    deferred: Mutex<HashMap<u64, String>>,

    /// Address of the live connection, if any.
    active: Mutex<Option<String>>,
}

impl ProbeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the coordinator handle the engine reports back through.
    ///
    /// The engine is constructed before the coordinator exists, so the
    /// handle arrives late and exactly once.
    pub fn attach(&self, handle: CoordinatorHandle) {
        if self.inner.handle.set(handle).is_err() {
            warn!("Engine is already attached to a coordinator");
        }
    }
}

impl EngineInner {
    fn coordinator(&self) -> Option<&CoordinatorHandle> {
        let handle = self.handle.get();
        if handle.is_none() {
            warn!("Engine used before a coordinator was attached");
        }
        handle
    }
}

impl SessionEngine for ProbeEngine {
    fn connect(&self, target: &str) {
        let ticket = ResumeTicket(self.inner.next_ticket.fetch_add(1, Ordering::Relaxed) + 1);
        lock(&self.inner.deferred).insert(ticket.0, target.to_string());

        let inner = Arc::clone(&self.inner);
        let target = target.to_string();
        tokio::spawn(async move {
            let Some(handle) = inner.coordinator() else {
                return;
            };
            match handle.intercept_check(target.clone(), ticket).await {
                Ok(InterceptDecision::Proceed) => run_connect(inner, ticket).await,
                Ok(InterceptDecision::Wait) => {
                    info!("Connect to {target} deferred until session teardown")
                }
                Err(error) => warn!("Intercept check failed: {error}"),
            }
        });
    }

    fn cancel_deferred_connection(&self) {
        let mut deferred = lock(&self.inner.deferred);
        if !deferred.is_empty() {
            debug!("Dropping {} deferred connect attempt(s)", deferred.len());
        }
        deferred.clear();
    }

    fn resume_connect(&self, ticket: ResumeTicket) {
        tokio::spawn(run_connect(Arc::clone(&self.inner), ticket));
    }

    fn submit_card_response(&self, data: &str, token: &str) {
        // The probe engine has no card server behind it; a packaged build
        // forwards this to the platform services.
        info!(
            "Card response under token {token} ({} bytes) acknowledged",
            data.len()
        );
    }

    fn is_connection_active(&self) -> bool {
        lock(&self.inner.active).is_some()
    }

    fn kill_network(&self, reason: &str) {
        if let Some(address) = lock(&self.inner.active).take() {
            info!("Dropping connection to {address}: {reason}");
        }

        let inner = Arc::clone(&self.inner);
        let reason = reason.to_string();
        tokio::spawn(async move {
            let Some(handle) = inner.coordinator() else {
                return;
            };
            report(handle.network_killed(reason).await);
        });
    }
}

/// Drive one connect attempt to a terminal callback.
///
/// The ticket's target having vanished means the attempt was cancelled
/// while parked; that is a quiet no-op.
async fn run_connect(inner: Arc<EngineInner>, ticket: ResumeTicket) {
    let Some(target) = lock(&inner.deferred).remove(&ticket.0) else {
        debug!("Connect ticket {} was cancelled before it ran", ticket.0);
        return;
    };
    let Some(handle) = inner.coordinator() else {
        return;
    };

    if is_join_target(&target) {
        report(
            handle
                .connection_error(format!(
                    "Join links resolve through the online service; use a host:port address instead of {target}"
                ))
                .await,
        );
        return;
    }

    let address = probe_address(&target);
    report(
        handle
            .connection_progress(format!("Contacting {address}"), 1, PROBE_STEPS)
            .await,
    );

    match timeout(PROBE_TIMEOUT, TcpStream::connect(&address)).await {
        Ok(Ok(_stream)) => {
            report(
                handle
                    .connection_progress("Establishing session", 2, PROBE_STEPS)
                    .await,
            );
            *lock(&inner.active) = Some(address.clone());
            report(
                handle
                    .connection_progress("Joining", 3, PROBE_STEPS)
                    .await,
            );
            report(handle.connection_success(address).await);
        }
        Ok(Err(error)) => {
            report(
                handle
                    .connection_error(format!("Failed to reach {address}: {error}"))
                    .await,
            );
        }
        Err(_) => {
            report(
                handle
                    .connection_error(format!(
                        "Timed out contacting {address} after {PROBE_TIMEOUT:?}"
                    ))
                    .await,
            );
        }
    }
}

/// Expand `target` into a dialable address, defaulting the port.
pub(crate) fn probe_address(target: &str) -> String {
    if target.contains(':') {
        target.to_string()
    } else {
        format!("{target}:{DEFAULT_SERVER_PORT}")
    }
}

/// Whether `target` is a join link rather than a direct address.
pub(crate) fn is_join_target(target: &str) -> bool {
    target.starts_with(JOIN_URL_PREFIX)
}

fn report(result: Result<(), CoordinatorError>) {
    if let Err(error) = result {
        warn!("Coordinator callback failed: {error}");
    }
}

// A poisoning writer can only have been mid-push on one of these maps;
// the state remains usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
